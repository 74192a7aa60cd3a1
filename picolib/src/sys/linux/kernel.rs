use core::ffi::CStr;

use super::nr::{self, AT_FDCWD, AT_REMOVEDIR, MREMAP_MAYMOVE};
use super::syscall::{syscall1, syscall2, syscall3, syscall4, syscall5, syscall6};
use super::Linux;
use crate::abi::{FileStat, Kernel};
use crate::handle::RawFd;
use crate::sys::traced;

/// `struct stat` as the x86_64 kernel writes it.
#[cfg(target_arch = "x86_64")]
#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct KernelStat {
    st_dev: u64,
    st_ino: u64,
    st_nlink: u64,
    st_mode: u32,
    st_uid: u32,
    st_gid: u32,
    __pad0: i32,
    st_rdev: u64,
    st_size: i64,
    st_blksize: i64,
    st_blocks: i64,
    st_atime: i64,
    st_atime_nsec: i64,
    st_mtime: i64,
    st_mtime_nsec: i64,
    st_ctime: i64,
    st_ctime_nsec: i64,
    __unused: [i64; 3],
}

/// `struct stat` in the asm-generic layout (aarch64, riscv64).
#[cfg(any(target_arch = "aarch64", target_arch = "riscv64"))]
#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct KernelStat {
    st_dev: u64,
    st_ino: u64,
    st_mode: u32,
    st_nlink: u32,
    st_uid: u32,
    st_gid: u32,
    st_rdev: u64,
    __pad1: u64,
    st_size: i64,
    st_blksize: i32,
    __pad2: i32,
    st_blocks: i64,
    st_atime: i64,
    st_atime_nsec: i64,
    st_mtime: i64,
    st_mtime_nsec: i64,
    st_ctime: i64,
    st_ctime_nsec: i64,
    __unused: [u32; 2],
}

impl KernelStat {
    fn portable(&self) -> FileStat {
        FileStat {
            dev: self.st_dev,
            ino: self.st_ino,
            mode: self.st_mode,
            nlink: self.st_nlink as u64,
            uid: self.st_uid,
            gid: self.st_gid,
            size: self.st_size.max(0) as u64,
        }
    }
}

fn path_arg(path: &CStr) -> usize {
    path.as_ptr() as usize
}

impl Kernel for Linux {
    fn open(path: &CStr, flags: u32, mode: u32) -> isize {
        // SAFETY: `path` is NUL-terminated and outlives the call.
        let ret = unsafe {
            syscall4(
                nr::OPENAT,
                AT_FDCWD as usize,
                path_arg(path),
                flags as usize,
                mode as usize,
            )
        };
        traced("openat", ret)
    }

    fn close(fd: RawFd) -> isize {
        // SAFETY: close takes no pointers.
        traced("close", unsafe { syscall1(nr::CLOSE, fd as usize) })
    }

    fn read(fd: RawFd, buf: &mut [u8]) -> isize {
        // SAFETY: the kernel writes at most `buf.len()` bytes into `buf`.
        let ret = unsafe { syscall3(nr::READ, fd as usize, buf.as_mut_ptr() as usize, buf.len()) };
        traced("read", ret)
    }

    fn write(fd: RawFd, buf: &[u8]) -> isize {
        // SAFETY: the kernel reads at most `buf.len()` bytes from `buf`.
        let ret = unsafe { syscall3(nr::WRITE, fd as usize, buf.as_ptr() as usize, buf.len()) };
        traced("write", ret)
    }

    fn lseek(fd: RawFd, offset: i64, whence: u32) -> isize {
        // SAFETY: lseek takes no pointers.
        let ret = unsafe { syscall3(nr::LSEEK, fd as usize, offset as usize, whence as usize) };
        traced("lseek", ret)
    }

    fn stat(path: &CStr, st: &mut FileStat) -> isize {
        let mut raw = KernelStat::default();
        // SAFETY: `path` is NUL-terminated; `raw` has the kernel's layout.
        let ret = unsafe {
            syscall4(
                nr::NEWFSTATAT,
                AT_FDCWD as usize,
                path_arg(path),
                &mut raw as *mut KernelStat as usize,
                0,
            )
        };
        if ret == 0 {
            *st = raw.portable();
        }
        traced("newfstatat", ret)
    }

    fn fstat(fd: RawFd, st: &mut FileStat) -> isize {
        let mut raw = KernelStat::default();
        // SAFETY: `raw` has the kernel's layout.
        let ret = unsafe { syscall2(nr::FSTAT, fd as usize, &mut raw as *mut KernelStat as usize) };
        if ret == 0 {
            *st = raw.portable();
        }
        traced("fstat", ret)
    }

    fn access(path: &CStr, mode: u32) -> isize {
        // SAFETY: `path` is NUL-terminated.
        let ret = unsafe {
            syscall4(nr::FACCESSAT, AT_FDCWD as usize, path_arg(path), mode as usize, 0)
        };
        traced("faccessat", ret)
    }

    fn chown(path: &CStr, uid: u32, gid: u32) -> isize {
        // SAFETY: `path` is NUL-terminated.
        let ret = unsafe {
            syscall5(
                nr::FCHOWNAT,
                AT_FDCWD as usize,
                path_arg(path),
                uid as usize,
                gid as usize,
                0,
            )
        };
        traced("fchownat", ret)
    }

    fn fchown(fd: RawFd, uid: u32, gid: u32) -> isize {
        // SAFETY: fchown takes no pointers.
        let ret = unsafe { syscall3(nr::FCHOWN, fd as usize, uid as usize, gid as usize) };
        traced("fchown", ret)
    }

    fn chmod(path: &CStr, mode: u32) -> isize {
        // SAFETY: `path` is NUL-terminated.
        let ret = unsafe {
            syscall3(nr::FCHMODAT, AT_FDCWD as usize, path_arg(path), mode as usize)
        };
        traced("fchmodat", ret)
    }

    fn fchmod(fd: RawFd, mode: u32) -> isize {
        // SAFETY: fchmod takes no pointers.
        traced("fchmod", unsafe { syscall2(nr::FCHMOD, fd as usize, mode as usize) })
    }

    fn unlink(path: &CStr) -> isize {
        // SAFETY: `path` is NUL-terminated.
        let ret = unsafe { syscall3(nr::UNLINKAT, AT_FDCWD as usize, path_arg(path), 0) };
        traced("unlinkat", ret)
    }

    fn mkdir(path: &CStr, mode: u32) -> isize {
        // SAFETY: `path` is NUL-terminated.
        let ret = unsafe {
            syscall3(nr::MKDIRAT, AT_FDCWD as usize, path_arg(path), mode as usize)
        };
        traced("mkdirat", ret)
    }

    fn rmdir(path: &CStr) -> isize {
        // SAFETY: `path` is NUL-terminated.
        let ret = unsafe {
            syscall3(nr::UNLINKAT, AT_FDCWD as usize, path_arg(path), AT_REMOVEDIR)
        };
        traced("unlinkat", ret)
    }

    fn chdir(path: &CStr) -> isize {
        // SAFETY: `path` is NUL-terminated.
        traced("chdir", unsafe { syscall1(nr::CHDIR, path_arg(path)) })
    }

    fn fchdir(fd: RawFd) -> isize {
        // SAFETY: fchdir takes no pointers.
        traced("fchdir", unsafe { syscall1(nr::FCHDIR, fd as usize) })
    }

    fn chroot(path: &CStr) -> isize {
        // SAFETY: `path` is NUL-terminated.
        traced("chroot", unsafe { syscall1(nr::CHROOT, path_arg(path)) })
    }

    fn getcwd(buf: &mut [u8]) -> isize {
        // SAFETY: the kernel writes at most `buf.len()` bytes into `buf`.
        let ret = unsafe { syscall2(nr::GETCWD, buf.as_mut_ptr() as usize, buf.len()) };
        // The kernel counts the terminator.
        traced("getcwd", if ret > 0 { ret - 1 } else { ret })
    }

    fn getdents(fd: RawFd, buf: &mut [u8]) -> isize {
        // SAFETY: the kernel writes at most `buf.len()` bytes into `buf`.
        let ret = unsafe {
            syscall3(nr::GETDENTS64, fd as usize, buf.as_mut_ptr() as usize, buf.len())
        };
        traced("getdents64", ret)
    }

    unsafe fn mmap(
        addr: *mut u8,
        len: usize,
        prot: u32,
        flags: u32,
        fd: RawFd,
        offset: i64,
    ) -> isize {
        // SAFETY: the caller upholds `Kernel::mmap`.
        let ret = unsafe {
            syscall6(
                nr::MMAP,
                addr as usize,
                len,
                prot as usize,
                flags as usize,
                fd as isize as usize,
                offset as usize,
            )
        };
        traced("mmap", ret)
    }

    unsafe fn munmap(addr: *mut u8, len: usize) -> isize {
        // SAFETY: the caller upholds `Kernel::munmap`.
        traced("munmap", unsafe { syscall2(nr::MUNMAP, addr as usize, len) })
    }

    unsafe fn mprotect(addr: *mut u8, len: usize, prot: u32) -> isize {
        // SAFETY: the caller upholds `Kernel::mprotect`.
        let ret = unsafe { syscall3(nr::MPROTECT, addr as usize, len, prot as usize) };
        traced("mprotect", ret)
    }

    unsafe fn mremap(addr: *mut u8, old_len: usize, new_len: usize) -> Option<isize> {
        // SAFETY: the caller upholds `Kernel::mremap`.
        let ret = unsafe { syscall4(nr::MREMAP, addr as usize, old_len, new_len, MREMAP_MAYMOVE) };
        Some(traced("mremap", ret))
    }
}
