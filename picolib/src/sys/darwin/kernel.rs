use core::ffi::CStr;

use super::syscall::syscall;
use super::Darwin;
use crate::abi::{Abi, FileStat, Kernel};
use crate::handle::RawFd;
use crate::sys::traced;

mod nr {
    pub const READ: usize = 3;
    pub const WRITE: usize = 4;
    pub const OPEN: usize = 5;
    pub const CLOSE: usize = 6;
    pub const UNLINK: usize = 10;
    pub const CHDIR: usize = 12;
    pub const FCHDIR: usize = 13;
    pub const CHMOD: usize = 15;
    pub const CHOWN: usize = 16;
    pub const ACCESS: usize = 33;
    pub const CHROOT: usize = 61;
    pub const MUNMAP: usize = 73;
    pub const MPROTECT: usize = 74;
    pub const FCNTL: usize = 92;
    pub const FCHOWN: usize = 123;
    pub const FCHMOD: usize = 124;
    pub const MKDIR: usize = 136;
    pub const RMDIR: usize = 137;
    pub const MMAP: usize = 197;
    pub const LSEEK: usize = 199;
    pub const STAT64: usize = 338;
    pub const FSTAT64: usize = 339;
    pub const GETDIRENTRIES64: usize = 344;
}

const F_GETPATH: usize = 50;
const MAXPATHLEN: usize = 1024;
const ERANGE: isize = 34;

#[derive(Default, Clone, Copy)]
#[repr(C)]
#[allow(dead_code)]
struct Timespec {
    tv_sec: i64,
    tv_nsec: i64,
}

/// `struct stat64`.
#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct KernelStat {
    st_dev: i32,
    st_mode: u16,
    st_nlink: u16,
    st_ino: u64,
    st_uid: u32,
    st_gid: u32,
    st_rdev: i32,
    st_atimespec: Timespec,
    st_mtimespec: Timespec,
    st_ctimespec: Timespec,
    st_birthtimespec: Timespec,
    st_size: i64,
    st_blocks: i64,
    st_blksize: i32,
    st_flags: u32,
    st_gen: u32,
    st_lspare: i32,
    st_qspare: [i64; 2],
}

impl KernelStat {
    fn portable(&self) -> FileStat {
        FileStat {
            dev: self.st_dev as u32 as u64,
            ino: self.st_ino,
            mode: self.st_mode as u32,
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

/// Calls that take no pointers, or only a NUL-terminated path.
fn plain(name: &'static str, nr: usize, a: [usize; 6]) -> isize {
    // SAFETY: callers only pass integers and pointers to live `CStr`s.
    traced(name, unsafe { syscall(nr, a) })
}

impl Kernel for Darwin {
    fn open(path: &CStr, flags: u32, mode: u32) -> isize {
        plain("open", nr::OPEN, [path_arg(path), flags as usize, mode as usize, 0, 0, 0])
    }

    fn close(fd: RawFd) -> isize {
        plain("close", nr::CLOSE, [fd as usize, 0, 0, 0, 0, 0])
    }

    fn read(fd: RawFd, buf: &mut [u8]) -> isize {
        let a = [fd as usize, buf.as_mut_ptr() as usize, buf.len(), 0, 0, 0];
        // SAFETY: the kernel writes at most `buf.len()` bytes into `buf`.
        traced("read", unsafe { syscall(nr::READ, a) })
    }

    fn write(fd: RawFd, buf: &[u8]) -> isize {
        let a = [fd as usize, buf.as_ptr() as usize, buf.len(), 0, 0, 0];
        // SAFETY: the kernel reads at most `buf.len()` bytes from `buf`.
        traced("write", unsafe { syscall(nr::WRITE, a) })
    }

    fn lseek(fd: RawFd, offset: i64, whence: u32) -> isize {
        plain("lseek", nr::LSEEK, [fd as usize, offset as usize, whence as usize, 0, 0, 0])
    }

    fn stat(path: &CStr, st: &mut FileStat) -> isize {
        let mut raw = KernelStat::default();
        let a = [path_arg(path), &mut raw as *mut KernelStat as usize, 0, 0, 0, 0];
        // SAFETY: `path` is NUL-terminated; `raw` has the kernel's layout.
        let ret = unsafe { syscall(nr::STAT64, a) };
        if ret == 0 {
            *st = raw.portable();
        }
        traced("stat64", ret)
    }

    fn fstat(fd: RawFd, st: &mut FileStat) -> isize {
        let mut raw = KernelStat::default();
        let a = [fd as usize, &mut raw as *mut KernelStat as usize, 0, 0, 0, 0];
        // SAFETY: `raw` has the kernel's layout.
        let ret = unsafe { syscall(nr::FSTAT64, a) };
        if ret == 0 {
            *st = raw.portable();
        }
        traced("fstat64", ret)
    }

    fn access(path: &CStr, mode: u32) -> isize {
        plain("access", nr::ACCESS, [path_arg(path), mode as usize, 0, 0, 0, 0])
    }

    fn chown(path: &CStr, uid: u32, gid: u32) -> isize {
        plain("chown", nr::CHOWN, [path_arg(path), uid as usize, gid as usize, 0, 0, 0])
    }

    fn fchown(fd: RawFd, uid: u32, gid: u32) -> isize {
        plain("fchown", nr::FCHOWN, [fd as usize, uid as usize, gid as usize, 0, 0, 0])
    }

    fn chmod(path: &CStr, mode: u32) -> isize {
        plain("chmod", nr::CHMOD, [path_arg(path), mode as usize, 0, 0, 0, 0])
    }

    fn fchmod(fd: RawFd, mode: u32) -> isize {
        plain("fchmod", nr::FCHMOD, [fd as usize, mode as usize, 0, 0, 0, 0])
    }

    fn unlink(path: &CStr) -> isize {
        plain("unlink", nr::UNLINK, [path_arg(path), 0, 0, 0, 0, 0])
    }

    fn mkdir(path: &CStr, mode: u32) -> isize {
        plain("mkdir", nr::MKDIR, [path_arg(path), mode as usize, 0, 0, 0, 0])
    }

    fn rmdir(path: &CStr) -> isize {
        plain("rmdir", nr::RMDIR, [path_arg(path), 0, 0, 0, 0, 0])
    }

    fn chdir(path: &CStr) -> isize {
        plain("chdir", nr::CHDIR, [path_arg(path), 0, 0, 0, 0, 0])
    }

    fn fchdir(fd: RawFd) -> isize {
        plain("fchdir", nr::FCHDIR, [fd as usize, 0, 0, 0, 0, 0])
    }

    fn chroot(path: &CStr) -> isize {
        plain("chroot", nr::CHROOT, [path_arg(path), 0, 0, 0, 0, 0])
    }

    fn getcwd(buf: &mut [u8]) -> isize {
        let flags = Self::O_RDONLY | Self::O_DIRECTORY | Self::O_CLOEXEC;
        let fd = Self::open(c".", flags, 0);
        if fd < 0 {
            return fd;
        }

        // F_GETPATH always writes into a MAXPATHLEN buffer.
        let mut path = [0u8; MAXPATHLEN];
        let a = [fd as usize, F_GETPATH, path.as_mut_ptr() as usize, 0, 0, 0];
        // SAFETY: `path` is MAXPATHLEN bytes, the size F_GETPATH requires.
        let ret = unsafe { syscall(nr::FCNTL, a) };
        let closed = Self::close(fd as RawFd);
        if closed < 0 {
            log::debug!("darwin: closing getcwd descriptor {} failed ({})", fd, -closed);
        }
        if ret < 0 {
            return traced("fcntl(F_GETPATH)", ret);
        }

        let len = path.iter().position(|&b| b == 0).unwrap_or(MAXPATHLEN);
        if len + 1 > buf.len() {
            return traced("getcwd", -ERANGE);
        }
        buf[..len].copy_from_slice(&path[..len]);
        buf[len] = 0;
        traced("getcwd", len as isize)
    }

    fn getdents(fd: RawFd, buf: &mut [u8]) -> isize {
        let mut base: i64 = 0;
        let a = [
            fd as usize,
            buf.as_mut_ptr() as usize,
            buf.len(),
            &mut base as *mut i64 as usize,
            0,
            0,
        ];
        // SAFETY: the kernel writes at most `buf.len()` bytes into `buf` and
        // one position into `base`.
        traced("getdirentries64", unsafe { syscall(nr::GETDIRENTRIES64, a) })
    }

    unsafe fn mmap(
        addr: *mut u8,
        len: usize,
        prot: u32,
        flags: u32,
        fd: RawFd,
        offset: i64,
    ) -> isize {
        let a = [
            addr as usize,
            len,
            prot as usize,
            flags as usize,
            fd as isize as usize,
            offset as usize,
        ];
        // SAFETY: the caller upholds `Kernel::mmap`.
        traced("mmap", unsafe { syscall(nr::MMAP, a) })
    }

    unsafe fn munmap(addr: *mut u8, len: usize) -> isize {
        // SAFETY: the caller upholds `Kernel::munmap`.
        traced("munmap", unsafe { syscall(nr::MUNMAP, [addr as usize, len, 0, 0, 0, 0]) })
    }

    unsafe fn mprotect(addr: *mut u8, len: usize, prot: u32) -> isize {
        let a = [addr as usize, len, prot as usize, 0, 0, 0];
        // SAFETY: the caller upholds `Kernel::mprotect`.
        traced("mprotect", unsafe { syscall(nr::MPROTECT, a) })
    }
}
