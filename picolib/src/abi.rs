//! The seam between portable code and a native kernel.
//!
//! A backend is a zero-sized type implementing two traits:
//!
//! - [`Abi`]: the constant tables (open flags, whence values, access modes,
//!   protection and mapping bits, directory record layout). These are plain
//!   data and are compiled for every backend on every host, so translation
//!   can be checked anywhere.
//! - [`Kernel`]: one associated function per native operation. These are only
//!   compiled on the target they belong to.
//!
//! Handles take the backend as a type parameter, so dispatch is resolved at
//! compile time and there is no vtable.

use core::ffi::CStr;

use crate::handle::RawFd;

/// Where the fields of one variable-length directory record live.
///
/// Every supported kernel stores a native-endian `u16` record length and a
/// NUL-terminated name; only the offsets differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirentLayout {
    /// Offset of the `u16` record length.
    pub reclen_offset: usize,
    /// Offset of the `u8` entry type, if the record carries one.
    pub type_offset: Option<usize>,
    /// Offset of the first byte of the name.
    pub name_offset: usize,
    /// Longest name the kernel can put in one record, terminator excluded.
    pub name_max: usize,
}

impl DirentLayout {
    /// Bytes that must be present before any field of a record can be read.
    pub const fn header_len(&self) -> usize {
        let reclen_end = self.reclen_offset + 2;
        if reclen_end > self.name_offset {
            reclen_end
        } else {
            self.name_offset
        }
    }

    /// Smallest record length that can hold a header and a one-byte name
    /// terminator.
    pub const fn min_reclen(&self) -> usize {
        self.name_offset + 1
    }

    /// Largest record the kernel can produce, padded to 8 bytes.
    ///
    /// A read into a buffer smaller than this can fail outright instead of
    /// returning a short count.
    pub const fn max_reclen(&self) -> usize {
        (self.name_offset + self.name_max + 1 + 7) & !7
    }
}

/// Portable subset of the native `struct stat`.
///
/// Each backend converts its own layout into this one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStat {
    /// Device containing the file.
    pub dev: u64,
    /// Inode number.
    pub ino: u64,
    /// File type and permission bits.
    pub mode: u32,
    /// Number of hard links.
    pub nlink: u64,
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Size in bytes.
    pub size: u64,
}

/// Native constant tables for one kernel.
pub trait Abi {
    /// Human-readable backend name.
    const NAME: &'static str;

    /// Open for reading only.
    const O_RDONLY: u32;
    /// Open for writing only.
    const O_WRONLY: u32;
    /// Open for reading and writing.
    const O_RDWR: u32;
    /// Append on each write.
    const O_APPEND: u32;
    /// Truncate to zero length on open.
    const O_TRUNC: u32;
    /// Non-blocking mode.
    const O_NONBLOCK: u32;
    /// Create if missing.
    const O_CREAT: u32;
    /// Fail unless the path is a directory.
    const O_DIRECTORY: u32;
    /// Close on exec.
    const O_CLOEXEC: u32;

    /// Seek from beginning of file.
    const SEEK_SET: u32;
    /// Seek from current position.
    const SEEK_CUR: u32;
    /// Seek from end of file.
    const SEEK_END: u32;

    /// Test for existence.
    const F_OK: u32;
    /// Test for read permission.
    const R_OK: u32;
    /// Test for write permission.
    const W_OK: u32;
    /// Test for execute permission.
    const X_OK: u32;

    /// Pages cannot be accessed.
    const PROT_NONE: u32;
    /// Pages can be read.
    const PROT_READ: u32;
    /// Pages can be written.
    const PROT_WRITE: u32;
    /// Pages can be executed.
    const PROT_EXEC: u32;

    /// Share changes with the backing object.
    const MAP_SHARED: u32;
    /// Copy-on-write private mapping.
    const MAP_PRIVATE: u32;
    /// Mapping is not backed by a file.
    const MAP_ANONYMOUS: u32;

    /// Layout of one record returned by [`Kernel::getdents`].
    const DIRENT: DirentLayout;
}

/// Native syscall entry points for one kernel.
///
/// Every function returns the raw result with failures already encoded as
/// `-errno` (see [`crate::error::is_error`]). Nothing here retries on
/// interruption.
pub trait Kernel: Abi {
    /// `open(path, flags, mode)`.
    fn open(path: &CStr, flags: u32, mode: u32) -> isize;

    /// `close(fd)`.
    fn close(fd: RawFd) -> isize;

    /// `read(fd, buf, len)`.
    fn read(fd: RawFd, buf: &mut [u8]) -> isize;

    /// `write(fd, buf, len)`.
    fn write(fd: RawFd, buf: &[u8]) -> isize;

    /// `lseek(fd, offset, whence)`; returns the new offset.
    fn lseek(fd: RawFd, offset: i64, whence: u32) -> isize;

    /// `stat(path)`, following symlinks.
    fn stat(path: &CStr, st: &mut FileStat) -> isize;

    /// `fstat(fd)`.
    fn fstat(fd: RawFd, st: &mut FileStat) -> isize;

    /// `access(path, mode)` with the `*_OK` constants.
    fn access(path: &CStr, mode: u32) -> isize;

    /// `chown(path, uid, gid)`.
    fn chown(path: &CStr, uid: u32, gid: u32) -> isize;

    /// `fchown(fd, uid, gid)`.
    fn fchown(fd: RawFd, uid: u32, gid: u32) -> isize;

    /// `chmod(path, mode)`.
    fn chmod(path: &CStr, mode: u32) -> isize;

    /// `fchmod(fd, mode)`.
    fn fchmod(fd: RawFd, mode: u32) -> isize;

    /// `unlink(path)`.
    fn unlink(path: &CStr) -> isize;

    /// `mkdir(path, mode)`.
    fn mkdir(path: &CStr, mode: u32) -> isize;

    /// `rmdir(path)`.
    fn rmdir(path: &CStr) -> isize;

    /// `chdir(path)`.
    fn chdir(path: &CStr) -> isize;

    /// `fchdir(fd)`.
    fn fchdir(fd: RawFd) -> isize;

    /// `chroot(path)`.
    fn chroot(path: &CStr) -> isize;

    /// Write the current directory into `buf` as a NUL-terminated string.
    ///
    /// Returns the path length without the terminator.
    fn getcwd(buf: &mut [u8]) -> isize;

    /// Read packed directory records from `fd` into `buf`.
    ///
    /// Returns the number of bytes written, 0 at end of directory.
    fn getdents(fd: RawFd, buf: &mut [u8]) -> isize;

    /// `mmap(addr, len, prot, flags, fd, offset)`; returns the address.
    ///
    /// # Safety
    /// A non-null `addr` combined with a fixed-placement flag may replace
    /// existing mappings. The caller must own whatever lives there.
    unsafe fn mmap(addr: *mut u8, len: usize, prot: u32, flags: u32, fd: RawFd, offset: i64)
        -> isize;

    /// `munmap(addr, len)`.
    ///
    /// # Safety
    /// `addr..addr + len` must be a mapping owned by the caller that nothing
    /// references any more.
    unsafe fn munmap(addr: *mut u8, len: usize) -> isize;

    /// `mprotect(addr, len, prot)`.
    ///
    /// # Safety
    /// `addr..addr + len` must be a mapping owned by the caller, and no live
    /// reference into it may rely on an access the new protection removes.
    unsafe fn mprotect(addr: *mut u8, len: usize, prot: u32) -> isize;

    /// Grow a private anonymous mapping, moving it if needed.
    ///
    /// Returns `None` when the kernel has no such call; callers then fall back
    /// to map-copy-unmap.
    ///
    /// # Safety
    /// Same as [`Kernel::munmap`] for the old range: on success it is no
    /// longer valid.
    unsafe fn mremap(_addr: *mut u8, _old_len: usize, _new_len: usize) -> Option<isize> {
        None
    }
}
