//! Linux syscall numbers.
//!
//! x86_64 keeps its historical table; aarch64 and riscv64 share the
//! asm-generic one.

#[cfg(target_arch = "x86_64")]
mod table {
    pub const READ: usize = 0;
    pub const WRITE: usize = 1;
    pub const CLOSE: usize = 3;
    pub const FSTAT: usize = 5;
    pub const LSEEK: usize = 8;
    pub const MMAP: usize = 9;
    pub const MPROTECT: usize = 10;
    pub const MUNMAP: usize = 11;
    pub const MREMAP: usize = 25;
    pub const GETCWD: usize = 79;
    pub const CHDIR: usize = 80;
    pub const FCHDIR: usize = 81;
    pub const FCHMOD: usize = 91;
    pub const FCHOWN: usize = 93;
    pub const CHROOT: usize = 161;
    pub const GETDENTS64: usize = 217;
    pub const OPENAT: usize = 257;
    pub const MKDIRAT: usize = 258;
    pub const FCHOWNAT: usize = 260;
    pub const NEWFSTATAT: usize = 262;
    pub const UNLINKAT: usize = 263;
    pub const FCHMODAT: usize = 268;
    pub const FACCESSAT: usize = 269;
}

#[cfg(any(target_arch = "aarch64", target_arch = "riscv64"))]
mod table {
    pub const GETCWD: usize = 17;
    pub const MKDIRAT: usize = 34;
    pub const UNLINKAT: usize = 35;
    pub const FACCESSAT: usize = 48;
    pub const CHDIR: usize = 49;
    pub const FCHDIR: usize = 50;
    pub const CHROOT: usize = 51;
    pub const FCHMOD: usize = 52;
    pub const FCHMODAT: usize = 53;
    pub const FCHOWNAT: usize = 54;
    pub const FCHOWN: usize = 55;
    pub const OPENAT: usize = 56;
    pub const CLOSE: usize = 57;
    pub const GETDENTS64: usize = 61;
    pub const LSEEK: usize = 62;
    pub const READ: usize = 63;
    pub const WRITE: usize = 64;
    pub const NEWFSTATAT: usize = 79;
    pub const FSTAT: usize = 80;
    pub const MUNMAP: usize = 215;
    pub const MREMAP: usize = 216;
    pub const MMAP: usize = 222;
    pub const MPROTECT: usize = 226;
}

pub(super) use table::*;

/// Resolve relative paths against the working directory.
pub(super) const AT_FDCWD: isize = -100;
/// `unlinkat` flag selecting directory removal.
pub(super) const AT_REMOVEDIR: usize = 0x200;
/// Let `mremap` move the mapping.
pub(super) const MREMAP_MAYMOVE: usize = 1;
