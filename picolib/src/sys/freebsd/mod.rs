//! FreeBSD backend (x86_64, aarch64).
//!
//! Assumes the FreeBSD 12 ABI: 64-bit inodes, the `fstatat`/`getdirentries`
//! numbers from that release and the matching record layouts.

use crate::abi::{Abi, DirentLayout};

#[cfg(target_os = "freebsd")]
mod kernel;
#[cfg(target_os = "freebsd")]
mod syscall;

/// The FreeBSD kernel ABI.
#[derive(Debug, Clone, Copy)]
pub struct FreeBsd;

impl Abi for FreeBsd {
    const NAME: &'static str = "freebsd";

    const O_RDONLY: u32 = 0x0000;
    const O_WRONLY: u32 = 0x0001;
    const O_RDWR: u32 = 0x0002;
    const O_NONBLOCK: u32 = 0x0004;
    const O_APPEND: u32 = 0x0008;
    const O_CREAT: u32 = 0x0200;
    const O_TRUNC: u32 = 0x0400;
    const O_DIRECTORY: u32 = 0x0002_0000;
    const O_CLOEXEC: u32 = 0x0010_0000;

    const SEEK_SET: u32 = 0;
    const SEEK_CUR: u32 = 1;
    const SEEK_END: u32 = 2;

    const F_OK: u32 = 0;
    const R_OK: u32 = 0x04;
    const W_OK: u32 = 0x02;
    const X_OK: u32 = 0x01;

    const PROT_NONE: u32 = 0x00;
    const PROT_READ: u32 = 0x01;
    const PROT_WRITE: u32 = 0x02;
    const PROT_EXEC: u32 = 0x04;

    const MAP_SHARED: u32 = 0x0001;
    const MAP_PRIVATE: u32 = 0x0002;
    const MAP_ANONYMOUS: u32 = 0x1000;

    // struct dirent { u64 d_fileno; i64 d_off; u16 d_reclen; u8 d_type; u8 pad;
    //                 u16 d_namlen; u16 pad; char d_name[]; }
    const DIRENT: DirentLayout = DirentLayout {
        reclen_offset: 16,
        type_offset: Some(18),
        name_offset: 24,
        name_max: 255,
    };
}
