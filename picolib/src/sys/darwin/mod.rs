//! Darwin (macOS) backend, x86_64 and arm64.
//!
//! Uses the 64-bit-inode calls (`stat64`, `getdirentries64`). There is no
//! getcwd syscall; the working directory is resolved through
//! `fcntl(F_GETPATH)` on an open `"."`.

use crate::abi::{Abi, DirentLayout};

#[cfg(target_os = "macos")]
mod kernel;
#[cfg(target_os = "macos")]
mod syscall;

/// The XNU kernel ABI.
#[derive(Debug, Clone, Copy)]
pub struct Darwin;

impl Abi for Darwin {
    const NAME: &'static str = "darwin";

    const O_RDONLY: u32 = 0x0000;
    const O_WRONLY: u32 = 0x0001;
    const O_RDWR: u32 = 0x0002;
    const O_NONBLOCK: u32 = 0x0004;
    const O_APPEND: u32 = 0x0008;
    const O_CREAT: u32 = 0x0200;
    const O_TRUNC: u32 = 0x0400;
    const O_DIRECTORY: u32 = 0x0010_0000;
    const O_CLOEXEC: u32 = 0x0100_0000;

    const SEEK_SET: u32 = 0;
    const SEEK_CUR: u32 = 1;
    const SEEK_END: u32 = 2;

    const F_OK: u32 = 0;
    const R_OK: u32 = 1 << 2;
    const W_OK: u32 = 1 << 1;
    const X_OK: u32 = 1 << 0;

    const PROT_NONE: u32 = 0x00;
    const PROT_READ: u32 = 0x01;
    const PROT_WRITE: u32 = 0x02;
    const PROT_EXEC: u32 = 0x04;

    const MAP_SHARED: u32 = 0x0001;
    const MAP_PRIVATE: u32 = 0x0002;
    const MAP_ANONYMOUS: u32 = 0x1000;

    // struct direntry { u64 d_ino; u64 d_seekoff; u16 d_reclen; u16 d_namlen;
    //                   u8 d_type; char d_name[]; }
    const DIRENT: DirentLayout = DirentLayout {
        reclen_offset: 16,
        type_offset: Some(20),
        name_offset: 21,
        // d_name is sized for a whole path.
        name_max: 1023,
    };
}
