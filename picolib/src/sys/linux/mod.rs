//! Linux backend (x86_64, aarch64, riscv64).
//!
//! Path operations go through the `*at` family with `AT_FDCWD`, since the
//! newer architectures have no plain `open`/`stat`/`unlink`. Directory
//! records come from `getdents64`.

use crate::abi::{Abi, DirentLayout};

#[cfg(target_os = "linux")]
mod kernel;
#[cfg(target_os = "linux")]
mod nr;
#[cfg(target_os = "linux")]
mod syscall;

/// The Linux kernel ABI.
#[derive(Debug, Clone, Copy)]
pub struct Linux;

impl Abi for Linux {
    const NAME: &'static str = "linux";

    const O_RDONLY: u32 = 0;
    const O_WRONLY: u32 = 0o1;
    const O_RDWR: u32 = 0o2;
    const O_CREAT: u32 = 0o100;
    const O_TRUNC: u32 = 0o1000;
    const O_APPEND: u32 = 0o2000;
    const O_NONBLOCK: u32 = 0o4000;
    #[cfg(target_arch = "aarch64")]
    const O_DIRECTORY: u32 = 0o40000;
    #[cfg(not(target_arch = "aarch64"))]
    const O_DIRECTORY: u32 = 0o200000;
    const O_CLOEXEC: u32 = 0o2000000;

    const SEEK_SET: u32 = 0;
    const SEEK_CUR: u32 = 1;
    const SEEK_END: u32 = 2;

    const F_OK: u32 = 0;
    const R_OK: u32 = 4;
    const W_OK: u32 = 2;
    const X_OK: u32 = 1;

    const PROT_NONE: u32 = 0;
    const PROT_READ: u32 = 1;
    const PROT_WRITE: u32 = 2;
    const PROT_EXEC: u32 = 4;

    const MAP_SHARED: u32 = 0x01;
    const MAP_PRIVATE: u32 = 0x02;
    const MAP_ANONYMOUS: u32 = 0x20;

    // struct linux_dirent64 { u64 d_ino; i64 d_off; u16 d_reclen; u8 d_type; char d_name[]; }
    const DIRENT: DirentLayout = DirentLayout {
        reclen_offset: 16,
        type_offset: Some(18),
        name_offset: 19,
        name_max: 255,
    };
}
