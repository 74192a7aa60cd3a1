//! Picolib syscall layer
//!
//! This crate is the filesystem and memory-mapping core of a runtime that
//! talks to the kernel without a C library. Portable code names what it
//! wants (`OpenFlags::READ`, `Seek::End`, `Protection::WRITE`) and the
//! selected backend turns that into the numbers its kernel expects.
//!
//! # Architecture
//!
//! ```text
//! Portable code
//!       |
//!       v
//!   fs::File / fs::Directory / memory::Region
//!       |
//!       v
//!   flags (portable -> native translation)
//!       |
//!       v
//!   sys::Native  (Linux | FreeBSD | Darwin, picked by cfg(target_os))
//!       |
//!       v
//!   kernel (via syscall / svc / ecall)
//! ```
//!
//! # Conventions
//!
//! - Raw results are classified by [`error::is_error`]; every backend folds
//!   its native failure encoding into `-4095..=-1` before returning.
//! - A handle that failed to open carries [`handle::INVALID_HANDLE`]. Every
//!   operation on it fails with [`SysError::InvalidHandle`] without entering
//!   the kernel.
//! - Handles are never closed implicitly. Call `close()`, or opt into
//!   [`handle::Scoped`] to have it done on drop.
//!
//! ```rust,no_run
//! use picolib::fs::{Close, Directory, File, OpenFlags, Rights};
//!
//! let file: File = File::create(c"/tmp/hello", OpenFlags::WRITE | OpenFlags::TRUNCATE, Rights::new(0o644));
//! if file.is_valid() {
//!     let _ = file.write(b"hello\n");
//!     let _ = file.close();
//! }
//!
//! let status = Directory::<picolib::sys::Native>::each(c"/tmp", |name| {
//!     let _ = name;
//!     0
//! });
//! assert!(status.is_ok());
//! ```

#![cfg_attr(not(test), no_std)]

#[cfg(not(target_pointer_width = "64"))]
compile_error!("picolib passes offsets and sizes in single registers and requires a 64-bit target");

pub mod abi;
pub mod error;
pub mod flags;
pub mod fs;
pub mod handle;
pub mod memory;
pub mod sys;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Errno, Result, SysError};
pub use sys::Native;
