//! Native backends.
//!
//! Each backend's constant table ([`crate::abi::Abi`]) is compiled on every
//! host; its syscall entry points ([`crate::abi::Kernel`]) only on the
//! target OS. [`Native`] names the backend for the current target.

pub mod darwin;
pub mod freebsd;
pub mod linux;

/// The backend for the target being compiled.
#[cfg(target_os = "linux")]
pub type Native = linux::Linux;

/// The backend for the target being compiled.
#[cfg(target_os = "freebsd")]
pub type Native = freebsd::FreeBsd;

/// The backend for the target being compiled.
#[cfg(target_os = "macos")]
pub type Native = darwin::Darwin;

#[cfg(not(any(target_os = "linux", target_os = "freebsd", target_os = "macos")))]
compile_error!("picolib supports Linux, FreeBSD and macOS targets only");

/// Log one raw syscall result when the `trace-syscalls` feature is on.
#[inline(always)]
pub(crate) fn traced(name: &'static str, ret: isize) -> isize {
    #[cfg(feature = "trace-syscalls")]
    log::trace!("{} = {}", name, ret);
    #[cfg(not(feature = "trace-syscalls"))]
    let _ = name;
    ret
}
