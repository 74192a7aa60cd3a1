//! Error and sentinel conventions.
//!
//! Every backend returns a raw `isize` from its syscall trampoline. A value
//! in `-4095..=-1` is a negated native error number; anything else is a
//! success value (a count, an offset, a descriptor or an address).

use core::fmt;

/// Largest error number any supported kernel reports.
pub const MAX_ERRNO: isize = 4095;

/// Classify a raw syscall result.
///
/// This is the only place the crate decides whether the kernel failed. It
/// never looks at which error it was.
#[inline]
pub const fn is_error(raw: isize) -> bool {
    raw < 0 && raw >= -MAX_ERRNO
}

/// Convert a raw syscall result to a `Result`.
#[inline]
pub fn syscall_result(raw: isize) -> Result<usize> {
    if is_error(raw) {
        Err(SysError::Errno(Errno::from_raw(raw)))
    } else {
        Ok(raw as usize)
    }
}

/// A native error number as reported by the kernel.
///
/// The numeric meaning is target-specific (`ENOENT` is 2 everywhere, but
/// `EAGAIN` is 11 on Linux and 35 on the BSDs), so it is carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(i32);

impl Errno {
    /// Build from a raw negative syscall result.
    #[inline]
    pub const fn from_raw(raw: isize) -> Self {
        Errno((-raw) as i32)
    }

    /// Build from a positive error number.
    #[inline]
    pub const fn new(code: i32) -> Self {
        Errno(code)
    }

    /// The positive native error number.
    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errno {}", self.0)
    }
}

/// Failure of a picolib operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysError {
    /// The handle holds the invalid sentinel; the kernel was not called.
    InvalidHandle,
    /// A portable value has no native encoding on this target.
    Unsupported,
    /// The kernel rejected the call.
    Errno(Errno),
}

impl SysError {
    /// The native error number, if the kernel produced this error.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Errno(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for SysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHandle => write!(f, "operation on an invalid handle"),
            Self::Unsupported => write!(f, "value has no native encoding"),
            Self::Errno(e) => write!(f, "kernel error: {}", e),
        }
    }
}

impl From<Errno> for SysError {
    fn from(err: Errno) -> Self {
        Self::Errno(err)
    }
}

/// Result type alias for picolib operations.
pub type Result<T> = core::result::Result<T, SysError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_range() {
        assert!(is_error(-1));
        assert!(is_error(-4095));
        assert!(!is_error(0));
        assert!(!is_error(3));
        // High user-space addresses from mmap are not errors.
        assert!(!is_error(-4096));
        assert!(!is_error(isize::MIN));
    }

    #[test]
    fn test_syscall_result() {
        assert_eq!(syscall_result(42), Ok(42));
        assert_eq!(
            syscall_result(-2),
            Err(SysError::Errno(Errno::new(2)))
        );
        assert_eq!(syscall_result(-2).unwrap_err().errno().map(Errno::code), Some(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(SysError::InvalidHandle.to_string(), "operation on an invalid handle");
        assert_eq!(SysError::Errno(Errno::new(13)).to_string(), "kernel error: errno 13");
        assert_eq!(SysError::Unsupported.errno(), None);
    }
}
