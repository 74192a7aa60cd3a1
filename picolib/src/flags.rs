//! Portable flags and their native translation.
//!
//! Everything here is a pure function of its input and the backend's
//! [`Abi`] table.

use bitflags::bitflags;

use crate::abi::Abi;
use crate::error::{Result, SysError};

bitflags! {
    /// How a file is opened.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const READ     = 1 << 0;
        const WRITE    = 1 << 1;
        const APPEND   = 1 << 2;
        const TRUNCATE = 1 << 3;
    }
}

bitflags! {
    /// Access allowed to a mapped region.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Protection: u32 {
        const READ  = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC  = 1 << 2;
    }
}

impl Protection {
    /// Readable and writable.
    pub const READ_WRITE: Self = Self::READ.union(Self::WRITE);
}

/// Origin of a seek.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek {
    /// From the start of the file.
    Begin = 0,
    /// From the current cursor.
    Current = 1,
    /// From the end of the file.
    End = 2,
}

impl TryFrom<u32> for Seek {
    type Error = SysError;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Seek::Begin),
            1 => Ok(Seek::Current),
            2 => Ok(Seek::End),
            _ => Err(SysError::Unsupported),
        }
    }
}

/// Translate portable open flags to the native open mode.
///
/// TRUNCATE and APPEND are passed through. The access mode is derived from
/// READ and WRITE. The non-blocking bit is always set, so every descriptor
/// opened through this crate is non-blocking.
///
/// Returns `None` when neither READ nor WRITE is present: such a request has
/// no access mode and is refused rather than silently opened read-only.
pub fn open_flags<A: Abi>(flags: OpenFlags) -> Option<u32> {
    let access = match (
        flags.contains(OpenFlags::READ),
        flags.contains(OpenFlags::WRITE),
    ) {
        (true, false) => A::O_RDONLY,
        (false, true) => A::O_WRONLY,
        (true, true) => A::O_RDWR,
        (false, false) => return None,
    };

    let mut native = access | A::O_NONBLOCK;
    if flags.contains(OpenFlags::TRUNCATE) {
        native |= A::O_TRUNC;
    }
    if flags.contains(OpenFlags::APPEND) {
        native |= A::O_APPEND;
    }
    Some(native)
}

/// Translate a seek origin to the native whence value.
pub fn seek_whence<A: Abi>(method: Seek) -> u32 {
    match method {
        Seek::Begin => A::SEEK_SET,
        Seek::Current => A::SEEK_CUR,
        Seek::End => A::SEEK_END,
    }
}

/// Translate a seek origin held as its portable integer value.
///
/// Anything outside `0..=2` yields `Err(SysError::Unsupported)`.
pub fn seek_whence_raw<A: Abi>(raw: u32) -> Result<u32> {
    Seek::try_from(raw).map(seek_whence::<A>)
}

/// Translate a memory protection to native `PROT_*` bits.
pub fn mmap_prot<A: Abi>(prot: Protection) -> u32 {
    let mut native = A::PROT_NONE;
    if prot.contains(Protection::READ) {
        native |= A::PROT_READ;
    }
    if prot.contains(Protection::WRITE) {
        native |= A::PROT_WRITE;
    }
    if prot.contains(Protection::EXEC) {
        native |= A::PROT_EXEC;
    }
    native
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::{darwin::Darwin, freebsd::FreeBsd, linux::Linux};

    fn all_combinations() -> impl Iterator<Item = OpenFlags> {
        (0..16u32).map(OpenFlags::from_bits_truncate)
    }

    fn check_open_flags<A: Abi>() {
        for flags in all_combinations() {
            let first = open_flags::<A>(flags);
            assert_eq!(first, open_flags::<A>(flags), "{} not deterministic", A::NAME);

            let Some(native) = first else {
                assert!(!flags.intersects(OpenFlags::READ | OpenFlags::WRITE));
                continue;
            };
            assert_eq!(native & A::O_NONBLOCK, A::O_NONBLOCK, "{}: {:?}", A::NAME, flags);
            assert_eq!(
                native & A::O_TRUNC != 0,
                flags.contains(OpenFlags::TRUNCATE),
                "{}: {:?}",
                A::NAME,
                flags
            );
            assert_eq!(
                native & A::O_APPEND != 0,
                flags.contains(OpenFlags::APPEND),
                "{}: {:?}",
                A::NAME,
                flags
            );

            let access = native & (A::O_RDONLY | A::O_WRONLY | A::O_RDWR);
            let expected = match (
                flags.contains(OpenFlags::READ),
                flags.contains(OpenFlags::WRITE),
            ) {
                (true, true) => A::O_RDWR,
                (false, true) => A::O_WRONLY,
                _ => A::O_RDONLY,
            };
            assert_eq!(access, expected, "{}: {:?}", A::NAME, flags);
        }
    }

    #[test]
    fn test_open_flags_linux() {
        check_open_flags::<Linux>();
        assert_eq!(open_flags::<Linux>(OpenFlags::READ), Some(0o4000));
        assert_eq!(
            open_flags::<Linux>(OpenFlags::WRITE | OpenFlags::TRUNCATE),
            Some(0o1 | 0o1000 | 0o4000)
        );
    }

    #[test]
    fn test_open_flags_freebsd() {
        check_open_flags::<FreeBsd>();
        assert_eq!(
            open_flags::<FreeBsd>(OpenFlags::READ | OpenFlags::WRITE | OpenFlags::APPEND),
            Some(0x2 | 0x8 | 0x4)
        );
    }

    #[test]
    fn test_open_flags_darwin() {
        check_open_flags::<Darwin>();
        assert_eq!(open_flags::<Darwin>(OpenFlags::WRITE), Some(0x1 | 0x4));
    }

    #[test]
    fn test_open_flags_without_access_mode() {
        assert_eq!(open_flags::<Linux>(OpenFlags::empty()), None);
        assert_eq!(open_flags::<Linux>(OpenFlags::TRUNCATE), None);
        assert_eq!(open_flags::<FreeBsd>(OpenFlags::APPEND | OpenFlags::TRUNCATE), None);
        assert_eq!(open_flags::<Darwin>(OpenFlags::APPEND), None);
    }

    #[test]
    fn test_seek_whence() {
        fn check<A: Abi>() {
            assert_eq!(seek_whence::<A>(Seek::Begin), A::SEEK_SET);
            assert_eq!(seek_whence::<A>(Seek::Current), A::SEEK_CUR);
            assert_eq!(seek_whence::<A>(Seek::End), A::SEEK_END);
            assert_eq!(seek_whence_raw::<A>(0), Ok(A::SEEK_SET));
            assert_eq!(seek_whence_raw::<A>(2), Ok(A::SEEK_END));
            assert_eq!(seek_whence_raw::<A>(3), Err(SysError::Unsupported));
            assert_eq!(seek_whence_raw::<A>(u32::MAX), Err(SysError::Unsupported));
        }
        check::<Linux>();
        check::<FreeBsd>();
        check::<Darwin>();
        assert_eq!(seek_whence::<Linux>(Seek::End), 2);
    }

    #[test]
    fn test_mmap_prot() {
        assert_eq!(mmap_prot::<Linux>(Protection::empty()), 0);
        assert_eq!(mmap_prot::<Linux>(Protection::READ_WRITE), 0x3);
        assert_eq!(mmap_prot::<Darwin>(Protection::all()), 0x7);
        assert_eq!(mmap_prot::<FreeBsd>(Protection::EXEC), 0x4);
    }
}
