//! Directory enumeration protocol.
//!
//! The native "read directory entries" call fills a caller buffer and says
//! how many bytes it wrote, with no hint of how much is left. [`fetch`]
//! therefore reads into an anonymous [`Region`] until the kernel returns 0,
//! doubling the region after every non-empty read. The result is a
//! [`Listing`]: the region plus the number of bytes filled, walked with
//! [`Dirents`].

use core::fmt;

use super::dirent::Dirents;
use crate::abi::Kernel;
use crate::error::{is_error, syscall_result, Result, SysError};
use crate::flags::Protection;
use crate::handle::RawFd;
use crate::memory::Region;

/// Starting capacity of a listing buffer: one page.
pub const INITIAL_CAPACITY: usize = 4096;

/// Every record a directory returned, held in one owned buffer.
pub struct Listing<K: Kernel> {
    region: Region<K>,
    filled: usize,
}

impl<K: Kernel> Listing<K> {
    /// Bytes of packed records.
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Did the directory return no records at all?
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Capacity of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.region.size()
    }

    /// The filled bytes.
    pub fn as_bytes(&self) -> &[u8] {
        let bytes = self.region.as_slice().unwrap_or(&[]);
        &bytes[..self.filled.min(bytes.len())]
    }

    /// Walk the records.
    pub fn iter(&self) -> Dirents<'_> {
        Dirents::new(self.as_bytes(), K::DIRENT)
    }

    /// Hand each entry name to `proc` until it returns non-zero.
    ///
    /// Returns the last status `proc` returned, or 0 if there were no
    /// entries.
    pub fn each<F>(&self, mut proc: F) -> i32
    where
        F: FnMut(&core::ffi::CStr) -> i32,
    {
        let mut status = 0;
        for entry in self.iter() {
            status = proc(entry.name());
            if status != 0 {
                break;
            }
        }
        status
    }
}

impl<'a, K: Kernel> IntoIterator for &'a Listing<K> {
    type Item = super::DirEntry<'a>;
    type IntoIter = Dirents<'a>;

    fn into_iter(self) -> Dirents<'a> {
        self.iter()
    }
}

impl<K: Kernel> fmt::Debug for Listing<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listing")
            .field("filled", &self.filled)
            .field("capacity", &self.region.size())
            .finish()
    }
}

/// Read every record of the open directory `fd`.
///
/// `initial_capacity` is raised to at least one maximal record, since the
/// kernel rejects a read that cannot hold the next record. A failed read at
/// any point drops everything read so far and returns the error.
pub fn fetch<K: Kernel>(fd: RawFd, initial_capacity: usize) -> Result<Listing<K>> {
    let capacity = initial_capacity.max(K::DIRENT.max_reclen());
    let mut region = Region::<K>::try_anonymous(capacity, Protection::READ_WRITE)?;
    let mut filled = 0;

    loop {
        let buf = region.as_mut_slice().ok_or(SysError::Unsupported)?;
        let raw = K::getdents(fd, &mut buf[filled..]);
        if raw == 0 {
            break;
        }
        if is_error(raw) {
            log::debug!("{}: reading entries of fd {} failed ({})", K::NAME, fd, -raw);
        }
        filled += syscall_result(raw)?;

        let old = region.size();
        region.resize(old.saturating_mul(2))?;
        log::trace!(
            "{}: listing of fd {} grew {} -> {} ({} filled)",
            K::NAME,
            fd,
            old,
            region.size(),
            filled
        );
    }

    Ok(Listing { region, filled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::Abi;
    use crate::fs::dirent::tests::record;
    use crate::fs::{DT_DIR, DT_REG};
    use crate::testing::{MockKernel, MockState, Step};

    fn names(listing: &Listing<MockKernel>) -> Vec<Vec<u8>> {
        listing.iter().map(|e| e.name_bytes().to_vec()).collect()
    }

    #[test]
    fn test_empty_directory() {
        MockState::reset();
        MockState::script(vec![Step::Eof]);
        let listing = fetch::<MockKernel>(3, INITIAL_CAPACITY).unwrap();
        assert!(listing.is_empty());
        assert_eq!(listing.capacity(), INITIAL_CAPACITY);
        assert_eq!(listing.each(|_| panic!("no entries expected")), 0);
    }

    #[test]
    fn test_doubles_after_every_read() {
        MockState::reset();
        let mut first = record(DT_DIR, b".");
        first.extend(record(DT_DIR, b".."));
        MockState::script(vec![
            Step::Data(first),
            Step::Data(record(DT_REG, b"a")),
            Step::Data(record(DT_REG, b"b")),
            Step::Eof,
        ]);
        let listing = fetch::<MockKernel>(3, 512).unwrap();
        assert_eq!(listing.capacity(), 512 * 8);
        assert_eq!(
            names(&listing),
            vec![b".".to_vec(), b"..".to_vec(), b"a".to_vec(), b"b".to_vec()]
        );
        // Each read was offered exactly the unfilled tail.
        let offered = MockState::with(|s| s.offered.clone());
        assert_eq!(offered, vec![512, 1024 - 48, 2048 - 72, 4096 - 96]);
    }

    #[test]
    fn test_small_capacity_fits_one_record() {
        MockState::reset();
        MockState::script(vec![Step::Data(record(DT_REG, &[b'n'; 255])), Step::Eof]);
        let listing = fetch::<MockKernel>(3, 32).unwrap();

        // 19-byte header + 255-byte name + NUL, padded to 8.
        let floor = MockKernel::DIRENT.max_reclen();
        assert_eq!(floor, 280);
        assert_eq!(MockState::with(|s| s.offered[0]), floor);
        assert_eq!(listing.iter().next().map(|e| e.name_bytes().len()), Some(255));
    }

    #[test]
    fn test_error_after_reads_discards() {
        MockState::reset();
        MockState::script(vec![
            Step::Data(record(DT_REG, b"kept")),
            Step::Error(5),
        ]);
        let err = fetch::<MockKernel>(3, INITIAL_CAPACITY).unwrap_err();
        assert_eq!(err.errno().map(|e| e.code()), Some(5));
        // The buffer was unmapped on the way out.
        assert!(MockState::with(|s| s.maps == s.unmaps));
    }

    #[test]
    fn test_error_on_first_read() {
        MockState::reset();
        MockState::script(vec![Step::Error(9)]);
        assert!(fetch::<MockKernel>(3, INITIAL_CAPACITY).is_err());
    }

    #[test]
    fn test_each_stops_on_nonzero() {
        MockState::reset();
        let mut data = Vec::new();
        for name in [&b"one"[..], b"two", b"three", b"four"] {
            data.extend(record(DT_REG, name));
        }
        MockState::script(vec![Step::Data(data), Step::Eof]);
        let listing = fetch::<MockKernel>(3, INITIAL_CAPACITY).unwrap();

        let mut seen = 0;
        let status = listing.each(|_| {
            seen += 1;
            if seen == 2 {
                -7
            } else {
                0
            }
        });
        assert_eq!(status, -7);
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_kernel_overshoot_is_bounded() {
        MockState::reset();
        let mut data = record(DT_REG, b"good");
        let mut bad = record(DT_REG, b"bad");
        bad[16..18].copy_from_slice(&4000u16.to_ne_bytes());
        data.extend(bad);
        MockState::script(vec![Step::Data(data.clone()), Step::Eof]);

        let listing = fetch::<MockKernel>(3, INITIAL_CAPACITY).unwrap();
        assert_eq!(listing.len(), data.len());
        let mut walk = listing.iter();
        assert_eq!(walk.next().map(|e| e.name_bytes()), Some(&b"good"[..]));
        assert!(walk.next().is_none());
        assert!(walk.offset() <= listing.len());
    }
}
