//! Mapped memory regions.
//!
//! A [`Region`] owns one mapping: either backed by a file descriptor (see
//! [`crate::fs::File::map`]) or anonymous. A failed mapping is represented
//! by a zero-size region with a null base so callers can branch on
//! `size() == 0` the same way on every target.
//!
//! Anonymous regions can grow. Growth keeps the bytes already written: the
//! kernel moves the mapping itself where it can (`mremap` on Linux), and
//! elsewhere a new mapping is made, the prefix copied and the old one
//! unmapped.

use core::{fmt, marker::PhantomData, ptr};

use crate::abi::Kernel;
use crate::error::{is_error, syscall_result, Result, SysError};
use crate::flags::{mmap_prot, Protection};
use crate::handle::{RawFd, INVALID_HANDLE};

/// An owned mapping, unmapped on drop.
pub struct Region<K: Kernel> {
    base: *mut u8,
    size: usize,
    prot: Protection,
    anonymous: bool,
    _kernel: PhantomData<K>,
}

impl<K: Kernel> Region<K> {
    /// A zero-size region with a null base.
    pub const fn empty() -> Self {
        Region {
            base: ptr::null_mut(),
            size: 0,
            prot: Protection::empty(),
            anonymous: true,
            _kernel: PhantomData,
        }
    }

    /// Map `size` bytes of zeroed anonymous memory.
    ///
    /// Returns an empty region on failure.
    pub fn anonymous(size: usize, prot: Protection) -> Self {
        Self::try_anonymous(size, prot).unwrap_or_else(|_| Self::empty())
    }

    /// Map `size` bytes of zeroed anonymous memory, reporting failure.
    pub fn try_anonymous(size: usize, prot: Protection) -> Result<Self> {
        if size == 0 {
            return Ok(Self::empty());
        }
        let base = map_anonymous::<K>(size, prot)?;
        Ok(Region {
            base,
            size,
            prot,
            anonymous: true,
            _kernel: PhantomData,
        })
    }

    /// Map `size` bytes of `fd` starting at `offset`, shared with the file.
    ///
    /// `base` is a placement hint; null lets the kernel choose. Returns an
    /// empty region on failure.
    pub(crate) fn shared(
        fd: RawFd,
        base: *mut u8,
        prot: Protection,
        size: usize,
        offset: i64,
    ) -> Self {
        if size == 0 {
            return Self::empty();
        }
        // SAFETY: no fixed-placement flag is passed, so `base` is only a hint
        // and the kernel never replaces an existing mapping.
        let raw = unsafe { K::mmap(base, size, mmap_prot::<K>(prot), K::MAP_SHARED, fd, offset) };
        if is_error(raw) {
            log::debug!("{}: shared map of fd {} failed ({})", K::NAME, fd, -raw);
            return Self::empty();
        }
        Region {
            base: raw as *mut u8,
            size,
            prot,
            anonymous: false,
            _kernel: PhantomData,
        }
    }

    /// Current capacity in bytes. Zero means the mapping failed or was
    /// never made.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Is this the zero-size region?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Base address; null for an empty region.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.base
    }

    /// Protection the region was mapped with.
    #[inline]
    pub fn protection(&self) -> Protection {
        self.prot
    }

    /// The mapped bytes, if the region is readable.
    pub fn as_slice(&self) -> Option<&[u8]> {
        if self.is_empty() {
            return Some(&[]);
        }
        if !self.prot.contains(Protection::READ) {
            return None;
        }
        // SAFETY: `base..base + size` is a live readable mapping owned by self.
        Some(unsafe { core::slice::from_raw_parts(self.base, self.size) })
    }

    /// The mapped bytes, if the region is readable and writable.
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        if self.is_empty() {
            return Some(&mut []);
        }
        if !self.prot.contains(Protection::READ_WRITE) {
            return None;
        }
        // SAFETY: `base..base + size` is a live read-write mapping owned by self,
        // and `&mut self` guarantees no other borrow of it exists.
        Some(unsafe { core::slice::from_raw_parts_mut(self.base, self.size) })
    }

    /// Grow to at least `new_size` bytes, keeping the current contents.
    ///
    /// Shrinking is a no-op. Only anonymous regions can grow; a file-backed
    /// region returns `Err(SysError::Unsupported)`. On failure the region is
    /// left as it was.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        if new_size <= self.size {
            return Ok(());
        }
        if !self.anonymous {
            return Err(SysError::Unsupported);
        }
        if self.is_empty() {
            let prot = if self.prot.is_empty() {
                Protection::READ_WRITE
            } else {
                self.prot
            };
            *self = Self::try_anonymous(new_size, prot)?;
            return Ok(());
        }

        // SAFETY: `base..base + size` is an anonymous private mapping owned by
        // self; on success the old range is dead and replaced below.
        if let Some(raw) = unsafe { K::mremap(self.base, self.size, new_size) } {
            if !is_error(raw) {
                self.base = raw as *mut u8;
                self.size = new_size;
                return Ok(());
            }
            log::trace!("{}: mremap failed ({}), copying instead", K::NAME, -raw);
        }

        let fresh = map_anonymous::<K>(new_size, Protection::READ_WRITE)?;
        if !self.prot.contains(Protection::READ) {
            // SAFETY: the old mapping is owned by self; adding READ removes no
            // access anything relies on.
            let opened = unsafe {
                K::mprotect(self.base, self.size, mmap_prot::<K>(self.prot | Protection::READ))
            };
            if is_error(opened) {
                // SAFETY: `fresh` was mapped above and never handed out.
                unsafe { K::munmap(fresh, new_size) };
                return syscall_result(opened).map(drop);
            }
        }
        // SAFETY: both ranges are live, distinct mappings; the old one holds
        // `size` readable bytes and the new one at least as many writable.
        unsafe { ptr::copy_nonoverlapping(self.base, fresh, self.size) };
        // SAFETY: the old mapping is owned by self and no borrow of it can
        // outlive `&mut self`.
        let released = unsafe { K::munmap(self.base, self.size) };
        if is_error(released) {
            log::warn!("{}: unmapping grown region failed ({})", K::NAME, -released);
        }
        self.base = fresh;
        self.size = new_size;

        if self.prot != Protection::READ_WRITE {
            // SAFETY: `fresh` is owned by self and only reachable through it.
            let narrowed = unsafe { K::mprotect(fresh, new_size, mmap_prot::<K>(self.prot)) };
            if is_error(narrowed) {
                log::warn!("{}: restoring region protection failed ({})", K::NAME, -narrowed);
                self.prot = Protection::READ_WRITE;
            }
        }
        Ok(())
    }

    /// Unmap now and report the result.
    pub fn unmap(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.base.is_null() {
            return Ok(());
        }
        let (base, size) = (self.base, self.size);
        self.base = ptr::null_mut();
        self.size = 0;
        // SAFETY: the mapping is owned by self and has just been detached from
        // it, so nothing can reach it any more.
        syscall_result(unsafe { K::munmap(base, size) }).map(drop)
    }
}

impl<K: Kernel> Default for Region<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: Kernel> Drop for Region<K> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::warn!("{}: unmap on drop failed: {}", K::NAME, err);
        }
    }
}

impl<K: Kernel> fmt::Debug for Region<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("base", &self.base)
            .field("size", &self.size)
            .field("prot", &self.prot)
            .field("anonymous", &self.anonymous)
            .finish()
    }
}

fn map_anonymous<K: Kernel>(size: usize, prot: Protection) -> Result<*mut u8> {
    // SAFETY: a null hint without a fixed-placement flag never replaces an
    // existing mapping.
    let raw = unsafe {
        K::mmap(
            ptr::null_mut(),
            size,
            mmap_prot::<K>(prot),
            K::MAP_PRIVATE | K::MAP_ANONYMOUS,
            INVALID_HANDLE,
            0,
        )
    };
    syscall_result(raw).map(|addr| addr as *mut u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::Native;
    use crate::testing::{MockKernel, MockState};

    #[test]
    fn test_anonymous_is_zeroed_and_writable() {
        let mut region = Region::<Native>::anonymous(4096, Protection::READ_WRITE);
        assert_eq!(region.size(), 4096);
        let bytes = region.as_mut_slice().unwrap();
        assert!(bytes.iter().all(|&b| b == 0));
        bytes[4095] = 0xAB;
        assert_eq!(region.as_slice().unwrap()[4095], 0xAB);
    }

    #[test]
    fn test_zero_size_is_empty() {
        let region = Region::<Native>::anonymous(0, Protection::READ);
        assert!(region.is_empty());
        assert!(region.as_ptr().is_null());
        assert_eq!(region.as_slice(), Some(&[][..]));
    }

    #[test]
    fn test_resize_preserves_prefix() {
        let mut region = Region::<Native>::anonymous(4096, Protection::READ_WRITE);
        for (i, b) in region.as_mut_slice().unwrap().iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        region.resize(8192).unwrap();
        region.resize(16384).unwrap();
        assert_eq!(region.size(), 16384);
        let bytes = region.as_slice().unwrap();
        assert!(bytes[..4096].iter().enumerate().all(|(i, &b)| b == (i % 251) as u8));
        assert!(bytes[4096..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resize_smaller_is_noop() {
        let mut region = Region::<Native>::anonymous(8192, Protection::READ_WRITE);
        let base = region.as_ptr();
        region.resize(100).unwrap();
        assert_eq!(region.size(), 8192);
        assert_eq!(region.as_ptr(), base);
    }

    #[test]
    fn test_resize_empty_maps_fresh() {
        let mut region = Region::<Native>::empty();
        region.resize(4096).unwrap();
        assert_eq!(region.size(), 4096);
        assert!(region.as_mut_slice().is_some());
    }

    #[test]
    fn test_copy_fallback_does_not_leak() {
        MockState::reset();
        {
            let mut region = Region::<MockKernel>::anonymous(4096, Protection::READ_WRITE);
            region.as_mut_slice().unwrap()[..5].copy_from_slice(b"hello");
            region.resize(8192).unwrap();
            region.resize(16384).unwrap();
            assert_eq!(&region.as_slice().unwrap()[..5], b"hello");
        }
        let (maps, unmaps) = MockState::with(|s| (s.maps, s.unmaps));
        assert_eq!(maps, 3);
        assert_eq!(unmaps, 3);
    }

    #[test]
    fn test_copy_fallback_keeps_write_only_prefix() {
        MockState::reset();
        let mut region = Region::<MockKernel>::anonymous(4096, Protection::WRITE);
        // SAFETY: the region is 4096 writable bytes owned by this test.
        unsafe { ptr::copy_nonoverlapping(b"hello".as_ptr(), region.as_ptr(), 5) };

        region.resize(8192).unwrap();
        assert_eq!(region.size(), 8192);
        assert_eq!(region.protection(), Protection::WRITE);
        // Old mapping opened for reading, new one narrowed back.
        assert_eq!(MockState::with(|s| s.protects), 2);

        let prot = mmap_prot::<MockKernel>(Protection::READ_WRITE);
        // SAFETY: the mapping is owned by `region` and nothing borrows it.
        assert!(!is_error(unsafe { MockKernel::mprotect(region.as_ptr(), 8192, prot) }));
        // SAFETY: the first 5 bytes were copied over and are now readable.
        let prefix = unsafe { core::slice::from_raw_parts(region.as_ptr(), 5) };
        assert_eq!(prefix, b"hello");
    }

    #[test]
    fn test_explicit_unmap() {
        let region = Region::<Native>::anonymous(4096, Protection::READ);
        assert_eq!(region.unmap(), Ok(()));
        assert_eq!(Region::<Native>::empty().unmap(), Ok(()));
    }

    #[test]
    fn test_write_only_region_has_no_slice() {
        let mut region = Region::<Native>::anonymous(4096, Protection::WRITE);
        assert!(region.as_slice().is_none());
        assert!(region.as_mut_slice().is_none());
    }
}
