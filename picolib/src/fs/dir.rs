use core::{ffi::CStr, fmt};

use super::listing::{fetch, Listing, INITIAL_CAPACITY};
use super::Rights;
use crate::abi::Kernel;
use crate::error::{syscall_result, Result, SysError};
use crate::handle::{Close, Handle, RawFd};
use crate::sys::Native;

/// An open directory.
///
/// Like [`super::File`], a failed open yields an invalid handle and the
/// directory is only closed by an explicit [`Close::close`].
#[must_use = "an open Directory must be closed explicitly"]
pub struct Directory<K: Kernel = Native> {
    handle: Handle<K>,
}

impl<K: Kernel> Directory<K> {
    /// Open a directory. The kernel refuses paths that are not directories.
    pub fn open(path: &CStr) -> Self {
        Self::try_open(path).unwrap_or_else(|_| Directory {
            handle: Handle::invalid(),
        })
    }

    /// [`Directory::open`], keeping the kernel's error instead of folding it
    /// into an invalid handle.
    pub fn try_open(path: &CStr) -> Result<Self> {
        let raw = K::open(path, K::O_RDONLY | K::O_DIRECTORY | K::O_CLOEXEC, 0);
        if let Err(err) = syscall_result(raw) {
            log::debug!("{}: opendir {:?} failed ({})", K::NAME, path, -raw);
            return Err(err);
        }
        Ok(Directory {
            handle: Handle::from_result(raw),
        })
    }

    /// Take ownership of a raw directory descriptor.
    ///
    /// # Safety
    /// The caller must own `fd` and must not close it elsewhere.
    pub unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Directory {
            // SAFETY: ownership of `fd` is passed on unchanged.
            handle: unsafe { Handle::from_raw(fd) },
        }
    }

    /// Did the open succeed?
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Did the open fail?
    pub fn is_invalid(&self) -> bool {
        self.handle.is_invalid()
    }

    /// The raw descriptor, or the sentinel.
    pub fn raw_fd(&self) -> RawFd {
        self.handle.raw()
    }

    /// Create a directory at `path`.
    pub fn create(path: &CStr, rights: Rights) -> Result<()> {
        syscall_result(K::mkdir(path, rights.value())).map(drop)
    }

    /// Remove the (empty) directory at `path`.
    pub fn remove(path: &CStr) -> Result<()> {
        syscall_result(K::rmdir(path)).map(drop)
    }

    /// Write the process working directory into `buf`.
    ///
    /// Fails with the kernel's range error if `buf` is too small.
    pub fn current(buf: &mut [u8]) -> Result<&CStr> {
        let len = syscall_result(K::getcwd(buf))?;
        buf.get(..=len)
            .and_then(|bytes| CStr::from_bytes_with_nul(bytes).ok())
            .ok_or(SysError::Unsupported)
    }

    /// Make `path` the process working directory.
    pub fn set_current_path(path: &CStr) -> Result<()> {
        syscall_result(K::chdir(path)).map(drop)
    }

    /// Make this directory the process working directory, without looking
    /// its path up again.
    pub fn set_current(&self) -> Result<()> {
        syscall_result(K::fchdir(self.handle.get()?)).map(drop)
    }

    /// Change the process root directory to `path`.
    ///
    /// Needs privilege; an unprivileged caller gets the kernel's permission
    /// error like any other failure.
    pub fn change_root(path: &CStr) -> Result<()> {
        syscall_result(K::chroot(path)).map(drop)
    }

    /// Read every entry of this directory into an owned [`Listing`].
    pub fn entries(&self) -> Result<Listing<K>> {
        self.entries_with_capacity(INITIAL_CAPACITY)
    }

    /// [`Directory::entries`] starting from a buffer of `capacity` bytes.
    ///
    /// Capacities smaller than the largest possible record are raised to it.
    pub fn entries_with_capacity(&self, capacity: usize) -> Result<Listing<K>> {
        fetch::<K>(self.handle.get()?, capacity)
    }

    /// Call `proc` with the name of each entry until it returns non-zero.
    ///
    /// Returns `Ok` with the last status `proc` returned (0 if the directory
    /// had no entries or every call returned 0), or the error that stopped
    /// the directory from being read. Entries read before a failure are
    /// discarded and never reach `proc`.
    ///
    /// The directory's read position is consumed; listing the same handle
    /// twice yields no entries the second time.
    pub fn list<F>(&self, proc: F) -> Result<i32>
    where
        F: FnMut(&CStr) -> i32,
    {
        self.list_with_capacity(INITIAL_CAPACITY, proc)
    }

    /// [`Directory::list`] starting from a buffer of `capacity` bytes, raised
    /// to at least the largest possible record.
    pub fn list_with_capacity<F>(&self, capacity: usize, proc: F) -> Result<i32>
    where
        F: FnMut(&CStr) -> i32,
    {
        Ok(self.entries_with_capacity(capacity)?.each(proc))
    }

    /// Open `path`, [`list`](Directory::list) it, and close it again on every
    /// exit path, including a panic inside `proc`.
    ///
    /// A failed open returns the kernel's error without calling `proc`.
    pub fn each<F>(path: &CStr, proc: F) -> Result<i32>
    where
        F: FnMut(&CStr) -> i32,
    {
        let dir = Self::try_open(path)?.scoped();
        dir.list(proc)
    }
}

impl<K: Kernel> Close for Directory<K> {
    fn close(self) -> Result<()> {
        self.handle.close()
    }
}

impl<K: Kernel> fmt::Debug for Directory<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("fd", &self.handle.raw())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Errno;
    use crate::fs::dirent::tests::record;
    use crate::fs::DT_REG;
    use crate::testing::{MockKernel, MockState, Step};

    #[test]
    fn test_each_closes_after_early_stop() {
        MockState::reset();
        let mut data = record(DT_REG, b"x");
        data.extend(record(DT_REG, b"y"));
        MockState::script(vec![Step::Data(data), Step::Eof]);

        let status = Directory::<MockKernel>::each(c"/d", |_| 1).unwrap();
        assert_eq!(status, 1);
        assert_eq!(MockState::with(|s| s.closed.clone()), vec![3]);
    }

    #[test]
    fn test_each_closes_after_fetch_error() {
        MockState::reset();
        MockState::script(vec![Step::Error(5)]);
        let result = Directory::<MockKernel>::each(c"/d", |_| 0);
        assert!(result.is_err());
        assert_eq!(MockState::with(|s| s.closed.clone()), vec![3]);
    }

    #[test]
    fn test_each_closes_on_panic() {
        MockState::reset();
        MockState::script(vec![Step::Data(record(DT_REG, b"boom")), Step::Eof]);
        let outcome = std::panic::catch_unwind(|| {
            let _ = Directory::<MockKernel>::each(c"/d", |_| panic!("callback failed"));
        });
        assert!(outcome.is_err());
        assert_eq!(MockState::with(|s| s.closed.clone()), vec![3]);
    }

    #[test]
    fn test_each_open_failure() {
        MockState::reset();
        MockState::with(|s| s.fail_open = true);
        let mut called = false;
        let result = Directory::<MockKernel>::each(c"/missing", |_| {
            called = true;
            0
        });
        assert_eq!(result, Err(SysError::Errno(Errno::new(2))));
        assert!(!called);
        assert!(MockState::with(|s| s.closed.is_empty()));
    }

    #[test]
    fn test_try_open_keeps_errno() {
        MockState::reset();
        MockState::with(|s| s.fail_open = true);
        let err = Directory::<MockKernel>::try_open(c"/missing").unwrap_err();
        assert_eq!(err.errno(), Some(Errno::new(2)));

        MockState::with(|s| s.fail_open = false);
        let dir = Directory::<MockKernel>::try_open(c"/d").unwrap();
        assert!(dir.is_valid());
        dir.close().unwrap();
    }

    #[test]
    fn test_list_on_invalid_handle() {
        MockState::reset();
        MockState::with(|s| s.fail_open = true);
        let dir = Directory::<MockKernel>::open(c"/missing");
        assert_eq!(dir.list(|_| 0), Err(SysError::InvalidHandle));
        assert_eq!(dir.set_current(), Err(SysError::InvalidHandle));
        assert_eq!(MockState::with(|s| s.calls), 1);
    }

    #[test]
    fn test_path_operations_reach_kernel() {
        MockState::reset();
        assert_eq!(Directory::<MockKernel>::change_root(c"/jail"), Ok(()));
        assert_eq!(Directory::<MockKernel>::create(c"/d", Rights::DEFAULT_DIR), Ok(()));
        assert_eq!(Directory::<MockKernel>::remove(c"/d"), Ok(()));
        assert_eq!(Directory::<MockKernel>::set_current_path(c"/d"), Ok(()));
        assert_eq!(MockState::with(|s| s.calls), 4);
    }

    #[test]
    fn test_current_returns_borrowed_path() {
        let mut buf = [0u8; 16];
        assert_eq!(Directory::<MockKernel>::current(&mut buf), Ok(c"/"));
        let mut tiny = [0u8; 1];
        assert!(Directory::<MockKernel>::current(&mut tiny).is_err());
    }
}
