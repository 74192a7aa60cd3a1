use core::{ffi::CStr, fmt};

use super::{Owner, Rights};
use crate::abi::{FileStat, Kernel};
use crate::error::{syscall_result, Result};
use crate::flags::{open_flags, seek_whence, seek_whence_raw, OpenFlags, Protection, Seek};
use crate::handle::{Close, Handle, RawFd};
use crate::memory::Region;
use crate::sys::Native;

/// An open file.
///
/// Opening never fails loudly: a failed open gives a handle for which
/// [`File::is_invalid`] is true, and every later operation on it returns
/// `Err(SysError::InvalidHandle)` without a syscall.
///
/// Every descriptor is opened non-blocking. The file is **not** closed on
/// drop; call [`Close::close`] or use [`Close::scoped`].
#[must_use = "an open File must be closed explicitly"]
pub struct File<K: Kernel = Native> {
    handle: Handle<K>,
}

impl<K: Kernel> File<K> {
    /// Open an existing file.
    pub fn open(path: &CStr, flags: OpenFlags) -> Self {
        Self::open_native(path, flags, 0, 0)
    }

    /// Open a file, creating it with `rights` if it does not exist.
    pub fn create(path: &CStr, flags: OpenFlags, rights: Rights) -> Self {
        Self::open_native(path, flags, K::O_CREAT, rights.value())
    }

    fn open_native(path: &CStr, flags: OpenFlags, extra: u32, mode: u32) -> Self {
        let Some(native) = open_flags::<K>(flags) else {
            log::debug!("{}: open {:?} refused, no access mode in {:?}", K::NAME, path, flags);
            return File {
                handle: Handle::invalid(),
            };
        };
        let raw = K::open(path, native | extra, mode);
        let handle = Handle::from_result(raw);
        if handle.is_invalid() {
            log::debug!("{}: open {:?} failed ({})", K::NAME, path, -raw);
        }
        File { handle }
    }

    /// Take ownership of a raw descriptor.
    ///
    /// # Safety
    /// The caller must own `fd` and must not close it elsewhere.
    pub unsafe fn from_raw_fd(fd: RawFd) -> Self {
        File {
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

    /// Give up ownership without closing.
    pub fn into_raw_fd(self) -> RawFd {
        self.handle.into_raw()
    }

    /// Read into `buf`. Returns the number of bytes read, 0 at end of file.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        syscall_result(K::read(self.handle.get()?, buf))
    }

    /// Write `data`. Returns the number of bytes written.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        syscall_result(K::write(self.handle.get()?, data))
    }

    /// Move the cursor. Returns the new offset from the start of the file.
    pub fn seek(&self, offset: i64, method: Seek) -> Result<u64> {
        let fd = self.handle.get()?;
        syscall_result(K::lseek(fd, offset, seek_whence::<K>(method))).map(|off| off as u64)
    }

    /// [`File::seek`] with the origin given as its portable integer value.
    ///
    /// Values other than 0, 1 and 2 fail with `Unsupported` before the
    /// kernel is called.
    pub fn seek_raw(&self, offset: i64, method: u32) -> Result<u64> {
        let fd = self.handle.get()?;
        let whence = seek_whence_raw::<K>(method)?;
        syscall_result(K::lseek(fd, offset, whence)).map(|off| off as u64)
    }

    /// Metadata of the open file.
    pub fn metadata(&self) -> Result<FileStat> {
        let fd = self.handle.get()?;
        let mut st = FileStat::default();
        syscall_result(K::fstat(fd, &mut st))?;
        Ok(st)
    }

    /// Metadata of the file at `path`, following symlinks.
    pub fn metadata_of(path: &CStr) -> Result<FileStat> {
        let mut st = FileStat::default();
        syscall_result(K::stat(path, &mut st))?;
        Ok(st)
    }

    /// Size of the open file. An empty file is `Ok(0)`; a failed lookup is
    /// an error.
    pub fn size(&self) -> Result<u64> {
        self.metadata().map(|st| st.size)
    }

    /// Size of the file at `path`.
    pub fn size_of(path: &CStr) -> Result<u64> {
        Self::metadata_of(path).map(|st| st.size)
    }

    /// Does anything exist at `path`?
    pub fn exists(path: &CStr) -> bool {
        syscall_result(K::access(path, K::F_OK)).is_ok()
    }

    /// May the caller read `path`?
    pub fn is_readable(path: &CStr) -> bool {
        syscall_result(K::access(path, K::R_OK)).is_ok()
    }

    /// May the caller write `path`?
    pub fn is_writable(path: &CStr) -> bool {
        syscall_result(K::access(path, K::W_OK)).is_ok()
    }

    /// May the caller execute `path`?
    pub fn is_executable(path: &CStr) -> bool {
        syscall_result(K::access(path, K::X_OK)).is_ok()
    }

    /// Owner of the open file.
    pub fn owner(&self) -> Result<Owner> {
        self.metadata().map(|st| Owner::new(st.uid, st.gid))
    }

    /// Owner of the file at `path`.
    pub fn owner_of(path: &CStr) -> Result<Owner> {
        Self::metadata_of(path).map(|st| Owner::new(st.uid, st.gid))
    }

    /// Change the owner of the open file.
    pub fn change_owner(&self, owner: Owner) -> Result<()> {
        let fd = self.handle.get()?;
        syscall_result(K::fchown(fd, owner.user, owner.group)).map(drop)
    }

    /// Change the owner of the file at `path`.
    pub fn change_owner_of(path: &CStr, owner: Owner) -> Result<()> {
        syscall_result(K::chown(path, owner.user, owner.group)).map(drop)
    }

    /// Mode of the open file (type and permission bits).
    pub fn rights(&self) -> Result<Rights> {
        self.metadata().map(|st| Rights::new(st.mode))
    }

    /// Mode of the file at `path`.
    pub fn rights_of(path: &CStr) -> Result<Rights> {
        Self::metadata_of(path).map(|st| Rights::new(st.mode))
    }

    /// Change the permission bits of the open file.
    pub fn change_rights(&self, rights: Rights) -> Result<()> {
        let fd = self.handle.get()?;
        syscall_result(K::fchmod(fd, rights.value())).map(drop)
    }

    /// Change the permission bits of the file at `path`.
    pub fn change_rights_of(path: &CStr, rights: Rights) -> Result<()> {
        syscall_result(K::chmod(path, rights.value())).map(drop)
    }

    /// Map `size` bytes of the file starting at `offset`, shared with the
    /// file.
    ///
    /// `base` is a placement hint (null lets the kernel choose). On any
    /// failure, including an invalid handle, the result is an empty region.
    pub fn map(&self, base: *mut u8, protection: Protection, size: usize, offset: i64) -> Region<K> {
        match self.handle.get() {
            Ok(fd) => Region::shared(fd, base, protection, size, offset),
            Err(_) => Region::empty(),
        }
    }

    /// Remove the file at `path`.
    pub fn remove(path: &CStr) -> Result<()> {
        syscall_result(K::unlink(path)).map(drop)
    }
}

impl<K: Kernel> Close for File<K> {
    fn close(self) -> Result<()> {
        self.handle.close()
    }
}

impl<K: Kernel> fmt::Debug for File<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File").field("fd", &self.handle.raw()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::Abi;
    use crate::error::SysError;
    use crate::testing::{MockKernel, MockState};

    #[test]
    fn test_open_without_access_mode_skips_kernel() {
        MockState::reset();
        let file = File::<MockKernel>::open(c"/anything", OpenFlags::TRUNCATE);
        assert!(file.is_invalid());
        assert_eq!(MockState::with(|s| s.opens), 0);
    }

    #[test]
    fn test_operations_on_invalid_handle() {
        MockState::reset();
        MockState::with(|s| s.fail_open = true);
        let file = File::<MockKernel>::open(c"/missing", OpenFlags::READ);
        assert!(file.is_invalid());
        assert_eq!(MockState::with(|s| s.opens), 1);

        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf), Err(SysError::InvalidHandle));
        assert_eq!(file.write(b"x"), Err(SysError::InvalidHandle));
        assert_eq!(file.seek(0, Seek::End), Err(SysError::InvalidHandle));
        assert_eq!(file.size(), Err(SysError::InvalidHandle));
        assert_eq!(file.owner(), Err(SysError::InvalidHandle));
        assert_eq!(file.rights(), Err(SysError::InvalidHandle));
        assert_eq!(file.change_rights(Rights::new(0o600)), Err(SysError::InvalidHandle));
        assert_eq!(file.change_owner(Owner::new(0, 0)), Err(SysError::InvalidHandle));
        assert!(file.map(core::ptr::null_mut(), Protection::READ, 4096, 0).is_empty());
        assert_eq!(file.close(), Err(SysError::InvalidHandle));

        // Only the failed open reached the kernel.
        assert_eq!(MockState::with(|s| s.calls), 1);
    }

    #[test]
    fn test_seek_raw_rejects_unknown_origin() {
        MockState::reset();
        let file = File::<MockKernel>::open(c"/present", OpenFlags::READ);
        assert!(file.is_valid());
        let before = MockState::with(|s| s.calls);
        assert_eq!(file.seek_raw(0, 3), Err(SysError::Unsupported));
        assert_eq!(MockState::with(|s| s.calls), before);
        assert_eq!(file.close(), Ok(()));
    }

    #[test]
    fn test_create_passes_rights_and_nonblock() {
        MockState::reset();
        let file = File::<MockKernel>::create(
            c"/new",
            OpenFlags::WRITE | OpenFlags::TRUNCATE,
            Rights::new(0o600),
        );
        assert!(file.is_valid());
        let (flags, mode) = MockState::with(|s| s.last_open.unwrap());
        assert_eq!(flags & MockKernel::O_CREAT, MockKernel::O_CREAT);
        assert_eq!(flags & MockKernel::O_NONBLOCK, MockKernel::O_NONBLOCK);
        assert_eq!(flags & MockKernel::O_TRUNC, MockKernel::O_TRUNC);
        assert_eq!(mode, 0o600);
        assert_eq!(file.close(), Ok(()));
    }
}
