//! Resource handles.
//!
//! A [`Handle`] owns exactly one kernel descriptor or holds the
//! [`INVALID_HANDLE`] sentinel. It is never closed implicitly: the owner
//! calls [`Close::close`], or wraps it in a [`Scoped`] guard that closes on
//! drop. Files, directories and the peer socket/IPC types all build on this
//! shape.

use core::{
    fmt,
    marker::PhantomData,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
};

use crate::abi::Kernel;
use crate::error::{is_error, syscall_result, Result, SysError};

/// A raw kernel descriptor.
pub type RawFd = i32;

/// Descriptor value meaning "no live descriptor".
///
/// Kernels only hand out non-negative descriptors.
pub const INVALID_HANDLE: RawFd = -1;

/// Owner of one native descriptor.
pub struct Handle<K: Kernel> {
    fd: RawFd,
    _kernel: PhantomData<K>,
}

impl<K: Kernel> Handle<K> {
    /// A handle holding the sentinel.
    pub const fn invalid() -> Self {
        Handle {
            fd: INVALID_HANDLE,
            _kernel: PhantomData,
        }
    }

    /// Classify the raw result of a descriptor-producing syscall.
    ///
    /// A failed call yields the sentinel, never the error value.
    pub fn from_result(raw: isize) -> Self {
        if is_error(raw) || raw > RawFd::MAX as isize {
            Self::invalid()
        } else {
            Handle {
                fd: raw as RawFd,
                _kernel: PhantomData,
            }
        }
    }

    /// Take ownership of a raw descriptor.
    ///
    /// Negative values are normalised to the sentinel.
    ///
    /// # Safety
    /// The caller must own `fd` and must not close it elsewhere.
    pub unsafe fn from_raw(fd: RawFd) -> Self {
        if fd < 0 {
            Self::invalid()
        } else {
            Handle {
                fd,
                _kernel: PhantomData,
            }
        }
    }

    /// Is there a live descriptor behind this handle?
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.fd != INVALID_HANDLE
    }

    /// Does this handle hold the sentinel?
    #[inline]
    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// The raw descriptor, or the sentinel.
    #[inline]
    pub fn raw(&self) -> RawFd {
        self.fd
    }

    /// The raw descriptor, or `Err(InvalidHandle)` for the sentinel.
    #[inline]
    pub fn get(&self) -> Result<RawFd> {
        if self.is_valid() {
            Ok(self.fd)
        } else {
            Err(SysError::InvalidHandle)
        }
    }

    /// Give up ownership without closing.
    pub fn into_raw(self) -> RawFd {
        self.fd
    }
}

impl<K: Kernel> Close for Handle<K> {
    fn close(self) -> Result<()> {
        let fd = self.get()?;
        syscall_result(K::close(fd)).map(drop)
    }
}

impl<K: Kernel> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("fd", &self.fd)
            .field("kernel", &K::NAME)
            .finish()
    }
}

/// A resource released by an explicit call.
pub trait Close: Sized {
    /// Release the resource. Consuming `self` makes a second close impossible.
    fn close(self) -> Result<()>;

    /// Hand the resource to a guard that closes it when dropped.
    fn scoped(self) -> Scoped<Self> {
        Scoped::new(self)
    }
}

/// Closes the wrapped resource on drop.
///
/// Dereferences to the resource. [`Scoped::into_inner`] hands ownership back
/// without closing.
pub struct Scoped<H: Close> {
    inner: ManuallyDrop<H>,
}

impl<H: Close> Scoped<H> {
    /// Guard `resource`.
    pub fn new(resource: H) -> Self {
        Scoped {
            inner: ManuallyDrop::new(resource),
        }
    }

    /// Release the guard without closing the resource.
    pub fn into_inner(self) -> H {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so `inner` is moved out exactly once
        // and the guard's own Drop never sees it.
        unsafe { ManuallyDrop::take(&mut this.inner) }
    }
}

impl<H: Close> Deref for Scoped<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.inner
    }
}

impl<H: Close> DerefMut for Scoped<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.inner
    }
}

impl<H: Close> Drop for Scoped<H> {
    fn drop(&mut self) {
        // SAFETY: drop runs once and `inner` is not touched afterwards.
        let resource = unsafe { ManuallyDrop::take(&mut self.inner) };
        if let Err(err) = resource.close() {
            log::debug!("scoped close failed: {}", err);
        }
    }
}
