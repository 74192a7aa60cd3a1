//! Scripted kernel for unit tests.
//!
//! `MockKernel` records what it is asked to do in a thread-local
//! [`MockState`] and answers `getdents` from a script, so the enumeration
//! protocol can be driven through errors and corrupt records. Memory
//! mapping is forwarded to the native backend (and counted) because the
//! listing buffer has to be real memory.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::CStr;

use crate::abi::{Abi, DirentLayout, FileStat, Kernel};
use crate::handle::RawFd;
use crate::sys::linux::Linux;
use crate::sys::Native;

/// One scripted answer to `getdents`.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Data(Vec<u8>),
    Eof,
    Error(i32),
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    /// Calls that reached the kernel, excluding mmap/munmap.
    pub calls: usize,
    pub opens: usize,
    pub fail_open: bool,
    pub last_open: Option<(u32, u32)>,
    pub next_fd: RawFd,
    pub closed: Vec<RawFd>,
    pub maps: usize,
    pub unmaps: usize,
    pub protects: usize,
    pub script: VecDeque<Step>,
    /// Buffer length offered to each `getdents` call.
    pub offered: Vec<usize>,
}

thread_local! {
    static STATE: RefCell<MockState> = RefCell::new(MockState::default());
}

impl MockState {
    pub(crate) fn reset() {
        STATE.with(|s| {
            *s.borrow_mut() = MockState {
                next_fd: 3,
                ..MockState::default()
            }
        });
    }

    pub(crate) fn with<R>(f: impl FnOnce(&mut MockState) -> R) -> R {
        STATE.with(|s| f(&mut s.borrow_mut()))
    }

    pub(crate) fn script(steps: Vec<Step>) {
        Self::with(|s| s.script = steps.into());
    }

    fn call() {
        Self::with(|s| s.calls += 1);
    }
}

pub(crate) struct MockKernel;

impl Abi for MockKernel {
    const NAME: &'static str = "mock";

    const O_RDONLY: u32 = Linux::O_RDONLY;
    const O_WRONLY: u32 = Linux::O_WRONLY;
    const O_RDWR: u32 = Linux::O_RDWR;
    const O_APPEND: u32 = Linux::O_APPEND;
    const O_TRUNC: u32 = Linux::O_TRUNC;
    const O_NONBLOCK: u32 = Linux::O_NONBLOCK;
    const O_CREAT: u32 = Linux::O_CREAT;
    const O_DIRECTORY: u32 = Linux::O_DIRECTORY;
    const O_CLOEXEC: u32 = Linux::O_CLOEXEC;

    const SEEK_SET: u32 = 0;
    const SEEK_CUR: u32 = 1;
    const SEEK_END: u32 = 2;

    const F_OK: u32 = 0;
    const R_OK: u32 = 4;
    const W_OK: u32 = 2;
    const X_OK: u32 = 1;

    const PROT_NONE: u32 = Native::PROT_NONE;
    const PROT_READ: u32 = Native::PROT_READ;
    const PROT_WRITE: u32 = Native::PROT_WRITE;
    const PROT_EXEC: u32 = Native::PROT_EXEC;

    const MAP_SHARED: u32 = Native::MAP_SHARED;
    const MAP_PRIVATE: u32 = Native::MAP_PRIVATE;
    const MAP_ANONYMOUS: u32 = Native::MAP_ANONYMOUS;

    const DIRENT: DirentLayout = Linux::DIRENT;
}

impl Kernel for MockKernel {
    fn open(_path: &CStr, flags: u32, mode: u32) -> isize {
        MockState::with(|s| {
            s.calls += 1;
            s.opens += 1;
            s.last_open = Some((flags, mode));
            if s.fail_open {
                -2
            } else {
                let fd = s.next_fd;
                s.next_fd += 1;
                fd as isize
            }
        })
    }

    fn close(fd: RawFd) -> isize {
        MockState::with(|s| {
            s.calls += 1;
            s.closed.push(fd);
        });
        0
    }

    fn read(_fd: RawFd, _buf: &mut [u8]) -> isize {
        MockState::call();
        0
    }

    fn write(_fd: RawFd, buf: &[u8]) -> isize {
        MockState::call();
        buf.len() as isize
    }

    fn lseek(_fd: RawFd, offset: i64, _whence: u32) -> isize {
        MockState::call();
        offset as isize
    }

    fn stat(_path: &CStr, _st: &mut FileStat) -> isize {
        MockState::call();
        0
    }

    fn fstat(_fd: RawFd, _st: &mut FileStat) -> isize {
        MockState::call();
        0
    }

    fn access(_path: &CStr, _mode: u32) -> isize {
        MockState::call();
        0
    }

    fn chown(_path: &CStr, _uid: u32, _gid: u32) -> isize {
        MockState::call();
        0
    }

    fn fchown(_fd: RawFd, _uid: u32, _gid: u32) -> isize {
        MockState::call();
        0
    }

    fn chmod(_path: &CStr, _mode: u32) -> isize {
        MockState::call();
        0
    }

    fn fchmod(_fd: RawFd, _mode: u32) -> isize {
        MockState::call();
        0
    }

    fn unlink(_path: &CStr) -> isize {
        MockState::call();
        0
    }

    fn mkdir(_path: &CStr, _mode: u32) -> isize {
        MockState::call();
        0
    }

    fn rmdir(_path: &CStr) -> isize {
        MockState::call();
        0
    }

    fn chdir(_path: &CStr) -> isize {
        MockState::call();
        0
    }

    fn fchdir(_fd: RawFd) -> isize {
        MockState::call();
        0
    }

    fn chroot(_path: &CStr) -> isize {
        MockState::call();
        0
    }

    fn getcwd(buf: &mut [u8]) -> isize {
        MockState::call();
        if buf.len() < 2 {
            return -34;
        }
        buf[0] = b'/';
        buf[1] = 0;
        1
    }

    fn getdents(_fd: RawFd, buf: &mut [u8]) -> isize {
        MockState::with(|s| {
            s.calls += 1;
            s.offered.push(buf.len());
            match s.script.pop_front() {
                Some(Step::Data(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    bytes.len() as isize
                }
                Some(Step::Error(code)) => -(code as isize),
                Some(Step::Eof) | None => 0,
            }
        })
    }

    unsafe fn mmap(
        addr: *mut u8,
        len: usize,
        prot: u32,
        flags: u32,
        fd: RawFd,
        offset: i64,
    ) -> isize {
        MockState::with(|s| s.maps += 1);
        // SAFETY: forwarded unchanged; the caller upholds `Kernel::mmap`.
        unsafe { Native::mmap(addr, len, prot, flags, fd, offset) }
    }

    unsafe fn munmap(addr: *mut u8, len: usize) -> isize {
        MockState::with(|s| s.unmaps += 1);
        // SAFETY: forwarded unchanged; the caller upholds `Kernel::munmap`.
        unsafe { Native::munmap(addr, len) }
    }

    unsafe fn mprotect(addr: *mut u8, len: usize, prot: u32) -> isize {
        MockState::with(|s| s.protects += 1);
        // SAFETY: forwarded unchanged; the caller upholds `Kernel::mprotect`.
        unsafe { Native::mprotect(addr, len, prot) }
    }
}
