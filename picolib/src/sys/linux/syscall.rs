//! Linux syscall trampolines.
//!
//! Linux returns `-errno` in the result register on failure, which is
//! already the crate's encoding, so results pass through untouched.
//!
//! Calling conventions:
//! - **x86_64**: `syscall`, nr in `rax`, args in `rdi/rsi/rdx/r10/r8/r9`
//! - **aarch64**: `svc #0`, nr in `x8`, args in `x0-x5`
//! - **riscv64**: `ecall`, nr in `a7`, args in `a0-a5`
//!
//! Every entry point goes through one six-argument trampoline. The kernel
//! ignores argument registers a call does not use, so the narrower forms
//! pass zero there.

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "riscv64")))]
compile_error!("picolib's Linux backend supports x86_64, aarch64 and riscv64");

/// # Safety
/// `nr` must be a valid syscall number and the arguments must satisfy that
/// call's contract (live pointers with correct lengths).
#[inline(always)]
unsafe fn raw(nr: usize, a: [usize; 6]) -> isize {
    let ret: isize;

    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: upheld by the caller; `syscall` clobbers only rcx and r11.
        unsafe {
            core::arch::asm!(
                "syscall",
                inlateout("rax") nr as isize => ret,
                in("rdi") a[0],
                in("rsi") a[1],
                in("rdx") a[2],
                in("r10") a[3],
                in("r8") a[4],
                in("r9") a[5],
                lateout("rcx") _,
                lateout("r11") _,
                options(nostack),
            );
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: upheld by the caller; the result replaces x0 only.
        unsafe {
            core::arch::asm!(
                "svc #0",
                inlateout("x0") a[0] as isize => ret,
                in("x1") a[1],
                in("x2") a[2],
                in("x3") a[3],
                in("x4") a[4],
                in("x5") a[5],
                in("x8") nr,
                options(nostack),
            );
        }
    }

    #[cfg(target_arch = "riscv64")]
    {
        // SAFETY: upheld by the caller; the result replaces a0 only.
        unsafe {
            core::arch::asm!(
                "ecall",
                inlateout("a0") a[0] as isize => ret,
                in("a1") a[1],
                in("a2") a[2],
                in("a3") a[3],
                in("a4") a[4],
                in("a5") a[5],
                in("a7") nr,
                options(nostack),
            );
        }
    }

    ret
}

/// # Safety
/// See [`raw`].
#[inline(always)]
pub(super) unsafe fn syscall1(nr: usize, a1: usize) -> isize {
    // SAFETY: forwarded contract.
    unsafe { raw(nr, [a1, 0, 0, 0, 0, 0]) }
}

/// # Safety
/// See [`raw`].
#[inline(always)]
pub(super) unsafe fn syscall2(nr: usize, a1: usize, a2: usize) -> isize {
    // SAFETY: forwarded contract.
    unsafe { raw(nr, [a1, a2, 0, 0, 0, 0]) }
}

/// # Safety
/// See [`raw`].
#[inline(always)]
pub(super) unsafe fn syscall3(nr: usize, a1: usize, a2: usize, a3: usize) -> isize {
    // SAFETY: forwarded contract.
    unsafe { raw(nr, [a1, a2, a3, 0, 0, 0]) }
}

/// # Safety
/// See [`raw`].
#[inline(always)]
pub(super) unsafe fn syscall4(nr: usize, a1: usize, a2: usize, a3: usize, a4: usize) -> isize {
    // SAFETY: forwarded contract.
    unsafe { raw(nr, [a1, a2, a3, a4, 0, 0]) }
}

/// # Safety
/// See [`raw`].
#[inline(always)]
pub(super) unsafe fn syscall5(
    nr: usize,
    a1: usize,
    a2: usize,
    a3: usize,
    a4: usize,
    a5: usize,
) -> isize {
    // SAFETY: forwarded contract.
    unsafe { raw(nr, [a1, a2, a3, a4, a5, 0]) }
}

/// # Safety
/// See [`raw`].
#[inline(always)]
pub(super) unsafe fn syscall6(
    nr: usize,
    a1: usize,
    a2: usize,
    a3: usize,
    a4: usize,
    a5: usize,
    a6: usize,
) -> isize {
    // SAFETY: forwarded contract.
    unsafe { raw(nr, [a1, a2, a3, a4, a5, a6]) }
}
