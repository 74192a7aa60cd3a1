//! XNU syscall trampoline.
//!
//! Like the BSDs, XNU reports failure through the carry flag with a positive
//! errno in the result register; this folds it into `-errno`.
//!
//! - **x86_64**: `syscall`, BSD class bit `0x2000000` or'ed into `rax`
//! - **arm64**: `svc #0x80`, nr in `x16`, args in `x0-x5`; `x1` is clobbered

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("picolib's Darwin backend supports x86_64 and arm64");

#[cfg(target_arch = "x86_64")]
const SYSCALL_CLASS_UNIX: usize = 2 << 24;

/// # Safety
/// `nr` must be a valid BSD syscall number and the arguments must satisfy
/// that call's contract. Unused trailing arguments should be zero.
#[inline(always)]
pub(super) unsafe fn syscall(nr: usize, a: [usize; 6]) -> isize {
    let ret: isize;
    let failed: u8;

    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: upheld by the caller; every register the kernel may
        // change is declared as an output.
        unsafe {
            core::arch::asm!(
                "syscall",
                "setc {failed}",
                failed = out(reg_byte) failed,
                inlateout("rax") (SYSCALL_CLASS_UNIX | nr) as isize => ret,
                in("rdi") a[0],
                in("rsi") a[1],
                inlateout("rdx") a[2] => _,
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
        let flag: u64;
        // SAFETY: upheld by the caller; every register the kernel may
        // change is declared as an output.
        unsafe {
            core::arch::asm!(
                "svc #0x80",
                "cset {flag}, cs",
                flag = out(reg) flag,
                inlateout("x0") a[0] as isize => ret,
                inlateout("x1") a[1] => _,
                in("x2") a[2],
                in("x3") a[3],
                in("x4") a[4],
                in("x5") a[5],
                in("x16") nr,
                options(nostack),
            );
        }
        failed = flag as u8;
    }

    if failed != 0 {
        -ret
    } else {
        ret
    }
}
