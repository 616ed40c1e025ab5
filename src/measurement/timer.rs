//! Platform-specific high-resolution counter reads.
//!
//! - x86_64: `lfence; rdtsc`
//! - aarch64: `isb; mrs cntvct_el0`
//! - Fallback: nanoseconds since first use via `std::time::Instant`

use std::sync::OnceLock;
use std::time::Instant;

/// Read the CPU cycle counter with appropriate serialization.
#[inline]
pub fn read_counter() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        read_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        read_aarch64()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        read_fallback()
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn read_x86_64() -> u64 {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let cycles: u64;
    unsafe {
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "shl rdx, 32",
            "or rax, rdx",
            out("rax") cycles,
            out("rdx") _,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    cycles
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn read_aarch64() -> u64 {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let cycles: u64;
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cycles,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    cycles
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline]
fn read_fallback() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();

    let start = START.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

/// Counter frequency in Hz, calibrated once against `Instant`.
///
/// Takes the median of several short sleeps. Returns 1 GHz on platforms
/// where the counter already ticks in nanoseconds.
pub fn counter_frequency_hz() -> u64 {
    static FREQ: OnceLock<u64> = OnceLock::new();

    *FREQ.get_or_init(|| {
        let freq = calibrate();
        tracing::info!(
            "cycle counter calibrated to {:.2} MHz",
            freq as f64 / 1_000_000.0
        );
        freq
    })
}

fn calibrate() -> u64 {
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        1_000_000_000
    }

    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    {
        const SAMPLES: usize = 5;
        const SLEEP: std::time::Duration = std::time::Duration::from_millis(2);

        let mut frequencies = Vec::with_capacity(SAMPLES);
        for _ in 0..SAMPLES {
            let start_cnt = read_counter();
            let start_instant = Instant::now();

            std::thread::sleep(SLEEP);

            let end_cnt = read_counter();
            let elapsed_ns = start_instant.elapsed().as_nanos() as u64;
            if elapsed_ns == 0 {
                continue;
            }

            let delta = end_cnt.wrapping_sub(start_cnt);
            frequencies.push(((delta as u128 * 1_000_000_000) / elapsed_ns as u128) as u64);
        }

        if frequencies.is_empty() {
            tracing::warn!("cycle counter calibration failed, assuming 1 GHz");
            return 1_000_000_000;
        }

        frequencies.sort_unstable();
        frequencies[frequencies.len() / 2].max(1)
    }
}

/// Prevent the compiler from optimizing away a value.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std::hint::black_box(x)
}
