//! Clock Reads
//!
//! Wall-clock time comes from `std::time::Instant` (monotonic). Alongside it
//! the stopwatch samples the CPU tick counter (RDTSCP on x86_64, CNTVCT_EL0 on
//! AArch64) so a measurement can also report raw cycles.

use std::time::Duration;

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_cycles() -> u64 {
    // SAFETY: RDTSCP is present on every x86_64 CPU shipped since ~2006 and
    // only reads the timestamp counter.
    unsafe {
        let mut _aux: u32 = 0;
        std::arch::x86_64::__rdtscp(&mut _aux)
    }
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
fn read_cycles() -> u64 {
    let cnt: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on all AArch64 implementations.
    unsafe {
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt, options(nostack, nomem));
    }
    cnt
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
fn read_cycles() -> u64 {
    0
}

/// Whether cycle deltas are meaningful on this platform.
/// When `false`, [`Stopwatch::stop`] always reports 0 cycles.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

/// Elapsed time and cycle delta for one bracketed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lap {
    /// Wall-clock time between the two clock reads
    pub elapsed: Duration,
    /// CPU ticks between the two counter reads (0 without a counter)
    pub cycles: u64,
}

impl Lap {
    /// Elapsed time in milliseconds: `(t_end - t_start) * 1000`.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Brackets a single call with clock reads.
///
/// The counter is read first on start and last on stop, so the wall-clock
/// reads sit as close to the measured call as possible.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: std::time::Instant,
    cycles_start: u64,
}

impl Stopwatch {
    /// Start the stopwatch
    #[inline(always)]
    pub fn start() -> Self {
        let cycles_start = read_cycles();
        Self {
            start: std::time::Instant::now(),
            cycles_start,
        }
    }

    /// Stop the stopwatch
    #[inline(always)]
    pub fn stop(&self) -> Lap {
        let elapsed = self.start.elapsed();
        let cycles = read_cycles().saturating_sub(self.cycles_start);
        Lap { elapsed, cycles }
    }
}

/// Pin the current thread to one core.
///
/// Keeps the runner from migrating between cores mid-measurement, which also
/// keeps TSC readings comparable.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    // SAFETY: cpu_set_t is plain data; zeroed is a valid empty set and the
    // CPU_* helpers only touch the set we own.
    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// Pin the current thread to one core (no-op off Linux).
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Ok(())
}
