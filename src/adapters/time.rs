//! Clock adapters.
//!
//! - [`SystemClock`]: `std::time::Instant` + `thread::sleep`, used on the
//!   car and in development mode.
//! - [`SimClock`]: deterministic; time only moves when somebody sleeps.
//!   Clones share one timeline, so a test can keep a handle on the clock
//!   it gave away.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

/// Wall clock for the real car.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Microseconds since construction (monotonic).
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Clock for SystemClock {
    fn now_us(&mut self) -> u64 {
        self.uptime_us()
    }

    fn sleep_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }

    fn sleep_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

impl DelayNs for SystemClock {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Simulated clock.  `sleep_*` advances time instantly by exactly the
/// requested amount.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_us: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total simulated time so far (µs).
    pub fn elapsed_us(&self) -> u64 {
        self.now_us.load(Ordering::Relaxed)
    }

    pub fn advance_us(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::Relaxed);
    }
}

impl Clock for SimClock {
    fn now_us(&mut self) -> u64 {
        self.elapsed_us()
    }

    fn sleep_us(&mut self, us: u32) {
        self.advance_us(u64::from(us));
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.advance_us(u64::from(ms) * 1_000);
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance_us(u64::from(ns).div_ceil(1_000));
    }
}
