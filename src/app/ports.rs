//! Port traits: the capability boundary between control logic and hardware.
//!
//! ```text
//!   Adapter (sysfs / PCA9685 / mock / sim) ──▶ Port trait ──▶ driver / sensor
//! ```
//!
//! Every actuator and sensor is generic over these traits, so the same
//! control code runs against the Jetson's real pins, the mock driver set
//! used in development, or a simulation harness.  Which implementation is
//! used is decided once, at construction.
//!
//! ## Ownership
//!
//! Each pin, PWM chip handle and ranger has exactly one owner.  Nothing
//! here arbitrates shared access; a caller that needs to share one across
//! threads wraps it in its own mutex.

use crate::app::events::CarEvent;
use crate::app::state::Frame;
use crate::error::Result;

// ───────────────────────────────────────────────────────────────
// GPIO pin
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_sysfs(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// One digital pin with an explicit export lifecycle.
///
/// `Unexported → enable() → Exported → disable() → Unexported`.  The real
/// driver rejects `set_direction` / `set_value` / `get_value` while
/// unexported; the mock accepts everything.
pub trait GpioPin {
    /// Identity used in logs and faults, e.g. `gpio187 (J21-37)`.
    fn name(&self) -> &str;

    fn enable(&mut self) -> Result<()>;

    fn disable(&mut self) -> Result<()>;

    fn is_enabled(&self) -> bool;

    fn set_direction(&mut self, direction: Direction) -> Result<()>;

    fn set_value(&mut self, high: bool) -> Result<()>;

    fn get_value(&mut self) -> Result<bool>;

    fn low(&mut self) -> Result<()> {
        self.set_value(false)
    }

    fn high(&mut self) -> Result<()> {
        self.set_value(true)
    }
}

impl<T: GpioPin + ?Sized> GpioPin for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn enable(&mut self) -> Result<()> {
        (**self).enable()
    }
    fn disable(&mut self) -> Result<()> {
        (**self).disable()
    }
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        (**self).set_direction(direction)
    }
    fn set_value(&mut self, high: bool) -> Result<()> {
        (**self).set_value(high)
    }
    fn get_value(&mut self) -> Result<bool> {
        (**self).get_value()
    }
}

// ───────────────────────────────────────────────────────────────
// PWM chip
// ───────────────────────────────────────────────────────────────

/// A multi-channel PWM controller addressed in raw counter ticks.
pub trait PwmChip {
    /// Identity used in logs and faults, e.g. `pca9685@0x40/bus0`.
    fn name(&self) -> &str;

    fn set_pwm_freq(&mut self, frequency_hz: u32) -> Result<()>;

    /// Drive `channel` high at tick `on` and low at tick `off`.
    fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<()>;
}

impl<T: PwmChip + ?Sized> PwmChip for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn set_pwm_freq(&mut self, frequency_hz: u32) -> Result<()> {
        (**self).set_pwm_freq(frequency_hz)
    }
    fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<()> {
        (**self).set_pwm(channel, on, off)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus blocking sleep.
///
/// The ranger's polling loop and the throttle's reverse ramp only ever
/// suspend through this trait, so tests can substitute a clock that
/// advances exactly by the requested sleep.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&mut self) -> u64;

    fn sleep_us(&mut self, us: u32);

    fn sleep_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.sleep_us(1_000);
        }
    }
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now_us(&mut self) -> u64 {
        (**self).now_us()
    }
    fn sleep_us(&mut self, us: u32) {
        (**self).sleep_us(us);
    }
    fn sleep_ms(&mut self, ms: u32) {
        (**self).sleep_ms(ms);
    }
}

// ───────────────────────────────────────────────────────────────
// Range finder
// ───────────────────────────────────────────────────────────────

/// Anything that produces one raw distance per call.
///
/// Implemented by the ultrasonic ranger; a simulation provides its own
/// implementation with the same contract.
pub trait RangeFinder {
    /// One raw reading in the finder's output unit.  "Nothing in range"
    /// is `max_range()`, not an error.
    fn measure(&mut self) -> Result<f64>;

    /// Largest distance this finder reports, in its output unit.
    fn max_range(&self) -> f64;

    /// Release any owned pins.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: RangeFinder + ?Sized> RangeFinder for Box<T> {
    fn measure(&mut self) -> Result<f64> {
        (**self).measure()
    }
    fn max_range(&self) -> f64 {
        (**self).max_range()
    }
    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

// ───────────────────────────────────────────────────────────────
// Camera (external collaborator)
// ───────────────────────────────────────────────────────────────

/// Source of raw camera frames.  The vision pipeline lives elsewhere; the
/// car only needs one frame per snapshot.
pub trait FrameSource {
    fn get_frame(&mut self) -> Result<Frame>;
}

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// The car emits structured [`CarEvent`]s through this port.  Adapters
/// decide where they go (log output, a web socket, a training recorder).
pub trait EventSink {
    fn emit(&mut self, event: &CarEvent);
}
