//! Actuator safety envelope.
//!
//! Both actuators clamp at their own boundary rather than trusting the
//! caller: an RL agent or a teleop slider can send anything, and the only
//! thing that reaches the PWM chip is a pulse inside the configured range.
//!
//! ## Pipeline
//!
//! 1. [`Envelope::clamp`] the command into `[min, max]`.
//! 2. [`LinearMap::pulse`] maps the command onto `[pwm_min, pwm_max]` (ms).
//! 3. (throttle only) [`StallBand::remap`] swaps motor-damaging pulses for
//!    the stopped pulse.
//! 4. [`assert_pulse_in_range`] checks the result.  A failure there is a
//!    bug in steps 1–3, never a runtime condition.

use crate::config::StallBandConfig;

/// Closed command interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min: f64,
    pub max: f64,
}

impl Envelope {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the envelope.  NaN maps to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Linear command → pulse-length mapping.
///
/// `pulse = value * gradient + pwm_min - gradient * min_value`, with
/// `gradient = (pwm_max - pwm_min) / (max_value - min_value)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMap {
    pub command: Envelope,
    pub pulse: Envelope,
}

impl LinearMap {
    pub const fn new(command: Envelope, pulse: Envelope) -> Self {
        Self { command, pulse }
    }

    pub fn gradient(&self) -> f64 {
        (self.pulse.max - self.pulse.min) / (self.command.max - self.command.min)
    }

    /// Pulse length (ms) for an already-clamped command.
    pub fn pulse(&self, value: f64) -> f64 {
        let gradient = self.gradient();
        value * gradient + self.pulse.min - gradient * self.command.min
    }
}

/// Pulse widths the ESC cannot hold steadily.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StallBand {
    /// Exclusive lower edge (ms).
    pub min: f64,
    /// Exclusive upper edge (ms).
    pub max: f64,
    pub stopped: f64,
}

impl StallBand {
    pub fn contains(&self, pulse: f64) -> bool {
        self.min < pulse && pulse < self.max
    }

    /// Replace any pulse strictly inside the band with the stopped pulse.
    pub fn remap(&self, pulse: f64) -> f64 {
        if self.contains(pulse) { self.stopped } else { pulse }
    }
}

impl From<&StallBandConfig> for StallBand {
    fn from(c: &StallBandConfig) -> Self {
        Self {
            min: c.min_pulse,
            max: c.max_pulse,
            stopped: c.stopped_pulse,
        }
    }
}

/// Invariant check: `pulse` must lie inside the physical pulse range.
///
/// # Panics
///
/// Panics when the clamp logic upstream let an out-of-range pulse through.
pub fn assert_pulse_in_range(pulse: f64, range: &Envelope) {
    assert!(
        range.contains(pulse),
        "pulse {pulse} ms escaped the [{}, {}] ms envelope",
        range.min,
        range.max
    );
}
