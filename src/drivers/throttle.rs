//! Drive motor throttle (ESC) actuator.
//!
//! Same linear command → pulse mapping as steering, with three extra
//! policies:
//!
//! 1. **Asymmetric envelope**: commands are clamped to
//!    `[backward_max, forward_max]`, tighter than the mapping range.
//! 2. **Stall-band remap**: pulses strictly inside the stall band are
//!    replaced by the stopped pulse before they reach the chip.
//! 3. **Reverse engagement**: the ESC ignores a reverse command unless it
//!    first sees the motor pass through zero.  Going from a non-negative
//!    throttle to one at or below the reverse trigger runs the scripted
//!    ramp `0 → floor → 0 → target`, one PWM write per step with a fixed
//!    delay in between.
//!
//! The ramp blocks the calling thread for its whole duration
//! (3 × `step_delay_ms`).  Concurrent throttle commands during the ramp
//! must be serialized by the caller.

use core::fmt;

use log::{debug, info};

use crate::app::ports::{Clock, PwmChip};
use crate::config::{ReverseConfig, ThrottleConfig};
use crate::drivers::pwm::PwmChannel;
use crate::error::Result;
use crate::safety::{Envelope, LinearMap, StallBand, assert_pulse_in_range};

/// Default increment for [`Throttle::accelerate`] / [`Throttle::decelerate`].
pub const DEFAULT_STEP: f64 = 0.1;

pub struct Throttle<C, K> {
    pwm: PwmChannel<C>,
    clock: K,
    throttle: f64,
    default_throttle: f64,
    envelope: Envelope,
    map: LinearMap,
    stall: StallBand,
    reverse: ReverseConfig,
    in_reverse_transition: bool,
}

impl<C: PwmChip, K: Clock> Throttle<C, K> {
    /// Take ownership of the PWM channel and send the default (stopped)
    /// throttle.
    pub fn new(pwm: PwmChannel<C>, clock: K, config: &ThrottleConfig) -> Result<Self> {
        let mut throttle = Self {
            pwm,
            clock,
            throttle: config.default_throttle,
            default_throttle: config.default_throttle,
            envelope: Envelope::new(config.backward_max, config.forward_max),
            map: LinearMap::new(
                Envelope::new(config.min_throttle, config.max_throttle),
                Envelope::new(config.pwm_min_pulse, config.pwm_max_pulse),
            ),
            stall: StallBand::from(&config.stall),
            reverse: config.reverse.clone(),
            in_reverse_transition: false,
        };
        throttle.apply(config.default_throttle)?;
        Ok(throttle)
    }

    /// Set an absolute throttle.  Returns the new (clamped) throttle.
    ///
    /// Runs the reverse-engagement ramp when moving from a non-negative
    /// throttle to one at or below the reverse trigger.
    pub fn set_throttle(&mut self, throttle: f64) -> Result<f64> {
        let target = self.envelope.clamp(throttle);
        if self.throttle >= 0.0 && target <= self.reverse.trigger {
            self.engage_reverse(target)
        } else {
            self.apply(target)
        }
    }

    /// Shift the throttle by `delta`.
    pub fn update_throttle(&mut self, delta: f64) -> Result<f64> {
        self.set_throttle(self.throttle + delta)
    }

    pub fn accelerate(&mut self, amount: f64) -> Result<f64> {
        self.update_throttle(amount)
    }

    pub fn decelerate(&mut self, amount: f64) -> Result<f64> {
        self.update_throttle(-amount)
    }

    /// Return to the default throttle.
    pub fn reset(&mut self) -> Result<()> {
        self.set_throttle(self.default_throttle).map(|_| ())
    }

    pub fn get_throttle(&self) -> f64 {
        self.throttle
    }

    /// Pulse length (ms) currently on the ESC line.
    pub fn get_pulse_length(&self) -> f64 {
        self.pwm.get_pulse_length()
    }

    /// True only while the engagement ramp is executing.
    pub fn in_reverse_transition(&self) -> bool {
        self.in_reverse_transition
    }

    /// Pulse (ms) that `throttle` would produce: clamp, map, stall remap.
    pub fn pulse_for(&self, throttle: f64) -> f64 {
        self.stall.remap(self.map.pulse(self.envelope.clamp(throttle)))
    }

    pub fn pwm(&self) -> &PwmChannel<C> {
        &self.pwm
    }

    pub fn pwm_mut(&mut self) -> &mut PwmChannel<C> {
        &mut self.pwm
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    fn engage_reverse(&mut self, target: f64) -> Result<f64> {
        info!(
            "{self}: reverse engagement {:.3} -> {:.3}",
            self.throttle, target
        );
        self.in_reverse_transition = true;
        let steps = [0.0, self.reverse.floor, 0.0, target];
        let mut result = Ok(self.throttle);
        for (i, step) in steps.into_iter().enumerate() {
            if i > 0 {
                self.clock.sleep_ms(self.reverse.step_delay_ms);
            }
            result = self.apply(step);
            if result.is_err() {
                break;
            }
        }
        self.in_reverse_transition = false;
        result
    }

    fn apply(&mut self, target: f64) -> Result<f64> {
        let throttle = self.envelope.clamp(target);
        let pulse = self.stall.remap(self.map.pulse(throttle));
        assert_pulse_in_range(pulse, &self.map.pulse);
        debug!("{self}: changing throttle to {throttle:.3}");
        self.pwm.set_pulse_length(pulse)?;
        self.throttle = throttle;
        Ok(throttle)
    }
}

impl<C, K> fmt::Display for Throttle<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Throttle ({})", self.pwm.channel())
    }
}
