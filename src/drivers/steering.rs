//! Steering servo actuator.
//!
//! Rotation is expressed on a normalized scale: `min_rotation` (full left)
//! → `default_rotation` (straight) → `max_rotation` (full right).  Every
//! command, absolute or relative, funnels through one update routine that
//! clamps, maps linearly onto the servo pulse range, checks the pulse
//! invariant, and writes the PWM channel.
//!
//! The stored rotation only changes after the PWM write succeeded, so a
//! hardware fault leaves the actuator describing what the servo is
//! actually doing.

use core::fmt;

use log::debug;

use crate::app::ports::PwmChip;
use crate::config::SteeringConfig;
use crate::drivers::pwm::PwmChannel;
use crate::error::Result;
use crate::safety::{Envelope, LinearMap, assert_pulse_in_range};

/// Default increment for [`Steering::turn_left`] / [`Steering::turn_right`].
pub const DEFAULT_TURN: f64 = 0.1;

pub struct Steering<C> {
    pwm: PwmChannel<C>,
    rotation: f64,
    default_rotation: f64,
    envelope: Envelope,
    map: LinearMap,
}

impl<C: PwmChip> Steering<C> {
    /// Take ownership of the PWM channel and centre the wheels.
    pub fn new(pwm: PwmChannel<C>, config: &SteeringConfig) -> Result<Self> {
        let envelope = Envelope::new(config.min_rotation, config.max_rotation);
        let mut steering = Self {
            pwm,
            rotation: config.default_rotation,
            default_rotation: config.default_rotation,
            envelope,
            map: LinearMap::new(
                envelope,
                Envelope::new(config.pwm_min_pulse, config.pwm_max_pulse),
            ),
        };
        steering.reset()?;
        Ok(steering)
    }

    /// Turn left (negative) by `amount`.  Returns the new rotation.
    pub fn turn_left(&mut self, amount: f64) -> Result<f64> {
        self.update_rotation(-amount)
    }

    /// Turn right (positive) by `amount`.  Returns the new rotation.
    pub fn turn_right(&mut self, amount: f64) -> Result<f64> {
        self.update_rotation(amount)
    }

    /// Shift the rotation by `delta`.  Returns the new (clamped) rotation.
    pub fn update_rotation(&mut self, delta: f64) -> Result<f64> {
        self.apply(self.rotation + delta)
    }

    /// Set an absolute rotation.  Returns the new (clamped) rotation.
    pub fn set_rotation(&mut self, rotation: f64) -> Result<f64> {
        self.apply(rotation)
    }

    /// Return to the default rotation (straight ahead).
    pub fn reset(&mut self) -> Result<()> {
        self.apply(self.default_rotation).map(|_| ())
    }

    pub fn get_rotation(&self) -> f64 {
        self.rotation
    }

    /// Pulse length (ms) currently on the servo line.
    pub fn get_pulse_length(&self) -> f64 {
        self.pwm.get_pulse_length()
    }

    pub fn pwm(&self) -> &PwmChannel<C> {
        &self.pwm
    }

    pub fn pwm_mut(&mut self) -> &mut PwmChannel<C> {
        &mut self.pwm
    }

    fn apply(&mut self, target: f64) -> Result<f64> {
        let rotation = self.envelope.clamp(target);
        let pulse = self.map.pulse(rotation);
        assert_pulse_in_range(pulse, &self.map.pulse);
        debug!("{self}: changing steering to {rotation:.3}");
        self.pwm.set_pulse_length(pulse)?;
        self.rotation = rotation;
        Ok(rotation)
    }
}

impl<C> fmt::Display for Steering<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Steering ({})", self.pwm.channel())
    }
}
