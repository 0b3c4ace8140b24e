//! PWM channel: pulse length (ms) → controller counter ticks.
//!
//! The channel does no clamping of its own.  Callers (the actuators) are
//! responsible for handing it a pulse inside the physical envelope; a pulse
//! the controller cannot even represent is a programming error and panics.

use log::{debug, error};

use crate::app::ports::PwmChip;
use crate::config::PwmConfig;
use crate::error::Result;

/// One output of a PWM controller, exclusively owned by one actuator.
pub struct PwmChannel<C> {
    chip: C,
    channel: u8,
    frequency_hz: u32,
    resolution: u32,
    pulse_length_ms: f64,
}

impl<C: PwmChip> PwmChannel<C> {
    /// Take ownership of `chip` and program its output frequency.
    pub fn new(mut chip: C, channel: u8, config: &PwmConfig) -> Result<Self> {
        chip.set_pwm_freq(config.frequency_hz)?;
        Ok(Self {
            chip,
            channel,
            frequency_hz: config.frequency_hz,
            resolution: config.resolution,
            pulse_length_ms: 0.0,
        })
    }

    /// Write one pulse length to the controller.
    ///
    /// The stored pulse length only changes once the chip write succeeded.
    ///
    /// # Panics
    ///
    /// Panics if `length_ms` is outside `[0, period]`.
    pub fn set_pulse_length(&mut self, length_ms: f64) -> Result<()> {
        assert!(
            (0.0..=self.period_ms()).contains(&length_ms),
            "pulse {length_ms} ms outside the {} ms PWM period",
            self.period_ms()
        );
        let bits = self.pulse_bits(length_ms);
        debug!(
            "{}: channel {} pulse {:.4} ms = {}/{} ticks",
            self.chip.name(),
            self.channel,
            length_ms,
            bits,
            self.resolution
        );
        let channel = self.channel;
        let chip = &mut self.chip;
        chip.set_pwm(channel, 0, bits).inspect_err(|e| {
            error!("{}: channel {channel} write failed: {e}", chip.name());
        })?;
        self.pulse_length_ms = length_ms;
        Ok(())
    }
}

impl<C> PwmChannel<C> {
    /// Length of one period (ms).
    pub fn period_ms(&self) -> f64 {
        1000.0 / f64::from(self.frequency_hz)
    }

    /// Counter ticks for `length_ms`, rounded toward zero.
    pub fn pulse_bits(&self, length_ms: f64) -> u16 {
        (f64::from(self.resolution) * length_ms / self.period_ms()).trunc() as u16
    }

    /// Last pulse length successfully written (ms).
    pub fn get_pulse_length(&self) -> f64 {
        self.pulse_length_ms
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn chip(&self) -> &C {
        &self.chip
    }

    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }
}
