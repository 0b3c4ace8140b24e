//! Car configuration parameters
//!
//! All tunable parameters for the actuator/sensor layer, one struct per
//! physical device.  Defaults match the STAR car as built; any field can be
//! overridden from a JSON document.  Configuration is fixed at
//! construction: nothing in the control path mutates it.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, Error};
use crate::pins::{PinRef, Port};
use crate::sensors::ranger::{DistanceUnit, EchoMode};
use crate::sensors::sonar::MAX_SAMPLE_SIZE;

/// Top-level configuration for one car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarConfig {
    /// Build the mock driver set instead of sysfs GPIO + PCA9685.
    pub development: bool,
    pub pwm: PwmConfig,
    pub steering: SteeringConfig,
    pub throttle: ThrottleConfig,
    /// A partial sonar section is laid over that sonar's own defaults, so
    /// `{"rear_sonar": {"sample_size": 3}}` keeps the rear pins.
    #[serde(deserialize_with = "front_sonar_overlay")]
    pub front_sonar: SonarConfig,
    #[serde(deserialize_with = "rear_sonar_overlay")]
    pub rear_sonar: SonarConfig,
}

/// PCA9685 controller settings shared by every PWM channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PwmConfig {
    /// Output frequency (Hz).  100 Hz → 10 ms period.
    pub frequency_hz: u32,
    /// Counter steps per period.
    pub resolution: u32,
    /// 7-bit I2C address of the controller.
    pub i2c_address: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub i2c_bus: u8,
    pub channel: u8,
    pub min_rotation: f64,
    pub max_rotation: f64,
    pub default_rotation: f64,
    /// Pulse (ms) at full left.
    pub pwm_min_pulse: f64,
    /// Pulse (ms) at full right.
    pub pwm_max_pulse: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub i2c_bus: u8,
    pub channel: u8,
    /// Bottom of the linear command → pulse mapping.
    pub min_throttle: f64,
    /// Top of the linear command → pulse mapping.
    pub max_throttle: f64,
    pub default_throttle: f64,
    /// Largest forward command ever actuated.
    pub forward_max: f64,
    /// Largest (most negative) reverse command ever actuated.
    pub backward_max: f64,
    pub pwm_min_pulse: f64,
    pub pwm_max_pulse: f64,
    pub stall: StallBandConfig,
    pub reverse: ReverseConfig,
}

/// Pulse widths the ESC stalls or chatters on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StallBandConfig {
    /// Exclusive lower edge (ms).
    pub min_pulse: f64,
    /// Exclusive upper edge (ms).
    pub max_pulse: f64,
    /// Replacement pulse for anything inside the band (ms).
    pub stopped_pulse: f64,
}

/// Forward → reverse engagement ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverseConfig {
    /// Requests at or below this throttle (from a non-negative throttle)
    /// run the engagement ramp.
    pub trigger: f64,
    /// Negative throttle the ramp dips to before returning to zero.
    pub floor: f64,
    /// Delay between ramp steps (ms).
    pub step_delay_ms: u32,
}

/// One ultrasonic sonar (ranger + median window).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SonarConfig {
    pub trigger: PinRef,
    pub echo: PinRef,
    pub max_range_cm: f64,
    /// Ambient temperature used for the speed of sound (°C).
    pub temperature_c: f64,
    pub unit: DistanceUnit,
    pub echo_mode: EchoMode,
    pub trigger_pulse_us: u32,
    /// Trigger-low settle time before each ping (µs).
    pub settle_us: u32,
    pub poll_interval_us: u32,
    /// Median window length.
    pub sample_size: usize,
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            development: false,
            pwm: PwmConfig::default(),
            steering: SteeringConfig::default(),
            throttle: ThrottleConfig::default(),
            front_sonar: SonarConfig::front(),
            rear_sonar: SonarConfig::rear(),
        }
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 100,
            resolution: 4096,
            i2c_address: 0x40,
        }
    }
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            i2c_bus: 0,
            channel: 7,
            min_rotation: -1.0,
            max_rotation: 1.0,
            default_rotation: 0.0,
            pwm_min_pulse: 1.0,
            pwm_max_pulse: 2.0,
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            i2c_bus: 0,
            channel: 6,
            min_throttle: -1.0,
            max_throttle: 1.0,
            default_throttle: 0.0,
            forward_max: 0.6,
            backward_max: -0.6,
            pwm_min_pulse: 1.0,
            pwm_max_pulse: 2.0,
            stall: StallBandConfig::default(),
            reverse: ReverseConfig::default(),
        }
    }
}

impl Default for StallBandConfig {
    fn default() -> Self {
        Self {
            min_pulse: 1.35,
            max_pulse: 1.65,
            stopped_pulse: 1.50,
        }
    }
}

impl Default for ReverseConfig {
    fn default() -> Self {
        Self {
            trigger: -0.3,
            floor: -0.35,
            step_delay_ms: 50,
        }
    }
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self::front()
    }
}

impl SonarConfig {
    /// Front sonar: echo J21-31 (GPIO9_MOTION_INT), trigger J21-37 (GPIO8_ALS_PROX_INT).
    pub fn front() -> Self {
        Self::with_pins(PinRef::new(Port::J21, "37"), PinRef::new(Port::J21, "31"))
    }

    /// Rear sonar: echo J21-18 (GPIO16_MDM_WAKE_AP), trigger J21-29 (GPIO19_AUD_RST).
    pub fn rear() -> Self {
        Self::with_pins(PinRef::new(Port::J21, "29"), PinRef::new(Port::J21, "18"))
    }

    fn with_pins(trigger: PinRef, echo: PinRef) -> Self {
        Self {
            trigger,
            echo,
            max_range_cm: 400.0,
            temperature_c: 20.0,
            unit: DistanceUnit::Millimeters,
            echo_mode: EchoMode::WaitForLevel { received: false },
            trigger_pulse_us: 10,
            settle_us: 10_000,
            poll_interval_us: 100,
            sample_size: 5,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.trigger.sysfs_name()?;
        self.echo.sysfs_name()?;
        if self.trigger == self.echo {
            return Err(ConfigError::Validation("sonar trigger and echo must be different pins"));
        }
        if !(self.max_range_cm.is_finite() && self.max_range_cm > 0.0) {
            return Err(ConfigError::Validation("sonar max_range_cm must be positive"));
        }
        if !(self.temperature_c.is_finite() && self.temperature_c > -273.15) {
            return Err(ConfigError::Validation("sonar temperature_c below absolute zero"));
        }
        if self.sample_size == 0 || self.sample_size > MAX_SAMPLE_SIZE {
            return Err(ConfigError::Validation("sonar sample_size must be 1..=16"));
        }
        if self.poll_interval_us == 0 {
            return Err(ConfigError::Validation("sonar poll_interval_us must be non-zero"));
        }
        Ok(())
    }
}

fn front_sonar_overlay<'de, D: Deserializer<'de>>(d: D) -> Result<SonarConfig, D::Error> {
    overlay(SonarConfig::front(), d)
}

fn rear_sonar_overlay<'de, D: Deserializer<'de>>(d: D) -> Result<SonarConfig, D::Error> {
    overlay(SonarConfig::rear(), d)
}

/// Replace the top-level fields of `base` present in the document.
fn overlay<'de, D: Deserializer<'de>>(base: SonarConfig, d: D) -> Result<SonarConfig, D::Error> {
    use serde::de::Error as _;
    use serde_json::Value;

    let patch = Value::deserialize(d)?;
    let Value::Object(patch) = patch else {
        return Err(D::Error::custom("sonar section must be an object"));
    };
    let mut merged = serde_json::to_value(base).map_err(D::Error::custom)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(patch);
    }
    serde_json::from_value(merged).map_err(D::Error::custom)
}

impl PwmConfig {
    /// Length of one PWM period (ms).
    pub fn period_ms(&self) -> f64 {
        1000.0 / f64::from(self.frequency_hz)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.frequency_hz == 0 || self.resolution == 0 {
            return Err(ConfigError::Validation("pwm frequency and resolution must be non-zero"));
        }
        if self.resolution > 4096 {
            return Err(ConfigError::Validation("pwm resolution exceeds the 12-bit counter"));
        }
        Ok(())
    }
}

fn pulse_range_ok(min: f64, max: f64, period_ms: f64) -> bool {
    min.is_finite() && max.is_finite() && min > 0.0 && min < max && max <= period_ms
}

impl SteeringConfig {
    fn validate(&self, period_ms: f64) -> Result<(), ConfigError> {
        if !(self.min_rotation < self.max_rotation) {
            return Err(ConfigError::Validation("steering min_rotation must be below max_rotation"));
        }
        if !(self.min_rotation..=self.max_rotation).contains(&self.default_rotation) {
            return Err(ConfigError::Validation("steering default_rotation outside rotation range"));
        }
        if !pulse_range_ok(self.pwm_min_pulse, self.pwm_max_pulse, period_ms) {
            return Err(ConfigError::Validation("steering pulse range outside the PWM period"));
        }
        Ok(())
    }
}

impl ThrottleConfig {
    fn validate(&self, period_ms: f64) -> Result<(), ConfigError> {
        if !(self.min_throttle < self.max_throttle) {
            return Err(ConfigError::Validation("throttle min_throttle must be below max_throttle"));
        }
        if !(self.backward_max < 0.0 && self.forward_max > 0.0) {
            return Err(ConfigError::Validation("throttle envelope must straddle zero"));
        }
        if self.backward_max < self.min_throttle || self.forward_max > self.max_throttle {
            return Err(ConfigError::Validation("throttle envelope exceeds mapping range"));
        }
        if !(self.backward_max..=self.forward_max).contains(&self.default_throttle) {
            return Err(ConfigError::Validation("throttle default outside envelope"));
        }
        if !pulse_range_ok(self.pwm_min_pulse, self.pwm_max_pulse, period_ms) {
            return Err(ConfigError::Validation("throttle pulse range outside the PWM period"));
        }
        let stall = &self.stall;
        if !(self.pwm_min_pulse <= stall.min_pulse
            && stall.min_pulse < stall.max_pulse
            && stall.max_pulse <= self.pwm_max_pulse)
        {
            return Err(ConfigError::Validation("stall band outside throttle pulse range"));
        }
        if !(stall.min_pulse..=stall.max_pulse).contains(&stall.stopped_pulse) {
            return Err(ConfigError::Validation("stopped pulse outside stall band"));
        }
        let reverse = &self.reverse;
        if !(reverse.trigger < 0.0) {
            return Err(ConfigError::Validation("reverse trigger must be negative"));
        }
        if !(reverse.floor < 0.0 && reverse.floor >= self.backward_max) {
            return Err(ConfigError::Validation("reverse floor must be within [backward_max, 0)"));
        }
        // Clamped requests bottom out at backward_max; a trigger below it
        // would never fire.
        if reverse.trigger < self.backward_max {
            return Err(ConfigError::Validation("reverse trigger below backward_max"));
        }
        if reverse.trigger < reverse.floor {
            return Err(ConfigError::Validation("reverse trigger below the ramp floor"));
        }
        if reverse.step_delay_ms > 1000 {
            return Err(ConfigError::Validation("reverse step_delay_ms above 1 s"));
        }
        Ok(())
    }
}

impl CarConfig {
    /// Default configuration with the mock driver set selected.
    pub fn development() -> Self {
        Self {
            development: true,
            ..Self::default()
        }
    }

    /// Check every parameter; reject rather than clamp.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pwm.validate()?;
        let period = self.pwm.period_ms();
        self.steering.validate(period)?;
        self.throttle.validate(period)?;
        self.front_sonar.validate()?;
        self.rear_sonar.validate()?;

        if self.steering.i2c_bus == self.throttle.i2c_bus
            && self.steering.channel == self.throttle.channel
        {
            return Err(ConfigError::Validation("steering and throttle share a PWM channel"));
        }

        let front = [&self.front_sonar.trigger, &self.front_sonar.echo];
        let rear = [&self.rear_sonar.trigger, &self.rear_sonar.echo];
        if front.iter().any(|p| rear.contains(p)) {
            return Err(ConfigError::Validation("front and rear sonar share a pin"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.  Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Ok(Self::from_json_str(&text)?)
    }
}
