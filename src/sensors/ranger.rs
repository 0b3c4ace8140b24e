//! HC-SR04 ultrasonic ranger.
//!
//! One measurement cycle:
//!
//! ```text
//!   trigger  ‾‾\______________/‾‾‾‾\______________________
//!                 settle_us     10µs   poll echo every poll_interval_us
//!   echo     __________________________/‾‾‾‾‾‾‾‾‾‾‾‾‾‾\___
//! ```
//!
//! The elapsed time is a round trip, so the distance is half of it times
//! the speed of sound at the configured temperature.  The wait is bounded
//! by the round-trip time of `max_range`; hitting that bound is a normal
//! "nothing in range" outcome and reads as exactly `max_range`.
//!
//! Two echo disciplines are supported (see [`EchoMode`]).  The default
//! matches the sensor as wired on the car: time from the end of the trigger
//! pulse until the echo line reaches the "received" level.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Clock, Direction, GpioPin, RangeFinder};
use crate::config::SonarConfig;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Units and echo discipline
// ---------------------------------------------------------------------------

/// Output unit of a ranger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Millimeters,
    Centimeters,
    Inches,
}

impl DistanceUnit {
    /// How many of this unit make one metre.
    pub fn per_metre(self) -> f64 {
        match self {
            Self::Millimeters => 1000.0,
            Self::Centimeters => 100.0,
            Self::Inches => 1.0 / 0.0254,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Millimeters => "mm",
            Self::Centimeters => "cm",
            Self::Inches => "in",
        }
    }
}

/// How the echo line is timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EchoMode {
    /// Time from the end of the trigger pulse until the echo line reads
    /// `received`.  An echo already at that level reads as ~0.
    WaitForLevel { received: bool },
    /// Time from the echo's rising edge to its falling edge.
    EdgeTiming,
}

/// Speed of sound in dry air (m/s) at `temperature_c`.
pub fn speed_of_sound_m_s(temperature_c: f64) -> f64 {
    331.3 * (1.0 + temperature_c / 273.15).sqrt()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoOutcome {
    Received,
    /// Nothing came back within the max-range round trip.
    Timeout,
}

/// One raw measurement with the timing it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Distance in the ranger's output unit, never above `max_range`.
    pub distance: f64,
    /// Measured echo time (µs).  For a timeout, the time waited.
    pub elapsed_us: u64,
    pub outcome: EchoOutcome,
}

// ---------------------------------------------------------------------------
// Ranger
// ---------------------------------------------------------------------------

pub struct UltrasonicRanger<G, K> {
    trigger: G,
    echo: G,
    clock: K,
    unit: DistanceUnit,
    echo_mode: EchoMode,
    max_range: f64,
    speed_m_s: f64,
    timeout_us: u64,
    trigger_pulse_us: u32,
    settle_us: u32,
    poll_interval_us: u32,
}

impl<G: GpioPin, K: Clock> UltrasonicRanger<G, K> {
    /// Export both pins, drive the trigger low and make the echo an input.
    pub fn new(mut trigger: G, mut echo: G, clock: K, config: &SonarConfig) -> Result<Self> {
        trigger.enable()?;
        trigger.set_direction(Direction::Out)?;
        trigger.low()?;
        echo.enable()?;
        echo.set_direction(Direction::In)?;

        let speed_m_s = speed_of_sound_m_s(config.temperature_c);
        let max_range_m = config.max_range_cm / 100.0;
        let timeout_us = (2.0 * max_range_m / speed_m_s * 1e6).ceil() as u64;
        debug!(
            "ranger {}/{}: max {} cm, {:.1} m/s, timeout {} us",
            trigger.name(),
            echo.name(),
            config.max_range_cm,
            speed_m_s,
            timeout_us
        );

        Ok(Self {
            trigger,
            echo,
            clock,
            unit: config.unit,
            echo_mode: config.echo_mode,
            max_range: max_range_m * config.unit.per_metre(),
            speed_m_s,
            timeout_us,
            trigger_pulse_us: config.trigger_pulse_us,
            settle_us: config.settle_us,
            poll_interval_us: config.poll_interval_us,
        })
    }

    /// Fire one ping and time the echo.
    pub fn measure_reading(&mut self) -> Result<Reading> {
        self.fire()?;
        let (elapsed_us, outcome) = match self.echo_mode {
            EchoMode::WaitForLevel { received } => {
                let start = self.clock.now_us();
                match self.wait_for(received, start)? {
                    Some(at) => (at - start, EchoOutcome::Received),
                    None => (self.timeout_us, EchoOutcome::Timeout),
                }
            }
            EchoMode::EdgeTiming => {
                let start = self.clock.now_us();
                match self.wait_for(true, start)? {
                    None => (self.timeout_us, EchoOutcome::Timeout),
                    Some(rise) => match self.wait_for(false, rise)? {
                        Some(fall) => (fall - rise, EchoOutcome::Received),
                        None => (self.timeout_us, EchoOutcome::Timeout),
                    },
                }
            }
        };

        let distance = match outcome {
            EchoOutcome::Timeout => {
                debug!("ranger {}: no echo within {} us", self.echo.name(), self.timeout_us);
                self.max_range
            }
            EchoOutcome::Received => self.distance_for(elapsed_us),
        };
        trace!(
            "ranger {}: {:.1} {} ({} us)",
            self.echo.name(),
            distance,
            self.unit.suffix(),
            elapsed_us
        );
        Ok(Reading {
            distance,
            elapsed_us,
            outcome,
        })
    }

    /// Unexport both pins.
    pub fn release(&mut self) -> Result<()> {
        self.trigger.disable()?;
        self.echo.disable()
    }

    fn fire(&mut self) -> Result<()> {
        self.trigger.low()?;
        self.clock.sleep_us(self.settle_us);
        self.trigger.high()?;
        self.clock.sleep_us(self.trigger_pulse_us);
        self.trigger.low()
    }

    /// Poll the echo until it reads `level`.  Returns the time it did, or
    /// `None` once `timeout_us` has passed since `since`.
    fn wait_for(&mut self, level: bool, since: u64) -> Result<Option<u64>> {
        loop {
            if self.echo.get_value()? == level {
                return Ok(Some(self.clock.now_us()));
            }
            if self.clock.now_us().saturating_sub(since) >= self.timeout_us {
                return Ok(None);
            }
            self.clock.sleep_us(self.poll_interval_us);
        }
    }
}

impl<G, K> UltrasonicRanger<G, K> {
    /// Distance for a round-trip echo time, clamped to `max_range`.
    pub fn distance_for(&self, elapsed_us: u64) -> f64 {
        let metres = elapsed_us as f64 / 2.0 * 1e-6 * self.speed_m_s;
        (metres * self.unit.per_metre()).min(self.max_range)
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    /// Longest the ranger waits for an echo (µs).
    pub fn timeout_us(&self) -> u64 {
        self.timeout_us
    }

    pub fn trigger(&self) -> &G {
        &self.trigger
    }

    pub fn echo(&self) -> &G {
        &self.echo
    }

    pub fn echo_mut(&mut self) -> &mut G {
        &mut self.echo
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }
}

impl<G: GpioPin, K: Clock> RangeFinder for UltrasonicRanger<G, K> {
    fn measure(&mut self) -> Result<f64> {
        self.measure_reading().map(|r| r.distance)
    }

    fn max_range(&self) -> f64 {
        self.max_range
    }

    fn release(&mut self) -> Result<()> {
        UltrasonicRanger::release(self)
    }
}
