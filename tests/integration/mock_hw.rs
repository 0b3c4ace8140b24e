//! Shared mock hardware for integration tests.
//!
//! Builds cars and rangers on the library's mock pins and PWM chips, driven
//! by a [`SimClock`] the test keeps a handle on, plus a recording event sink
//! and a scripted range finder for fault injection.

use starcar::adapters::mock::{MockPin, MockPwmChip};
use starcar::adapters::time::SimClock;
use starcar::app::car::{Car, CarParts};
use starcar::app::events::CarEvent;
use starcar::app::ports::{Direction, EventSink, RangeFinder};
use starcar::config::{CarConfig, SonarConfig};
use starcar::error::{FaultKind, HardwareFault, Result};
use starcar::sensors::ranger::UltrasonicRanger;

pub type TestRanger = UltrasonicRanger<MockPin, SimClock>;
pub type TestCar = Car<MockPwmChip, SimClock, TestRanger>;

/// Round trip of one 100 µs poll, in millimetres at 20 °C.
#[allow(dead_code)]
pub const MM_PER_POLL: f64 = 17.160_7;

/// Echo script for a series of pings in `WaitForLevel { received: false }`
/// mode: ping `i` sees the echo drop after `polls[i]` polls.
pub fn pings(polls: &[usize]) -> Vec<bool> {
    let mut levels = Vec::new();
    for &n in polls {
        levels.extend(std::iter::repeat_n(true, n));
        levels.push(false);
    }
    levels
}

pub fn ranger(config: &SonarConfig, clock: &SimClock, echo: Vec<bool>) -> TestRanger {
    let trigger = MockPin::from_ref(&config.trigger, Direction::Out).unwrap();
    let echo = MockPin::from_ref(&config.echo, Direction::In)
        .unwrap()
        .with_levels(echo);
    UltrasonicRanger::new(trigger, echo, clock.clone(), config).unwrap()
}

/// A car on mock hardware.  All components share `clock`.
pub fn car(config: &CarConfig, clock: &SimClock, front_echo: Vec<bool>, rear_echo: Vec<bool>) -> TestCar {
    let parts = CarParts {
        steering_chip: MockPwmChip::new(),
        throttle_chip: MockPwmChip::new(),
        clock: clock.clone(),
        front_ranger: ranger(&config.front_sonar, clock, front_echo),
        rear_ranger: ranger(&config.rear_sonar, clock, rear_echo),
    };
    Car::new(config, parts).unwrap()
}

/// Off-tick of every write the chip accepted.
#[allow(dead_code)]
pub fn offs(chip: &MockPwmChip) -> Vec<u16> {
    chip.writes().iter().map(|w| w.off).collect()
}

/// Records every emitted event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<CarEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &CarEvent) {
        self.events.push(event.clone());
    }
}

/// Range finder that plays back readings and can be told to fail.
pub struct ScriptedRanger {
    pub readings: Vec<f64>,
    pub next: usize,
    pub fail_with: Option<&'static str>,
    pub released: bool,
}

#[allow(dead_code)]
impl ScriptedRanger {
    pub fn new(readings: &[f64]) -> Self {
        Self {
            readings: readings.to_vec(),
            next: 0,
            fail_with: None,
            released: false,
        }
    }
}

impl RangeFinder for ScriptedRanger {
    fn measure(&mut self) -> Result<f64> {
        if let Some(device) = self.fail_with {
            return Err(HardwareFault::new(device, FaultKind::NotExported).into());
        }
        let reading = self.readings[self.next % self.readings.len()];
        self.next += 1;
        Ok(reading)
    }

    fn max_range(&self) -> f64 {
        4000.0
    }

    fn release(&mut self) -> Result<()> {
        self.released = true;
        Ok(())
    }
}
