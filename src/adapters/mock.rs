//! Mock driver set for development mode and tests.
//!
//! Substituted for the sysfs pins, the PCA9685 and the camera when the car
//! is built in development mode.  The mocks never touch hardware, never
//! fail unless asked to, and record what they were told so tests can
//! assert on the full command history.

use std::collections::VecDeque;

use log::debug;

use crate::app::ports::{Direction, FrameSource, GpioPin, PwmChip};
use crate::app::state::Frame;
use crate::error::{ConfigError, Error, FaultKind, HardwareFault, Result};
use crate::pins::{PinRef, Port};

// ── MockPin ───────────────────────────────────────────────────

/// GPIO pin that accepts every operation.
///
/// Reads return scripted levels: each `get_value` consumes one entry and
/// the last entry repeats forever.  Without a script the pin reads high.
#[derive(Debug)]
pub struct MockPin {
    name: String,
    enabled: bool,
    direction: Direction,
    levels: VecDeque<bool>,
    last_level: bool,
    writes: Vec<bool>,
}

impl MockPin {
    /// Resolve `pin` on `port` exactly as the real driver would, so a bad
    /// pin name fails in development mode too.
    pub fn new(
        port: Port,
        pin: &str,
        direction: Direction,
    ) -> core::result::Result<Self, ConfigError> {
        let pin = PinRef::new(port, pin);
        let sysfs = pin.sysfs_name()?;
        Ok(Self {
            name: format!("{sysfs} ({pin})"),
            enabled: false,
            direction,
            levels: VecDeque::new(),
            last_level: true,
            writes: Vec::new(),
        })
    }

    pub fn from_ref(pin: &PinRef, direction: Direction) -> core::result::Result<Self, ConfigError> {
        Self::new(pin.port, &pin.pin, direction)
    }

    /// Script the levels returned by successive reads.
    pub fn with_levels(mut self, levels: Vec<bool>) -> Self {
        self.levels = levels.into();
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Every level written, oldest first.
    pub fn writes(&self) -> &[bool] {
        &self.writes
    }
}

impl GpioPin for MockPin {
    fn name(&self) -> &str {
        &self.name
    }

    fn enable(&mut self) -> Result<()> {
        debug!("{}: mock export", self.name);
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        debug!("{}: mock unexport", self.name);
        self.enabled = false;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.direction = direction;
        Ok(())
    }

    fn set_value(&mut self, high: bool) -> Result<()> {
        self.writes.push(high);
        Ok(())
    }

    fn get_value(&mut self) -> Result<bool> {
        if let Some(level) = self.levels.pop_front() {
            self.last_level = level;
        }
        Ok(self.last_level)
    }
}

// ── MockPwmChip ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmWrite {
    pub channel: u8,
    pub on: u16,
    pub off: u16,
}

/// PWM controller that records every write.
#[derive(Debug, Default)]
pub struct MockPwmChip {
    frequency_hz: Option<u32>,
    writes: Vec<PwmWrite>,
    /// Writes still allowed before the next one fails.
    fail_after: Option<usize>,
}

impl MockPwmChip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last frequency programmed, if any.
    pub fn frequency_hz(&self) -> Option<u32> {
        self.frequency_hz
    }

    /// Successful writes, oldest first.
    pub fn writes(&self) -> &[PwmWrite] {
        &self.writes
    }

    pub fn last_write(&self) -> Option<&PwmWrite> {
        self.writes.last()
    }

    /// Make the next `set_pwm` fail with a bus fault.
    pub fn fail_next_write(&mut self) {
        self.fail_after = Some(0);
    }

    /// Let `n` more writes through, then fail once.
    pub fn fail_write_after(&mut self, n: usize) {
        self.fail_after = Some(n);
    }
}

impl PwmChip for MockPwmChip {
    fn name(&self) -> &str {
        "mock-pwm"
    }

    fn set_pwm_freq(&mut self, frequency_hz: u32) -> Result<()> {
        self.frequency_hz = Some(frequency_hz);
        Ok(())
    }

    fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<()> {
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                return Err(Error::Hardware(HardwareFault::new(
                    self.name(),
                    FaultKind::Bus(embedded_hal::i2c::ErrorKind::Other),
                )));
            }
            Some(n) => self.fail_after = Some(n - 1),
            None => {}
        }
        self.writes.push(PwmWrite { channel, on, off });
        Ok(())
    }
}

// ── MockCamera ────────────────────────────────────────────────

pub const MOCK_FRAME_WIDTH: u32 = 640;
pub const MOCK_FRAME_HEIGHT: u32 = 360;

/// Camera stand-in producing a fixed 640×360 BGR gradient.
#[derive(Debug, Default)]
pub struct MockCamera {
    frames: u64,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames handed out so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameSource for MockCamera {
    fn get_frame(&mut self) -> Result<Frame> {
        self.frames += 1;
        let (w, h) = (MOCK_FRAME_WIDTH as usize, MOCK_FRAME_HEIGHT as usize);
        let mut data = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]);
            }
        }
        Ok(Frame::new(MOCK_FRAME_WIDTH, MOCK_FRAME_HEIGHT, 3, data))
    }
}
