//! NXP PCA9685 16-channel, 12-bit PWM controller over I2C.
//!
//! Generic over any `embedded_hal::i2c::I2c` bus and `DelayNs` source, so
//! the register protocol is tested on the host against a register-file
//! mock and runs on the Jetson through `linux-embedded-hal`'s `I2cdev`.
//!
//! MODE1 auto-increment is enabled at init so the four LEDn registers of a
//! channel are rewritten in one bus transaction.  Outputs update on the
//! I2C STOP, so a channel never runs a mix of old and new bytes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info};

use crate::app::ports::PwmChip;
use crate::error::{Error, FaultKind, HardwareFault, Result};

// Registers
const MODE1: u8 = 0x00;
const MODE2: u8 = 0x01;
const PRESCALE: u8 = 0xFE;
const LED0_ON_L: u8 = 0x06;
const ALL_LED_ON_L: u8 = 0xFA;

// MODE1 / MODE2 bits
const RESTART: u8 = 0x80;
const SLEEP: u8 = 0x10;
const AI: u8 = 0x20;
const ALLCALL: u8 = 0x01;
const OUTDRV: u8 = 0x04;

/// Internal oscillator (Hz).
const OSC_CLOCK_HZ: f64 = 25_000_000.0;
pub const CHANNELS: u8 = 16;
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Prescale register value for `frequency_hz`.
pub fn prescale_for(frequency_hz: u32) -> u8 {
    let value = OSC_CLOCK_HZ / 4096.0 / f64::from(frequency_hz) - 1.0;
    (value + 0.5).floor().clamp(3.0, 255.0) as u8
}

/// Device identity used in logs and faults.
pub fn chip_name(bus: u8, address: u8) -> String {
    format!("pca9685@{address:#04x}/bus{bus}")
}

pub struct Pca9685<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    name: String,
}

impl<I2C: I2c, D: DelayNs> Pca9685<I2C, D> {
    /// Bring the controller out of power-on state: every output off,
    /// totem-pole drivers, oscillator running.
    pub fn new(i2c: I2C, delay: D, bus: u8, address: u8) -> Result<Self> {
        let mut chip = Self {
            i2c,
            delay,
            address,
            name: chip_name(bus, address),
        };
        let mode1 = chip.read_reg(MODE1)?;
        chip.write_reg(MODE1, mode1 | AI)?;
        chip.write_regs(ALL_LED_ON_L, [0, 0, 0, 0])?;
        chip.write_reg(MODE2, OUTDRV)?;
        chip.write_reg(MODE1, ALLCALL | AI)?;
        chip.delay.delay_ms(5);
        let mode1 = chip.read_reg(MODE1)? & !SLEEP;
        chip.write_reg(MODE1, mode1)?;
        chip.delay.delay_ms(5);
        info!("{}: initialised", chip.name);
        Ok(chip)
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn bus_fault(&self, err: I2C::Error) -> Error {
        HardwareFault::new(self.name.clone(), FaultKind::Bus(err.kind())).into()
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|e| self.bus_fault(e))
    }

    /// Write four consecutive registers in one transaction (needs AI).
    fn write_regs(&mut self, first: u8, [a, b, c, d]: [u8; 4]) -> Result<()> {
        self.i2c
            .write(self.address, &[first, a, b, c, d])
            .map_err(|e| self.bus_fault(e))
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|e| self.bus_fault(e))?;
        Ok(buf[0])
    }
}

impl<I2C: I2c, D: DelayNs> PwmChip for Pca9685<I2C, D> {
    fn name(&self) -> &str {
        &self.name
    }

    /// The prescaler can only be written while the oscillator sleeps.
    fn set_pwm_freq(&mut self, frequency_hz: u32) -> Result<()> {
        if frequency_hz == 0 {
            return Err(HardwareFault::new(
                self.name.clone(),
                FaultKind::BadValue("frequency 0 Hz".into()),
            )
            .into());
        }
        let prescale = prescale_for(frequency_hz);
        debug!("{}: {frequency_hz} Hz, prescale {prescale}", self.name);
        let old_mode = self.read_reg(MODE1)?;
        self.write_reg(MODE1, (old_mode & !RESTART) | SLEEP)?;
        self.write_reg(PRESCALE, prescale)?;
        self.write_reg(MODE1, old_mode)?;
        self.delay.delay_ms(5);
        self.write_reg(MODE1, old_mode | RESTART)
    }

    fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<()> {
        if channel >= CHANNELS {
            return Err(HardwareFault::new(
                self.name.clone(),
                FaultKind::BadValue(format!("channel {channel}")),
            )
            .into());
        }
        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();
        self.write_regs(LED0_ON_L + 4 * channel, [on_l, on_h, off_l, off_h])
    }
}
