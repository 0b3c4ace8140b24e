//! Real GPIO pin over the legacy sysfs interface.
//!
//! ```text
//!   /sys/class/gpio/export          ← "187"   (enable)
//!   /sys/class/gpio/gpio187/direction ← "out"
//!   /sys/class/gpio/gpio187/value   ↔ "0" / "1"
//!   /sys/class/gpio/unexport        ← "187"   (disable, drop)
//! ```
//!
//! The root directory is configurable so tests can run against a fake tree.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::app::ports::{Direction, GpioPin};
use crate::error::{ConfigError, FaultKind, HardwareFault, Result};
use crate::pins::{self, PinRef, Port, SYSFS_GPIO_DIR};

pub struct SysfsPin {
    root: PathBuf,
    sysfs: &'static str,
    name: String,
    exported: bool,
}

impl SysfsPin {
    /// Resolve the pin against the real sysfs root.  Nothing is written
    /// until [`GpioPin::enable`].
    pub fn new(port: Port, pin: &str) -> core::result::Result<Self, ConfigError> {
        Self::with_root(SYSFS_GPIO_DIR, port, pin)
    }

    pub fn from_ref(pin: &PinRef) -> core::result::Result<Self, ConfigError> {
        Self::new(pin.port, &pin.pin)
    }

    pub fn with_root(
        root: impl AsRef<Path>,
        port: Port,
        pin: &str,
    ) -> core::result::Result<Self, ConfigError> {
        let pin = PinRef::new(port, pin);
        let sysfs = pin.sysfs_name()?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            sysfs,
            name: format!("{sysfs} ({pin})"),
            exported: false,
        })
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(self.sysfs)
    }

    fn fault(&self, kind: FaultKind) -> HardwareFault {
        HardwareFault::new(self.name.clone(), kind)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).map_err(|e| HardwareFault::io(self.name.clone(), &e).into())
    }

    fn require_exported(&self) -> Result<()> {
        if self.exported {
            Ok(())
        } else {
            Err(self.fault(FaultKind::NotExported).into())
        }
    }
}

impl GpioPin for SysfsPin {
    fn name(&self) -> &str {
        &self.name
    }

    fn enable(&mut self) -> Result<()> {
        if self.pin_dir().is_dir() {
            debug!("{}: already exported", self.name);
        } else {
            self.write(&self.root.join("export"), pins::gpio_number(self.sysfs))?;
        }
        self.exported = true;
        info!("{}: enabled", self.name);
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        if !self.exported {
            return Ok(());
        }
        self.write(&self.root.join("unexport"), pins::gpio_number(self.sysfs))?;
        self.exported = false;
        info!("{}: disabled", self.name);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.exported
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.require_exported()?;
        self.write(&self.pin_dir().join("direction"), direction.as_sysfs())
    }

    fn set_value(&mut self, high: bool) -> Result<()> {
        self.require_exported()?;
        self.write(&self.pin_dir().join("value"), if high { "1" } else { "0" })
    }

    fn get_value(&mut self) -> Result<bool> {
        self.require_exported()?;
        let raw = fs::read_to_string(self.pin_dir().join("value"))
            .map_err(|e| HardwareFault::io(self.name.clone(), &e))?;
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(self.fault(FaultKind::BadValue(other.to_string())).into()),
        }
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if let Err(e) = self.disable() {
            warn!("{}: unexport on drop failed: {e}", self.name);
        }
    }
}
