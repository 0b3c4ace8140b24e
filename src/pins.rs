//! GPIO pin assignments for the Jetson TX1 carrier board.
//!
//! Single source of truth for the header-pin → sysfs-name mapping.  Every
//! pin driver (real or mock) resolves its name through [`sysfs_name`], so a
//! typo in the configuration fails at construction time rather than on the
//! first write.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root of the legacy sysfs GPIO interface.
pub const SYSFS_GPIO_DIR: &str = "/sys/class/gpio";

/// Expansion header a pin lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Port {
    J21,
    J3A,
}

impl Port {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "J21" => Ok(Self::J21),
            "J3A" => Ok(Self::J3A),
            other => Err(ConfigError::UnknownPort(other.to_string())),
        }
    }

    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::J21 => J21_PINS,
            Self::J3A => J3A_PINS,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::J21 => write!(f, "J21"),
            Self::J3A => write!(f, "J3A"),
        }
    }
}

// ---------------------------------------------------------------------------
// J21: 40-pin expansion header
// ---------------------------------------------------------------------------

const J21_PINS: &[(&str, &str)] = &[
    ("32", "gpio36"),  // Unused - AO_DMIC_IN_CLK
    ("16", "gpio37"),  // Unused - AO_DMIC_IN_DAT
    ("13", "gpio38"),  // Bidir  - GPIO20/AUD_INT
    ("33", "gpio63"),  // Bidir  - GPIO11_AP_WAKE_BT
    ("18", "gpio184"), // Input  - GPIO16_MDM_WAKE_AP
    ("31", "gpio186"), // Input  - GPIO9_MOTION_INT
    ("37", "gpio187"), // Output - GPIO8_ALS_PROX_INT
    ("29", "gpio219"), // Output - GPIO19_AUD_RST
];

// ---------------------------------------------------------------------------
// J3A: camera / expansion connectors (J3A1, J3A2)
// ---------------------------------------------------------------------------

const J3A_PINS: &[(&str, &str)] = &[
    ("50", "gpio57"), // J3A1
    ("40", "gpio160"),
    ("43", "gpio161"),
    ("46", "gpio162"),
    ("49", "gpio163"),
    ("52", "gpio164"),
    ("55", "gpio165"),
    ("58", "gpio166"),
];

/// A header pin reference as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub port: Port,
    pub pin: String,
}

impl PinRef {
    pub fn new(port: Port, pin: &str) -> Self {
        Self {
            port,
            pin: pin.to_string(),
        }
    }

    /// Resolve to the kernel's sysfs name (`gpio187`).
    pub fn sysfs_name(&self) -> Result<&'static str, ConfigError> {
        sysfs_name(self.port, &self.pin)
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.port, self.pin)
    }
}

/// Look up the sysfs name for `pin` on `port`.
pub fn sysfs_name(port: Port, pin: &str) -> Result<&'static str, ConfigError> {
    port.table()
        .iter()
        .find(|(header, _)| *header == pin)
        .map(|(_, name)| *name)
        .ok_or_else(|| ConfigError::UnknownPin {
            port: port.to_string(),
            pin: pin.to_string(),
        })
}

/// The numeric id written to `export` / `unexport` (`gpio187` → `187`).
pub fn gpio_number(sysfs_name: &str) -> &str {
    sysfs_name.trim_start_matches("gpio")
}
