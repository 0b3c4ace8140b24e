//! Unified error types for the car control layer.
//!
//! Every fallible operation funnels into [`Error`], so the caller's control
//! tick has exactly two things to decide about: a configuration mistake
//! (fatal, raised at construction) or a hardware fault (abort the tick,
//! log the device, let the caller choose to retry).
//!
//! An ultrasonic range timeout is deliberately *not* represented here: it
//! means "nothing within range" and is reported as a max-range reading.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid construction-time configuration.
    Config(ConfigError),
    /// A pin or PWM chip operation failed on the real driver.
    Hardware(HardwareFault),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// The offending device, if this is a hardware fault.
    pub fn device(&self) -> Option<&str> {
        match self {
            Self::Hardware(fault) => Some(&fault.device),
            Self::Config(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Header name is not one of the supported ports.
    UnknownPort(String),
    /// Pin is not wired to a GPIO on the given port.
    UnknownPin { port: String, pin: String },
    /// A parameter failed range / consistency validation.
    Validation(&'static str),
    /// The configuration document could not be parsed.
    Parse(String),
    /// The requested driver set was not compiled into this build.
    Unsupported(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPort(port) => write!(f, "no such port {port}"),
            Self::UnknownPin { port, pin } => write!(f, "no such pin: {pin} on port {port}"),
            Self::Validation(msg) => write!(f, "validation failed: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware faults
// ---------------------------------------------------------------------------

/// A failed operation on a physical device, tagged with the device identity
/// so it can be logged by whoever aborts the control tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareFault {
    /// Pin (`gpio187 (J21-37)`) or chip (`pca9685@0x40/bus0`) identity.
    pub device: String,
    pub kind: FaultKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// Pin used before `enable()` (or after `disable()`).
    NotExported,
    /// Filesystem-level failure talking to the kernel driver.
    Io(std::io::ErrorKind),
    /// The kernel returned something other than `0` / `1`.
    BadValue(String),
    /// I2C bus transaction failed.
    Bus(embedded_hal::i2c::ErrorKind),
}

impl HardwareFault {
    pub fn new(device: impl Into<String>, kind: FaultKind) -> Self {
        Self {
            device: device.into(),
            kind,
        }
    }

    pub fn io(device: impl Into<String>, err: &std::io::Error) -> Self {
        Self::new(device, FaultKind::Io(err.kind()))
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotExported => write!(f, "pin not exported"),
            Self::Io(kind) => write!(f, "I/O error ({kind})"),
            Self::BadValue(v) => write!(f, "unexpected value {v:?}"),
            Self::Bus(kind) => write!(f, "I2C bus error ({kind:?})"),
        }
    }
}

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.device, self.kind)
    }
}

impl From<HardwareFault> for Error {
    fn from(e: HardwareFault) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
