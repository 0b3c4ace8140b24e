//! STAR car actuator and sensor layer.
//!
//! Drives the steering servo and the drive-motor ESC through a PCA9685 PWM
//! controller, reads two HC-SR04 ultrasonic rangers over sysfs GPIO, and
//! exposes the result as one [`app::CarState`] snapshot per control tick.
//! Every hardware touch point sits behind a port trait in [`app::ports`],
//! so the whole crate runs on a development machine against the mock
//! driver set.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod safety;
pub mod sensors;

pub use error::{Error, Result};
