//! Range sensing: the raw HC-SR04 driver and the median-filtered sonar
//! built on top of it.

pub mod ranger;
pub mod sonar;

pub use ranger::{DistanceUnit, EchoMode, UltrasonicRanger};
pub use sonar::SonarSensor;
