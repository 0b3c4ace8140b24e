//! Actuator drivers: the PWM channel and the two actuators that own one.

pub mod pwm;
pub mod steering;
pub mod throttle;

pub use pwm::PwmChannel;
pub use steering::Steering;
pub use throttle::Throttle;
