//! Outbound car events.
//!
//! [`Car::sample`](super::car::Car::sample) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, stream them to the web
//! front end, or append them to a training recording.

/// Structured events emitted by the car.
#[derive(Debug, Clone, PartialEq)]
pub enum CarEvent {
    /// One control-tick snapshot.
    Telemetry(TelemetryData),

    /// A pin or PWM operation failed; the tick was aborted.
    HardwareFault { device: String, detail: String },
}

/// The scalar part of a [`CarState`](super::state::CarState), suitable for
/// logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub steering: f64,
    pub throttle: f64,
    pub front_distance: f64,
    pub rear_distance: f64,
    /// Pulse lengths (ms) currently on the servo and ESC lines.
    pub steering_pulse_ms: f64,
    pub throttle_pulse_ms: f64,
}
