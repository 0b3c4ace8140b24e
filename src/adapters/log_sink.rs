//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing car events through the `log`
//! facade.  A websocket or training-recorder adapter would implement the
//! same trait.

use log::{error, info};

use crate::app::events::CarEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`CarEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CarEvent) {
        match event {
            CarEvent::Telemetry(t) => {
                info!(
                    "TELEM | steer={:+.2} ({:.3}ms) | throttle={:+.2} ({:.3}ms) | \
                     front={:.0} rear={:.0}",
                    t.steering,
                    t.steering_pulse_ms,
                    t.throttle,
                    t.throttle_pulse_ms,
                    t.front_distance,
                    t.rear_distance,
                );
            }
            CarEvent::HardwareFault { device, detail } => {
                error!("FAULT | {device}: {detail}");
            }
        }
    }
}
