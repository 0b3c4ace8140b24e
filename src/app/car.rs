//! The car: sole owner of both actuators and both sonars.
//!
//! ```text
//!   FrameSource ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                   │             Car               │
//!      PwmChip  ◀── │ Steering · Throttle · Sonars  │ ◀── RangeFinder
//!                   └──────────────────────────────┘
//! ```
//!
//! One `Car` value is built at startup (see
//! [`adapters::hardware`](crate::adapters::hardware)) and handed to whoever
//! drives the control loop.  The learning side reads a [`CarState`] per
//! tick and issues commands through [`Car::steering_mut`] /
//! [`Car::throttle_mut`].

use log::{error, info};

use crate::app::events::{CarEvent, TelemetryData};
use crate::app::ports::{Clock, EventSink, FrameSource, PwmChip, RangeFinder};
use crate::app::state::CarState;
use crate::config::CarConfig;
use crate::drivers::pwm::PwmChannel;
use crate::drivers::steering::Steering;
use crate::drivers::throttle::Throttle;
use crate::error::{Error, Result};
use crate::sensors::sonar::SonarSensor;

/// Hardware handed to [`Car::new`].  Each actuator gets its own chip
/// handle; on the real car both address the same PCA9685.
pub struct CarParts<P, K, R> {
    pub steering_chip: P,
    pub throttle_chip: P,
    /// Drives the throttle's reverse-engagement ramp.
    pub clock: K,
    pub front_ranger: R,
    pub rear_ranger: R,
}

pub struct Car<P, K, R> {
    steering: Steering<P>,
    throttle: Throttle<P, K>,
    front_sonar: SonarSensor<R>,
    rear_sonar: SonarSensor<R>,
}

impl<P: PwmChip, K: Clock, R: RangeFinder> Car<P, K, R> {
    /// Program both PWM channels and bring the actuators to their
    /// defaults (wheels centred, motor stopped).
    pub fn new(config: &CarConfig, parts: CarParts<P, K, R>) -> Result<Self> {
        let steering_pwm = PwmChannel::new(parts.steering_chip, config.steering.channel, &config.pwm)?;
        let throttle_pwm = PwmChannel::new(parts.throttle_chip, config.throttle.channel, &config.pwm)?;
        let steering = Steering::new(steering_pwm, &config.steering)?;
        let throttle = Throttle::new(throttle_pwm, parts.clock, &config.throttle)?;
        info!("car: {steering} and {throttle} ready");
        Ok(Self {
            steering,
            throttle,
            front_sonar: SonarSensor::new(parts.front_ranger, config.front_sonar.sample_size),
            rear_sonar: SonarSensor::new(parts.rear_ranger, config.rear_sonar.sample_size),
        })
    }

    // ── Snapshot ──────────────────────────────────────────────

    /// Refill both sonar windows, grab one frame and snapshot the car.
    ///
    /// Blocks for one full window of pings per sonar.  The first hardware
    /// fault aborts the snapshot.
    pub fn get_state(&mut self, camera: &mut impl FrameSource) -> Result<CarState> {
        let ticks = self
            .front_sonar
            .sample_size()
            .max(self.rear_sonar.sample_size());
        for _ in 0..ticks {
            self.front_sonar.tick()?;
            self.rear_sonar.tick()?;
        }
        let frame = camera.get_frame()?;
        Ok(CarState {
            steering: self.steering.get_rotation(),
            throttle: self.throttle.get_throttle(),
            front_distance: median_or_max(&self.front_sonar),
            rear_distance: median_or_max(&self.rear_sonar),
            frame,
        })
    }

    /// [`get_state`](Self::get_state), reporting the outcome through
    /// `sink`: telemetry on success, a fault event naming the device on
    /// failure.
    pub fn sample(
        &mut self,
        camera: &mut impl FrameSource,
        sink: &mut impl EventSink,
    ) -> Result<CarState> {
        match self.get_state(camera) {
            Ok(state) => {
                sink.emit(&CarEvent::Telemetry(self.telemetry(&state)));
                Ok(state)
            }
            Err(e) => {
                if let Error::Hardware(fault) = &e {
                    sink.emit(&CarEvent::HardwareFault {
                        device: fault.device.clone(),
                        detail: fault.kind.to_string(),
                    });
                }
                Err(e)
            }
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Return the throttle to its default.  Steering is left alone.
    pub fn reset(&mut self) -> Result<()> {
        self.throttle.reset()
    }

    /// Stop the motor, centre the wheels and release the sonar pins.
    ///
    /// Every step is attempted; the first failure is returned.
    pub fn shutdown(&mut self) -> Result<()> {
        let results = [
            self.throttle.reset(),
            self.steering.reset(),
            self.front_sonar.release(),
            self.rear_sonar.release(),
        ];
        let mut first = Ok(());
        for result in results {
            if let Err(e) = result {
                error!("car: shutdown step failed: {e}");
                if first.is_ok() {
                    first = Err(e);
                }
            }
        }
        info!("car: shut down");
        first
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn steering(&self) -> &Steering<P> {
        &self.steering
    }

    pub fn steering_mut(&mut self) -> &mut Steering<P> {
        &mut self.steering
    }

    pub fn throttle(&self) -> &Throttle<P, K> {
        &self.throttle
    }

    pub fn throttle_mut(&mut self) -> &mut Throttle<P, K> {
        &mut self.throttle
    }

    pub fn front_sonar(&self) -> &SonarSensor<R> {
        &self.front_sonar
    }

    pub fn front_sonar_mut(&mut self) -> &mut SonarSensor<R> {
        &mut self.front_sonar
    }

    pub fn rear_sonar(&self) -> &SonarSensor<R> {
        &self.rear_sonar
    }

    pub fn rear_sonar_mut(&mut self) -> &mut SonarSensor<R> {
        &mut self.rear_sonar
    }

    fn telemetry(&self, state: &CarState) -> TelemetryData {
        TelemetryData {
            steering: state.steering,
            throttle: state.throttle,
            front_distance: state.front_distance,
            rear_distance: state.rear_distance,
            steering_pulse_ms: self.steering.get_pulse_length(),
            throttle_pulse_ms: self.throttle.get_pulse_length(),
        }
    }
}

fn median_or_max<R: RangeFinder>(sonar: &SonarSensor<R>) -> f64 {
    sonar
        .distance()
        .unwrap_or_else(|| sonar.ranger().max_range())
}
