//! Integration test: a short obstacle-avoidance control loop on mock
//! hardware with a simulated clock.
//!
//! The front echo script brings an obstacle closer each tick; the loop
//! backs off once it is inside the stop distance.  Checks that commands,
//! snapshots and the reverse ramp all line up.

use starcar::adapters::mock::{MockCamera, MockPin, MockPwmChip};
use starcar::adapters::time::SimClock;
use starcar::app::car::{Car, CarParts};
use starcar::app::events::CarEvent;
use starcar::app::ports::{Direction, EventSink};
use starcar::config::{CarConfig, SonarConfig};
use starcar::sensors::ranger::UltrasonicRanger;

/// Round trip of one 100 µs poll, in millimetres at 20 °C.
const MM_PER_POLL: f64 = 17.160_7;
const STOP_DISTANCE_MM: f64 = 300.0;

#[derive(Default)]
struct Telemetry(Vec<f64>);

impl EventSink for Telemetry {
    fn emit(&mut self, event: &CarEvent) {
        if let CarEvent::Telemetry(t) = event {
            self.0.push(t.front_distance);
        }
    }
}

fn ranger(
    config: &SonarConfig,
    clock: &SimClock,
    polls_per_ping: &[usize],
) -> UltrasonicRanger<MockPin, SimClock> {
    let mut levels = Vec::new();
    for &n in polls_per_ping {
        levels.extend(std::iter::repeat_n(true, n));
        levels.push(false);
    }
    let trigger = MockPin::from_ref(&config.trigger, Direction::Out).unwrap();
    let echo = MockPin::from_ref(&config.echo, Direction::In)
        .unwrap()
        .with_levels(levels);
    UltrasonicRanger::new(trigger, echo, clock.clone(), config).unwrap()
}

#[test]
fn car_backs_away_from_an_approaching_obstacle() {
    let mut config = CarConfig::development();
    config.front_sonar.sample_size = 3;
    config.rear_sonar.sample_size = 3;
    let clock = SimClock::new();

    // Obstacle at ~60, ~30, then ~12 polls; three pings per tick.
    let front = [60, 61, 59, 30, 31, 29, 12, 12, 12];
    let parts = CarParts {
        steering_chip: MockPwmChip::new(),
        throttle_chip: MockPwmChip::new(),
        clock: clock.clone(),
        front_ranger: ranger(&config.front_sonar, &clock, &front),
        rear_ranger: ranger(&config.rear_sonar, &clock, &[200; 9]),
    };
    let mut car = Car::new(&config, parts).unwrap();
    let mut camera = MockCamera::new();
    let mut sink = Telemetry::default();

    car.throttle_mut().set_throttle(0.5).unwrap();
    let mut backed_off_at = None;
    for tick in 0..3 {
        let state = car.sample(&mut camera, &mut sink).unwrap();
        if state.front_distance < STOP_DISTANCE_MM && backed_off_at.is_none() {
            car.throttle_mut().set_throttle(-0.4).unwrap();
            car.steering_mut().turn_left(0.5).unwrap();
            backed_off_at = Some(tick);
        }
    }

    assert_eq!(backed_off_at, Some(2));
    assert_eq!(sink.0.len(), 3);
    assert!((sink.0[0] - 60.0 * MM_PER_POLL).abs() < 0.05);
    assert!((sink.0[2] - 12.0 * MM_PER_POLL).abs() < 0.05);
    assert!(sink.0.windows(2).all(|w| w[1] < w[0]));

    // The ESC saw a stop before the first reverse pulse.
    let offs: Vec<u16> = car
        .throttle()
        .pwm()
        .chip()
        .writes()
        .iter()
        .map(|w| w.off)
        .collect();
    let first_reverse = offs.iter().position(|&off| off < 552).unwrap();
    assert_eq!(offs[first_reverse - 1], 614);
    assert_eq!(car.throttle().get_throttle(), -0.4);
    assert_eq!(car.steering().get_rotation(), -0.5);

    car.reset().unwrap();
    assert_eq!(car.throttle().get_throttle(), 0.0);
    assert_eq!(car.steering().get_rotation(), -0.5);
}
