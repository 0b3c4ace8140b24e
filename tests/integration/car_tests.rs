//! Whole-car snapshots, event reporting and lifecycle.

use std::fs;

use super::mock_hw::{self, MM_PER_POLL, RecordingSink, ScriptedRanger, pings};

use starcar::adapters::hardware::build_car;
use starcar::adapters::mock::{MockCamera, MockPwmChip};
use starcar::adapters::time::SimClock;
use starcar::app::car::{Car, CarParts};
use starcar::app::events::CarEvent;
use starcar::app::ports::GpioPin;
use starcar::config::CarConfig;

#[test]
fn state_carries_median_distances_and_commands() {
    let clock = SimClock::new();
    let config = CarConfig::development();
    let mut car = mock_hw::car(
        &config,
        &clock,
        pings(&[40, 41, 39, 90, 40]),
        pings(&[8, 8, 8, 8, 8]),
    );
    car.steering_mut().set_rotation(0.25).unwrap();
    car.throttle_mut().set_throttle(0.4).unwrap();

    let state = car.get_state(&mut MockCamera::new()).unwrap();

    let [steering, throttle, front, rear] = state.sensors();
    assert_eq!((steering, throttle), (0.25, 0.4));
    assert!((front - 40.0 * MM_PER_POLL).abs() < 0.05);
    assert!((rear - 8.0 * MM_PER_POLL).abs() < 0.05);
    assert_eq!(state.frame.data.len(), 640 * 360 * 3);
}

#[test]
fn sample_reports_the_faulting_pin() {
    let parts = CarParts {
        steering_chip: MockPwmChip::new(),
        throttle_chip: MockPwmChip::new(),
        clock: SimClock::new(),
        front_ranger: ScriptedRanger::new(&[900.0]),
        rear_ranger: ScriptedRanger {
            fail_with: Some("gpio184 (J21-18)"),
            ..ScriptedRanger::new(&[0.0])
        },
    };
    let mut car = Car::new(&CarConfig::development(), parts).unwrap();
    let mut sink = RecordingSink::default();

    let err = car.sample(&mut MockCamera::new(), &mut sink).unwrap_err();

    assert_eq!(err.device(), Some("gpio184 (J21-18)"));
    assert!(matches!(
        sink.events.as_slice(),
        [CarEvent::HardwareFault { device, .. }] if device == "gpio184 (J21-18)"
    ));
}

#[test]
fn sample_emits_one_telemetry_event_per_tick() {
    let clock = SimClock::new();
    let mut car = mock_hw::car(&CarConfig::development(), &clock, vec![false], vec![false]);
    let mut sink = RecordingSink::default();
    let mut camera = MockCamera::new();
    for _ in 0..3 {
        car.sample(&mut camera, &mut sink).unwrap();
    }
    assert_eq!(sink.events.len(), 3);
    assert!(
        sink.events
            .iter()
            .all(|e| matches!(e, CarEvent::Telemetry(t) if t.throttle_pulse_ms == 1.5))
    );
    assert_eq!(camera.frames(), 3);
}

#[test]
fn shutdown_stops_centres_and_unexports() {
    let clock = SimClock::new();
    let mut car = mock_hw::car(&CarConfig::development(), &clock, vec![false], vec![false]);
    car.steering_mut().set_rotation(-0.8).unwrap();
    car.throttle_mut().set_throttle(0.3).unwrap();
    car.shutdown().unwrap();
    assert_eq!(car.steering().get_rotation(), 0.0);
    assert_eq!(car.throttle().get_throttle(), 0.0);
    assert!(!car.front_sonar().ranger().trigger().is_enabled());
    assert!(!car.rear_sonar().ranger().echo().is_enabled());
}

#[test]
fn development_build_reads_max_range_from_mock_pins() {
    // Mock echo pins read high forever: every ping times out.
    let mut config = CarConfig::development();
    config.front_sonar.sample_size = 1;
    config.rear_sonar.sample_size = 1;
    let mut car = build_car(&config).unwrap();
    let state = car.get_state(&mut MockCamera::new()).unwrap();
    assert_eq!(state.front_distance, 4000.0);
    assert_eq!(state.rear_distance, 4000.0);
    car.shutdown().unwrap();
}

#[test]
fn config_file_drives_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("car.json");
    fs::write(
        &path,
        r#"{
            "development": true,
            "steering": {"channel": 3},
            "throttle": {"forward_max": 0.3},
            "front_sonar": {"unit": "centimeters", "sample_size": 1},
            "rear_sonar": {"sample_size": 1}
        }"#,
    )
    .unwrap();
    let config = CarConfig::load(&path).unwrap();
    let mut car = build_car(&config).unwrap();
    assert_eq!(car.steering().pwm().channel(), 3);
    assert_eq!(car.throttle_mut().set_throttle(0.9).unwrap(), 0.3);
    let state = car.get_state(&mut MockCamera::new()).unwrap();
    assert_eq!(state.front_distance, 400.0);
    assert_eq!(state.rear_distance, 4000.0);
}

#[test]
fn bad_pin_in_config_is_rejected() {
    let err = CarConfig::from_json_str(
        r#"{"front_sonar": {"trigger": {"port": "J3A", "pin": "37"}}}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("no such pin"));
}
