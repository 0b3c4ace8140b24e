//! Steering and throttle driven through a whole car on mock hardware.

use super::mock_hw::{self, offs};

use starcar::adapters::time::SimClock;
use starcar::config::CarConfig;
use starcar::drivers::steering::DEFAULT_TURN;
use starcar::drivers::throttle::DEFAULT_STEP;

/// Off-ticks at 100 Hz / 4096 steps.
const STOPPED: u16 = 614; // 1.5 ms
const STALL_MIN: u16 = 552; // 1.35 ms
const STALL_MAX: u16 = 675; // 1.65 ms

fn test_car() -> (mock_hw::TestCar, SimClock) {
    let clock = SimClock::new();
    let car = mock_hw::car(&CarConfig::development(), &clock, vec![false], vec![false]);
    (car, clock)
}

#[test]
fn construction_writes_neutral_pulses_on_the_right_channels() {
    let (car, _) = test_car();
    let steering = car.steering().pwm().chip().writes();
    let throttle = car.throttle().pwm().chip().writes();
    assert_eq!(steering.len(), 1);
    assert_eq!((steering[0].channel, steering[0].off), (7, STOPPED));
    assert_eq!((throttle[0].channel, throttle[0].off), (6, STOPPED));
    assert_eq!(car.steering().pwm().chip().frequency_hz(), Some(100));
}

#[test]
fn throttle_sweep_never_lands_in_the_stall_band() {
    let (mut car, _) = test_car();
    let mut t = -0.7;
    while t <= 0.7 {
        car.throttle_mut().set_throttle(t).unwrap();
        t += 0.01;
    }
    for off in offs(car.throttle().pwm().chip()) {
        assert!(
            off == STOPPED || off <= STALL_MIN || off >= STALL_MAX,
            "off tick {off} inside the stall band"
        );
    }
}

#[test]
fn forward_to_reverse_passes_through_stop() {
    let (mut car, clock) = test_car();
    car.throttle_mut().set_throttle(0.5).unwrap();
    let before = car.throttle().pwm().chip().writes().len();
    let t0 = clock.elapsed_us();

    car.throttle_mut().set_throttle(-0.6).unwrap();

    let ramp = &offs(car.throttle().pwm().chip())[before..];
    // stop, floor (1.325 ms), stop, target (1.2 ms)
    assert_eq!(ramp, &[STOPPED, 542, STOPPED, 491]);
    assert_eq!(clock.elapsed_us() - t0, 150_000);
    assert_eq!(car.throttle().get_throttle(), -0.6);
}

#[test]
fn demo_sequence_ends_centred_and_stopped() {
    let (mut car, _) = test_car();
    for _ in 0..10 {
        car.throttle_mut().decelerate(DEFAULT_STEP).unwrap();
    }
    assert_eq!(car.throttle().get_throttle(), -0.6);
    for _ in 0..20 {
        car.throttle_mut().accelerate(DEFAULT_STEP).unwrap();
    }
    assert_eq!(car.throttle().get_throttle(), 0.6);
    car.throttle_mut().reset().unwrap();

    for _ in 0..12 {
        car.steering_mut().turn_left(DEFAULT_TURN).unwrap();
    }
    assert_eq!(car.steering().get_rotation(), -1.0);
    assert_eq!(car.steering().pwm().chip().last_write().unwrap().off, 409);
    for _ in 0..24 {
        car.steering_mut().turn_right(DEFAULT_TURN).unwrap();
    }
    assert_eq!(car.steering().get_rotation(), 1.0);
    assert_eq!(car.steering().pwm().chip().last_write().unwrap().off, 819);
    car.steering_mut().reset().unwrap();

    assert_eq!(car.steering().get_pulse_length(), 1.5);
    assert_eq!(car.throttle().get_pulse_length(), 1.5);
}

#[test]
fn configured_envelope_is_enforced() {
    let config = CarConfig::from_json_str(
        r#"{"development": true, "throttle": {"forward_max": 0.48, "backward_max": -0.35}}"#,
    )
    .unwrap();
    let clock = SimClock::new();
    let mut car = mock_hw::car(&config, &clock, vec![false], vec![false]);
    assert_eq!(car.throttle_mut().set_throttle(1.0).unwrap(), 0.48);
    car.throttle_mut().reset().unwrap();
    assert_eq!(car.throttle_mut().set_throttle(-1.0).unwrap(), -0.35);
}

#[test]
fn pwm_fault_leaves_actuator_state_intact() {
    let (mut car, _) = test_car();
    car.steering_mut().set_rotation(0.5).unwrap();
    car.steering_mut().pwm_mut().chip_mut().fail_next_write();
    let err = car.steering_mut().set_rotation(-0.5).unwrap_err();
    assert_eq!(err.device(), Some("mock-pwm"));
    assert_eq!(car.steering().get_rotation(), 0.5);
    assert_eq!(car.steering().get_pulse_length(), 1.75);
}
