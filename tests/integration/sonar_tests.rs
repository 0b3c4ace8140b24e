//! Ranger timing and the median sonar on scripted echo lines.

use std::fs;

use super::mock_hw::{self, MM_PER_POLL, ScriptedRanger, pings};

use starcar::adapters::sysfs_gpio::SysfsPin;
use starcar::adapters::time::SimClock;
use starcar::app::ports::RangeFinder;
use starcar::config::SonarConfig;
use starcar::error::{Error, FaultKind};
use starcar::pins::Port;
use starcar::sensors::ranger::{DistanceUnit, EchoMode, EchoOutcome, UltrasonicRanger};
use starcar::sensors::sonar::SonarSensor;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.05
}

#[test]
fn consecutive_pings_are_timed_independently() {
    let clock = SimClock::new();
    let mut ranger = mock_hw::ranger(&SonarConfig::front(), &clock, pings(&[10, 20, 5]));
    assert!(close(ranger.measure().unwrap(), 10.0 * MM_PER_POLL));
    assert!(close(ranger.measure().unwrap(), 20.0 * MM_PER_POLL));
    assert!(close(ranger.measure().unwrap(), 5.0 * MM_PER_POLL));
    // Script exhausted: echo stays low, i.e. already received.
    assert!(ranger.measure().unwrap() < 1.0);
}

#[test]
fn lost_echo_waits_exactly_one_round_trip() {
    let clock = SimClock::new();
    let mut ranger = mock_hw::ranger(&SonarConfig::front(), &clock, vec![true]);
    let t0 = clock.elapsed_us();
    let reading = ranger.measure_reading().unwrap();
    let waited = clock.elapsed_us() - t0 - 10_010;
    assert_eq!(reading.outcome, EchoOutcome::Timeout);
    assert_eq!(reading.distance, ranger.max_range());
    // Bounded by the timeout plus one poll interval.
    assert!(waited >= ranger.timeout_us() && waited < ranger.timeout_us() + 100);
}

#[test]
fn median_sonar_shrugs_off_lost_echoes() {
    let clock = SimClock::new();
    // Three real echoes, then the line sticks high: two timeouts.
    let mut echo = pings(&[10, 12, 11]);
    echo.push(true);
    let ranger = mock_hw::ranger(&SonarConfig::front(), &clock, echo);
    let mut sonar = SonarSensor::new(ranger, 5);
    for _ in 0..5 {
        sonar.tick().unwrap();
    }
    let distance = sonar.distance().unwrap();
    assert!(close(distance, 12.0 * MM_PER_POLL), "median {distance}");
}

#[test]
fn median_sonar_with_spurious_readings() {
    let mut sonar = SonarSensor::new(ScriptedRanger::new(&[50.0, 10.0, 60.0, 55.0, 52.0]), 5);
    for _ in 0..4 {
        sonar.tick().unwrap();
    }
    assert_eq!(sonar.distance(), None);
    sonar.tick().unwrap();
    assert_eq!(sonar.distance(), Some(52.0));
}

#[test]
fn edge_timing_in_centimetres() {
    let config = SonarConfig {
        echo_mode: EchoMode::EdgeTiming,
        unit: DistanceUnit::Centimeters,
        ..SonarConfig::rear()
    };
    let clock = SimClock::new();
    // Echo already high when timing starts: the rise is taken as that instant.
    let mut levels = vec![true; 31];
    levels.push(false);
    let mut ranger = mock_hw::ranger(&config, &clock, levels);
    let reading = ranger.measure_reading().unwrap();
    assert_eq!(reading.elapsed_us, 3_000);
    assert!(close(reading.distance, 30.0 * MM_PER_POLL / 10.0));
}

#[test]
fn hotter_air_reads_further() {
    let cold = SonarConfig {
        temperature_c: 0.0,
        ..SonarConfig::front()
    };
    let hot = SonarConfig {
        temperature_c: 40.0,
        ..SonarConfig::front()
    };
    let clock = SimClock::new();
    let mut a = mock_hw::ranger(&cold, &clock, pings(&[50]));
    let mut b = mock_hw::ranger(&hot, &clock, pings(&[50]));
    assert!(b.measure().unwrap() > a.measure().unwrap());
}

#[test]
fn real_pin_without_kernel_support_faults_with_pin_identity() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("export"), "").unwrap();
    fs::write(root.path().join("unexport"), "").unwrap();
    let trigger = SysfsPin::with_root(root.path(), Port::J21, "37").unwrap();
    let echo = SysfsPin::with_root(root.path(), Port::J21, "31").unwrap();

    let err = UltrasonicRanger::new(trigger, echo, SimClock::new(), &SonarConfig::front())
        .err()
        .unwrap();
    assert_eq!(err.device(), Some("gpio187 (J21-37)"));
    assert!(matches!(
        err,
        Error::Hardware(ref f) if matches!(f.kind, FaultKind::Io(_))
    ));
}
