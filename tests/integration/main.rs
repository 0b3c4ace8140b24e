//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! the mock adapters and a simulated clock.  Everything runs on the host
//! with no real hardware required.

mod actuator_tests;
mod car_tests;
mod mock_hw;
mod sonar_tests;
