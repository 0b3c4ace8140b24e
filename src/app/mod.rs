//! Application core: the car and the port traits it is written against.
//!
//! Nothing in here touches a file, a bus or a pin directly.  All hardware
//! access goes through the **port traits** in [`ports`], so the whole
//! layer is testable with the mock adapters.

pub mod car;
pub mod events;
pub mod ports;
pub mod state;

pub use car::{Car, CarParts};
pub use state::{CarState, Frame};
