//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter      | Implements            | Connects to                   |
//! |--------------|-----------------------|-------------------------------|
//! | `sysfs_gpio` | GpioPin               | `/sys/class/gpio`             |
//! | `pca9685`    | PwmChip               | PCA9685 over any I2C bus      |
//! | `mock`       | GpioPin, PwmChip,     | nothing (development / tests) |
//! |              | FrameSource           |                               |
//! | `time`       | Clock                 | `std::time` / simulated time  |
//! | `log_sink`   | EventSink             | `log` facade                  |
//! | `hardware`   | (builds the car)      | all of the above              |

pub mod hardware;
pub mod log_sink;
pub mod mock;
pub mod pca9685;
pub mod sysfs_gpio;
pub mod time;
