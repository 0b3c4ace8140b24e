//! Driver-set selection: builds the [`Car`] from configuration.
//!
//! This is the only place that knows which concrete adapters exist.  The
//! choice between the mock driver set and the real one is made once, here,
//! from `CarConfig::development`; nothing downstream can tell the two apart.
//!
//! | Mode        | PWM chip                     | Sonar pins  | Clock         |
//! |-------------|------------------------------|-------------|---------------|
//! | development | `MockPwmChip`                | `MockPin`   | `SystemClock` |
//! | production  | `Pca9685` on `/dev/i2c-<n>`  | `SysfsPin`  | `SystemClock` |
//!
//! Production needs the `linux` feature (for the I2C character device).

use log::info;

use crate::adapters::mock::{MockPin, MockPwmChip};
use crate::adapters::time::SystemClock;
use crate::app::car::{Car, CarParts};
use crate::app::ports::{Clock, Direction, GpioPin, PwmChip, RangeFinder};
use crate::config::{CarConfig, SonarConfig};
use crate::error::Result;
use crate::sensors::ranger::UltrasonicRanger;

/// A car whose driver set was chosen at runtime.
pub type DynCar = Car<Box<dyn PwmChip>, Box<dyn Clock>, Box<dyn RangeFinder>>;

/// Validate `config` and build the driver set it selects.
pub fn build_car(config: &CarConfig) -> Result<DynCar> {
    config.validate()?;
    let parts = if config.development {
        info!("hardware: development mode, using mock drivers");
        development_parts(config)?
    } else {
        info!("hardware: production mode");
        production_parts(config)?
    };
    Car::new(config, parts)
}

type DynParts = CarParts<Box<dyn PwmChip>, Box<dyn Clock>, Box<dyn RangeFinder>>;

fn development_parts(config: &CarConfig) -> Result<DynParts> {
    let ranger = |sonar: &SonarConfig| -> Result<Box<dyn RangeFinder>> {
        let trigger = MockPin::from_ref(&sonar.trigger, Direction::Out)?;
        let echo = MockPin::from_ref(&sonar.echo, Direction::In)?;
        boxed_ranger(trigger, echo, sonar)
    };
    Ok(CarParts {
        steering_chip: Box::new(MockPwmChip::new()),
        throttle_chip: Box::new(MockPwmChip::new()),
        clock: Box::new(SystemClock::new()),
        front_ranger: ranger(&config.front_sonar)?,
        rear_ranger: ranger(&config.rear_sonar)?,
    })
}

#[cfg(feature = "linux")]
fn production_parts(config: &CarConfig) -> Result<DynParts> {
    use crate::adapters::sysfs_gpio::SysfsPin;

    let ranger = |sonar: &SonarConfig| -> Result<Box<dyn RangeFinder>> {
        let trigger = SysfsPin::from_ref(&sonar.trigger)?;
        let echo = SysfsPin::from_ref(&sonar.echo)?;
        boxed_ranger(trigger, echo, sonar)
    };
    Ok(CarParts {
        steering_chip: linux::open_pca9685(config.steering.i2c_bus, config.pwm.i2c_address)?,
        throttle_chip: linux::open_pca9685(config.throttle.i2c_bus, config.pwm.i2c_address)?,
        clock: Box::new(SystemClock::new()),
        front_ranger: ranger(&config.front_sonar)?,
        rear_ranger: ranger(&config.rear_sonar)?,
    })
}

#[cfg(not(feature = "linux"))]
fn production_parts(_config: &CarConfig) -> Result<DynParts> {
    Err(crate::error::ConfigError::Unsupported(
        "production drivers need the `linux` feature; run with --dev",
    )
    .into())
}

fn boxed_ranger<G: GpioPin + 'static>(
    trigger: G,
    echo: G,
    sonar: &SonarConfig,
) -> Result<Box<dyn RangeFinder>> {
    Ok(Box::new(UltrasonicRanger::new(
        trigger,
        echo,
        SystemClock::new(),
        sonar,
    )?))
}

#[cfg(feature = "linux")]
mod linux {
    use linux_embedded_hal::I2cdev;
    use log::error;

    use crate::adapters::pca9685::{Pca9685, chip_name};
    use crate::adapters::time::SystemClock;
    use crate::app::ports::PwmChip;
    use crate::error::{HardwareFault, Result};

    pub(super) fn open_pca9685(bus: u8, address: u8) -> Result<Box<dyn PwmChip>> {
        let path = format!("/dev/i2c-{bus}");
        let i2c = I2cdev::new(&path).map_err(|e| {
            let name = chip_name(bus, address);
            let err = std::io::Error::from(e);
            error!("{name}: cannot open {path}: {err}");
            HardwareFault::io(name, &err)
        })?;
        Ok(Box::new(Pca9685::new(i2c, SystemClock::new(), bus, address)?))
    }
}
