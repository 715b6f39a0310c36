//! Aquarium controller core: SMBus slave engine, command set, sensor
//! drivers and the shared telemetry snapshot.
//!
//! Nothing in here touches a chip peripheral. Pins and delays come in
//! through `embedded-hal` traits, bus events through the
//! [`SmbusSlave`] hooks.

#![cfg_attr(not(test), no_std)]

pub mod channels;
pub mod commands;
pub mod config;
pub mod crc;
pub mod ds18b20;
pub mod error;
pub mod onewire;
pub mod rht03;
pub mod sampling;
pub mod smbus_slave;
pub mod telemetry;

pub use channels::{startup_ramp, ChannelBank, ChannelOutput, Intensities};
pub use commands::{AquariumCommands, Command};
pub use crc::{Crc8, DallasCrc, DefaultPec, PecStrategy, SmbusPec};
pub use ds18b20::{Ds18b20, SensorError, TemperatureReading};
pub use error::BusError;
pub use onewire::OneWire;
pub use rht03::{AirReading, HumidityError, Rht03};
pub use sampling::{burst_average, DepthFilter, Due, SampleSchedule};
pub use smbus_slave::{SlaveState, SmbusHandler, SmbusSlave, TxBuffer};
pub use telemetry::{SharedTelemetry, Telemetry};
