//! Board configuration.

use embassy_stm32::time::{hz, Hertz};
use embassy_time::Duration;

/// SYSCLK after `embassy_stm32::init` with the default config (HSI16).
pub const CORE_CLOCK_HZ: u32 = 16_000_000;

/// Period of the sampling loop.
pub const SAMPLE_TICK: Duration = Duration::from_secs(1);
/// Water temperature is read every this many ticks.
pub const TEMPERATURE_EVERY_TICKS: u32 = 3;
/// Air temperature and humidity are read every this many ticks.
pub const AIR_EVERY_TICKS: u32 = 5;

/// ADC conversions averaged into one depth reading.
pub const DEPTH_BURST_SAMPLES: usize = 20;
pub const DEPTH_BURST_INTERVAL: Duration = Duration::from_millis(1);

/// Read slots to wait for a DS18B20 conversion, ~60 us each. 12 bit
/// conversions take up to 750 ms.
pub const CONVERSION_POLL_LIMIT: u32 = 15_000;

pub const PWM_FREQUENCY: Hertz = hz(500);
