//! Last known sensor readings, shared between the sampling loop and the
//! bus interrupt.
//!
//! Every access runs inside a critical section, so the interrupt never
//! sees a half-written snapshot.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::ds18b20::TemperatureReading;
use crate::rht03::AirReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    /// Water temperature from the DS18B20.
    pub temperature: TemperatureReading,
    /// Air temperature and humidity from the RHT03.
    pub humidity: AirReading,
    /// Averaged depth sensor reading.
    pub depth: u16,
}

impl Telemetry {
    pub const ZERO: Self = Self {
        temperature: TemperatureReading::ZERO,
        humidity: AirReading::ZERO,
        depth: 0,
    };
}

pub struct SharedTelemetry {
    inner: Mutex<CriticalSectionRawMutex, Cell<Telemetry>>,
}

impl SharedTelemetry {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(Telemetry::ZERO)),
        }
    }

    /// Copy of the whole snapshot.
    pub fn snapshot(&self) -> Telemetry {
        self.inner.lock(|cell| cell.get())
    }

    pub fn publish_temperature(&self, temperature: TemperatureReading) {
        self.update(|telemetry| telemetry.temperature = temperature);
    }

    pub fn publish_humidity(&self, humidity: AirReading) {
        self.update(|telemetry| telemetry.humidity = humidity);
    }

    pub fn publish_depth(&self, depth: u16) {
        self.update(|telemetry| telemetry.depth = depth);
    }

    fn update(&self, f: impl FnOnce(&mut Telemetry)) {
        self.inner.lock(|cell| {
            let mut telemetry = cell.get();
            f(&mut telemetry);
            cell.set(telemetry);
        });
    }
}

impl Default for SharedTelemetry {
    fn default() -> Self {
        Self::new()
    }
}
