use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::crc::{Crc8, DallasCrc};
use crate::onewire::OneWire;

/// Decoded DS18B20 temperature register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureReading {
    /// Whole degrees Celsius.
    pub integer: u16,
    /// Four decimal digits, in steps of 0.0625 C.
    pub fraction: u16,
    /// Low 12 bits of the temperature register.
    pub raw: u16,
}

impl TemperatureReading {
    pub const ZERO: Self = Self {
        integer: 0,
        fraction: 0,
        raw: 0,
    };

    /// Decode a temperature register, assuming a non-negative reading.
    pub const fn from_raw(register: u16) -> Self {
        let raw = register & 0x0FFF;
        Self {
            integer: (raw & 0x0FF0) >> 4,
            fraction: (raw & 0x000F) * 625,
            raw,
        }
    }

    /// Signed reading in 1/16 C, sign-extended from bit 11.
    pub const fn sixteenths(&self) -> i16 {
        ((self.raw << 4) as i16) >> 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError<E> {
    /// No presence pulse after a reset.
    NoPresence,
    /// Scratchpad checksum mismatch.
    CrcMismatch,
    /// The conversion did not finish within the configured poll limit.
    ConversionTimeout,
    Pin(E),
}

impl<E> From<E> for SensorError<E> {
    fn from(e: E) -> Self {
        SensorError::Pin(e)
    }
}

impl<E: fmt::Debug> fmt::Display for SensorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::NoPresence => f.write_str("no sensor present"),
            SensorError::CrcMismatch => f.write_str("scratchpad crc mismatch"),
            SensorError::ConversionTimeout => f.write_str("conversion timed out"),
            SensorError::Pin(e) => write!(f, "pin error: {e:?}"),
        }
    }
}

/// DS18B20 temperature sensor driver, single sensor on the bus.
pub struct Ds18b20<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    bus: OneWire<P, D>,
    conversion_limit: Option<u32>,
}

impl<P, D> Ds18b20<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Start a temperature conversion.
    pub const FN_CONVERT_T: u8 = 0x44;
    /// Read contents of the scratchpad containing the temperature.
    pub const FN_READ_SCRATCHPAD: u8 = 0xBE;
    pub const FN_WRITE_SCRATCHPAD: u8 = 0x4E;
    pub const FN_COPY_SCRATCHPAD: u8 = 0x48;
    pub const FN_RECALL_E2: u8 = 0xB8;
    pub const FN_READ_POWER_SUPPLY: u8 = 0xB4;

    const SCRATCHPAD_LENGTH: usize = 9;

    /// Driver that waits for a conversion for as long as it takes.
    ///
    /// A sensor that never reports completion blocks the caller forever.
    /// Use [`with_conversion_limit`](Self::with_conversion_limit) to bound
    /// the wait.
    pub fn new(bus: OneWire<P, D>) -> Self {
        Self {
            bus,
            conversion_limit: None,
        }
    }

    /// Give up after `slots` read slots (~60 us each) without completion.
    pub fn with_conversion_limit(bus: OneWire<P, D>, slots: u32) -> Self {
        Self {
            bus,
            conversion_limit: Some(slots),
        }
    }

    pub fn release(self) -> OneWire<P, D> {
        self.bus
    }

    /// Run a full conversion and read the result.
    pub fn read_temperature(&mut self) -> Result<TemperatureReading, SensorError<P::Error>> {
        self.start()?;
        self.wait_for_conversion()?;

        let scratchpad = self.read_scratchpad()?;
        if !DallasCrc::verify(&scratchpad, Self::SCRATCHPAD_LENGTH - 1) {
            self.bus.reset()?;
            return Err(SensorError::CrcMismatch);
        }
        if !self.bus.reset()? {
            return Err(SensorError::NoPresence);
        }

        Ok(TemperatureReading::from_raw(u16::from_le_bytes([
            scratchpad[0],
            scratchpad[1],
        ])))
    }

    fn start(&mut self) -> Result<(), SensorError<P::Error>> {
        self.select()?;
        self.bus.write_byte(Self::FN_CONVERT_T)?;
        Ok(())
    }

    /// Reset and address the only sensor on the bus.
    fn select(&mut self) -> Result<(), SensorError<P::Error>> {
        if !self.bus.reset()? {
            return Err(SensorError::NoPresence);
        }
        self.bus.write_byte(OneWire::<P, D>::COMMAND_SKIP_ROM)?;
        Ok(())
    }

    /// The sensor holds read slots low until the conversion is done.
    fn wait_for_conversion(&mut self) -> Result<(), SensorError<P::Error>> {
        match self.conversion_limit {
            None => {
                while !self.bus.read_bit()? {}
                Ok(())
            }
            Some(slots) => {
                for _ in 0..slots {
                    if self.bus.read_bit()? {
                        return Ok(());
                    }
                }
                Err(SensorError::ConversionTimeout)
            }
        }
    }

    fn read_scratchpad(&mut self) -> Result<[u8; 9], SensorError<P::Error>> {
        self.select()?;
        self.bus.write_byte(Self::FN_READ_SCRATCHPAD)?;

        let mut data = [0; 9];
        for byte in data.iter_mut() {
            *byte = self.bus.read_byte()?;
        }
        Ok(data)
    }
}
