//! RHT03 (DHT22) air temperature and humidity sensor.
//!
//! Single-wire protocol: the host pulls the line low to request a reading,
//! the sensor answers with an 80 us low / 80 us high handshake and then
//! 40 bits. Every bit starts with a 50 us low phase; the following high
//! phase lasts ~26 us for a 0 and ~70 us for a 1.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

const START_SIGNAL_LOW_US: u32 = 2_000;
const START_SIGNAL_RELEASE_US: u32 = 30;
// a high phase still running after this long is a 1
const BIT_SAMPLE_DELAY_US: u32 = 35;
const POLL_DELAY_US: u32 = 1;
const MAX_POLLS: u32 = 100;

/// Raw reading in tenths, as transmitted by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AirReading {
    /// Tenths of a degree Celsius, bit 15 set for negative values.
    pub temperature: u16,
    /// Tenths of a percent relative humidity.
    pub humidity: u16,
}

impl AirReading {
    pub const ZERO: Self = Self {
        temperature: 0,
        humidity: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HumidityError<E> {
    /// The sensor missed a handshake or bit edge.
    NoResponse,
    ChecksumMismatch,
    Pin(E),
}

impl<E> From<E> for HumidityError<E> {
    fn from(e: E) -> Self {
        HumidityError::Pin(e)
    }
}

impl<E: fmt::Debug> fmt::Display for HumidityError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HumidityError::NoResponse => f.write_str("no response from sensor"),
            HumidityError::ChecksumMismatch => f.write_str("checksum mismatch"),
            HumidityError::Pin(e) => write!(f, "pin error: {e:?}"),
        }
    }
}

pub struct Rht03<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pin: P,
    delay: D,
}

impl<P, D> Rht03<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    pub fn read(&mut self) -> Result<AirReading, HumidityError<P::Error>> {
        self.pin.set_low()?;
        self.delay.delay_us(START_SIGNAL_LOW_US);
        self.pin.set_high()?;
        self.delay.delay_us(START_SIGNAL_RELEASE_US);

        // handshake
        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut data = [0u8; 5];
        for byte in data.iter_mut() {
            for _ in 0..8 {
                *byte = (*byte << 1) | u8::from(self.read_bit()?);
            }
        }

        let checksum = data[..4]
            .iter()
            .fold(0u8, |sum, &byte| sum.wrapping_add(byte));
        if checksum != data[4] {
            return Err(HumidityError::ChecksumMismatch);
        }

        Ok(AirReading {
            humidity: u16::from_be_bytes([data[0], data[1]]),
            temperature: u16::from_be_bytes([data[2], data[3]]),
        })
    }

    fn read_bit(&mut self) -> Result<bool, HumidityError<P::Error>> {
        self.wait_for(true)?;
        self.delay.delay_us(BIT_SAMPLE_DELAY_US);
        let bit = self.pin.is_high()?;
        if bit {
            self.wait_for(false)?;
        }
        Ok(bit)
    }

    fn wait_for(&mut self, high: bool) -> Result<(), HumidityError<P::Error>> {
        for _ in 0..MAX_POLLS {
            if self.pin.is_high()? == high {
                return Ok(());
            }
            self.delay.delay_us(POLL_DELAY_US);
        }
        Err(HumidityError::NoResponse)
    }
}
