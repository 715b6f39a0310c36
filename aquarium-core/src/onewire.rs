use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Bit-banged 1-Wire bus master.
///
/// `pin` must be open-drain with an external pull-up: `set_low` drives the
/// line, `set_high` releases it. Every slot is a blocking busy-wait.
pub struct OneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pin: P,
    delay: D,
}

impl<P, D> OneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    // reset pulse, then presence sample 60 us after release, ~960 us in total
    const RESET_LOW_US: u32 = 480;
    const PRESENCE_SAMPLE_US: u32 = 60;
    const RESET_RECOVERY_US: u32 = 420;

    // write slot: 5 us low for a 1, held low for a 0
    const WRITE_LOW_US: u32 = 5;
    const WRITE_SLOT_US: u32 = 56;

    // read slot: 1 us low, sample at 15 us, finish the 60 us slot
    const READ_LOW_US: u32 = 1;
    const READ_SAMPLE_US: u32 = 14;
    const READ_RECOVERY_US: u32 = 45;

    // line recovery between slots
    const RECOVERY_US: u32 = 1;

    // Address all devices on the bus
    pub const COMMAND_SKIP_ROM: u8 = 0xCC;
    pub const COMMAND_READ_ROM: u8 = 0x33;
    pub const COMMAND_MATCH_ROM: u8 = 0x55;
    pub const COMMAND_SEARCH_ROM: u8 = 0xF0;
    pub const COMMAND_ALARM_SEARCH: u8 = 0xEC;

    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    /// Reset the bus. Returns `true` if a device answered with a presence
    /// pulse.
    pub fn reset(&mut self) -> Result<bool, P::Error> {
        self.pin.set_low()?;
        self.delay.delay_us(Self::RESET_LOW_US);

        self.pin.set_high()?;
        self.delay.delay_us(Self::PRESENCE_SAMPLE_US);

        // the pull-up keeps the line high unless a device holds it low
        let present = self.pin.is_low()?;
        self.delay.delay_us(Self::RESET_RECOVERY_US);

        Ok(present)
    }

    /// Write one bit.
    ///
    /// The low pulse of a 1 runs inside a critical section: stretched
    /// past 15 us the sensor latches a 0.
    pub fn write_bit(&mut self, bit: bool) -> Result<(), P::Error> {
        let (pin, delay) = (&mut self.pin, &mut self.delay);
        critical_section::with(|_| -> Result<(), P::Error> {
            pin.set_low()?;
            delay.delay_us(Self::WRITE_LOW_US);
            if bit {
                pin.set_high()?;
            }
            Ok(())
        })?;

        self.delay.delay_us(Self::WRITE_SLOT_US);
        if !bit {
            self.pin.set_high()?;
        }
        self.delay.delay_us(Self::RECOVERY_US);
        Ok(())
    }

    /// Read one bit.
    ///
    /// Pulse and sample run inside a critical section, the sensor only
    /// holds the line until ~15 us after the falling edge.
    pub fn read_bit(&mut self) -> Result<bool, P::Error> {
        let (pin, delay) = (&mut self.pin, &mut self.delay);
        let bit = critical_section::with(|_| -> Result<bool, P::Error> {
            pin.set_low()?;
            delay.delay_us(Self::READ_LOW_US);
            pin.set_high()?;
            delay.delay_us(Self::READ_SAMPLE_US);
            pin.is_high()
        })?;

        self.delay.delay_us(Self::READ_RECOVERY_US + Self::RECOVERY_US);
        Ok(bit)
    }

    /// Write a byte, least significant bit first.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), P::Error> {
        for pos in 0..8 {
            self.write_bit((byte >> pos) & 0x1 == 0x1)?;
        }
        Ok(())
    }

    /// Read a byte, least significant bit first.
    pub fn read_byte(&mut self) -> Result<u8, P::Error> {
        let mut byte = 0;
        for pos in 0..8 {
            if self.read_bit()? {
                byte |= 1 << pos;
            }
        }
        Ok(byte)
    }
}
