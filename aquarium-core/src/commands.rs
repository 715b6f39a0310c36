use crate::channels::{ChannelOutput, Intensities};
use crate::config::CHANNEL_COUNT;
use crate::crc::{Crc8, SmbusPec};
use crate::error::BusError;
use crate::smbus_slave::{SmbusHandler, TxBuffer};
use crate::telemetry::SharedTelemetry;

pub const AQ_CMD_SETCHANNELS: u8 = 0x11;
pub const AQ_CMD_GET_TEMP: u8 = 0x12;
pub const AQ_CMD_GET_DEPTH: u8 = 0x13;
pub const AQ_CMD_GET_AIR_TEMP_HUMIDITY: u8 = 0x14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    SetChannels = AQ_CMD_SETCHANNELS,
    GetTemp = AQ_CMD_GET_TEMP,
    GetDepth = AQ_CMD_GET_DEPTH,
    GetAirTempHumidity = AQ_CMD_GET_AIR_TEMP_HUMIDITY,
}

impl Command {
    /// Message length without the PEC byte.
    pub const fn expected_length(self) -> usize {
        match self {
            // command, byte count, intensities, checksum
            Command::SetChannels => 1 + 1 + CHANNEL_COUNT + 1,
            Command::GetTemp | Command::GetDepth | Command::GetAirTempHumidity => 1,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = BusError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            AQ_CMD_SETCHANNELS => Command::SetChannels,
            AQ_CMD_GET_TEMP => Command::GetTemp,
            AQ_CMD_GET_DEPTH => Command::GetDepth,
            AQ_CMD_GET_AIR_TEMP_HUMIDITY => Command::GetAirTempHumidity,
            _ => return Err(BusError::UnknownCommand),
        })
    }
}

/// Command set of the aquarium controller.
///
/// GET commands answer with big-endian 16-bit fields followed by a
/// checksum byte. SETCHANNELS carries its own checksum over the
/// intensities and is applied entirely or not at all.
pub struct AquariumCommands<'a, O> {
    telemetry: &'a SharedTelemetry,
    channels: O,
}

impl<'a, O: ChannelOutput> AquariumCommands<'a, O> {
    pub const fn new(telemetry: &'a SharedTelemetry, channels: O) -> Self {
        Self {
            telemetry,
            channels,
        }
    }

    pub fn channels(&self) -> &O {
        &self.channels
    }

    fn set_channels(&mut self, message: &[u8]) -> Result<(), BusError> {
        let [_, byte_count, payload @ ..] = message else {
            return Err(BusError::ProtocolLength);
        };
        if usize::from(*byte_count) != CHANNEL_COUNT + 1 {
            return Err(BusError::ProtocolLength);
        }
        if !SmbusPec::verify(payload, CHANNEL_COUNT) {
            return Err(BusError::Integrity);
        }

        let mut intensities: Intensities = [0; CHANNEL_COUNT];
        intensities.copy_from_slice(&payload[..CHANNEL_COUNT]);
        self.channels.set_channels(&intensities);
        Ok(())
    }
}

impl<O: ChannelOutput> SmbusHandler for AquariumCommands<'_, O> {
    fn expected_length(&self, command: u8) -> Option<usize> {
        Command::try_from(command).ok().map(Command::expected_length)
    }

    fn process_message(&mut self, message: &[u8], response: &mut TxBuffer) -> Result<(), BusError> {
        let code = *message.first().ok_or(BusError::ProtocolLength)?;
        match Command::try_from(code)? {
            Command::SetChannels => self.set_channels(message),
            Command::GetTemp => {
                let temperature = self.telemetry.snapshot().temperature;
                stage_response(response, &temperature.raw.to_be_bytes())
            }
            Command::GetAirTempHumidity => {
                let air = self.telemetry.snapshot().humidity;
                let [t_hi, t_lo] = air.temperature.to_be_bytes();
                let [h_hi, h_lo] = air.humidity.to_be_bytes();
                stage_response(response, &[t_hi, t_lo, h_hi, h_lo])
            }
            Command::GetDepth => {
                let depth = self.telemetry.snapshot().depth;
                stage_response(response, &depth.to_be_bytes())
            }
        }
    }
}

fn stage_response(response: &mut TxBuffer, payload: &[u8]) -> Result<(), BusError> {
    response.clear();
    response
        .extend_from_slice(payload)
        .map_err(|_| BusError::BufferOverflow)?;
    response
        .push(SmbusPec::checksum(payload))
        .map_err(|_| BusError::BufferOverflow)
}
