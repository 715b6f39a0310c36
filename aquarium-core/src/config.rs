//! Build-time protocol configuration.

/// The 7 bit slave address of this device.
pub const SMB_OWN_ADDRESS: u8 = 0x32;

/// Maximum number of data bytes received in one message (at most 32).
pub const RX_MAX_LENGTH: usize = 32;

/// Maximum number of data bytes transmitted in one response (at most 32).
pub const TX_MAX_LENGTH: usize = 32;

pub const COMMAND_CODE_LENGTH: usize = 1;
pub const BYTE_COUNT_LENGTH: usize = 1;
pub const PEC_LENGTH: usize = 1;

/// Receive buffer, large enough for the control bytes and a trailing PEC.
pub const RX_BUFFER_LENGTH: usize =
    COMMAND_CODE_LENGTH + BYTE_COUNT_LENGTH + RX_MAX_LENGTH + PEC_LENGTH;

/// Transmit buffer. A bus PEC is never placed here.
pub const TX_BUFFER_LENGTH: usize = BYTE_COUNT_LENGTH + TX_MAX_LENGTH;

/// Value of the R/W bit for a write.
pub const SMB_WRITE: u8 = 0;
/// Value of the R/W bit for a read.
pub const SMB_READ: u8 = 1;

/// CRC polynomial of the SMBus packet error check.
pub const SMB_CRC_POLYNOMIAL: u8 = 0x07;

/// Number of LED dimming channels.
#[cfg(not(feature = "channels-8"))]
pub const CHANNEL_COUNT: usize = 6;
#[cfg(feature = "channels-8")]
pub const CHANNEL_COUNT: usize = 8;

/// Address byte as it appears on the wire, R/W bit appended.
pub const fn address_byte(address: u8, rw: u8) -> u8 {
    (address << 1) | rw
}

const _: () = assert!(RX_MAX_LENGTH <= 32 && TX_MAX_LENGTH <= 32);
const _: () = assert!(CHANNEL_COUNT + 1 <= RX_MAX_LENGTH);
