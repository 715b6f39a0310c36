use core::fmt;

/// Reasons the bus engine drops a message.
///
/// Every kind is handled the same way: the sticky error flag is set, the
/// message is discarded and the engine returns to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Byte count matches neither the expected length nor length + PEC.
    ProtocolLength,
    /// A PEC or payload checksum failed verification.
    Integrity,
    /// Command code not in the dispatch table.
    UnknownCommand,
    /// More bytes were received than the buffer holds.
    BufferOverflow,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BusError::ProtocolLength => "unexpected message length",
            BusError::Integrity => "integrity check failed",
            BusError::UnknownCommand => "unknown command code",
            BusError::BufferOverflow => "receive buffer overflow",
        })
    }
}

impl core::error::Error for BusError {}
