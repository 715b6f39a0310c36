//! Table-driven CRC-8 used for the SMBus packet error check (PEC) and for
//! the 1-Wire scratchpad checksum.
//!
//! Both checksums use the same update rule, `crc = TABLE[crc ^ byte]`, and
//! differ only in polynomial, bit order and seed. Neither applies a final
//! XOR, so running the accumulator over a message followed by its own
//! checksum always ends at zero.

use crate::config::SMB_CRC_POLYNOMIAL;

/// Dallas/Maxim 1-Wire polynomial `x^8 + x^5 + x^4 + 1`, reflected.
const DALLAS_POLYNOMIAL_REFLECTED: u8 = 0x8C;

const fn msb_first_table(polynomial: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ polynomial
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn lsb_first_table(polynomial: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x01 != 0 {
                (crc >> 1) ^ polynomial
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static PEC_TABLE: [u8; 256] = msb_first_table(SMB_CRC_POLYNOMIAL);
static DALLAS_TABLE: [u8; 256] = lsb_first_table(DALLAS_POLYNOMIAL_REFLECTED);

/// An 8-bit CRC with a fixed seed.
pub trait Crc8 {
    /// Accumulator value at the start of every message.
    const SEED: u8;

    /// Feed one byte into the accumulator.
    fn update(crc: u8, byte: u8) -> u8;

    fn checksum(data: &[u8]) -> u8 {
        data.iter().fold(Self::SEED, |crc, &byte| Self::update(crc, byte))
    }

    /// Write the checksum of `buf[..len]` into `buf[len]`.
    ///
    /// Returns the checksum, or `None` when the buffer has no room for it.
    fn append(buf: &mut [u8], len: usize) -> Option<u8> {
        let crc = Self::checksum(buf.get(..len)?);
        *buf.get_mut(len)? = crc;
        Some(crc)
    }

    /// Check `buf[len]` against the checksum of `buf[..len]`.
    fn verify(buf: &[u8], len: usize) -> bool {
        match (buf.get(..len), buf.get(len)) {
            (Some(data), Some(&crc)) => Self::checksum(data) == crc,
            _ => false,
        }
    }
}

/// SMBus PEC: polynomial 0x07, seeded with 0xFF.
pub struct SmbusPec;

impl Crc8 for SmbusPec {
    const SEED: u8 = 0xFF;

    #[inline]
    fn update(crc: u8, byte: u8) -> u8 {
        PEC_TABLE[usize::from(crc ^ byte)]
    }
}

/// Dallas/Maxim 1-Wire CRC, seeded with 0x00.
pub struct DallasCrc;

impl Crc8 for DallasCrc {
    const SEED: u8 = 0x00;

    #[inline]
    fn update(crc: u8, byte: u8) -> u8 {
        DALLAS_TABLE[usize::from(crc ^ byte)]
    }
}

/// How the bus engine computes the running PEC of a message.
///
/// Selected at build time through [`DefaultPec`].
pub trait PecStrategy {
    /// Whether a trailing PEC byte is accepted at all.
    const ENABLED: bool;

    /// Seed of the running PEC.
    const SEED: u8 = 0xFF;

    fn update(pec: u8, byte: u8) -> u8;
}

/// No PEC support: an extra trailing byte is a length error.
pub struct NoPec;

impl PecStrategy for NoPec {
    const ENABLED: bool = false;

    #[inline]
    fn update(pec: u8, _byte: u8) -> u8 {
        pec
    }
}

/// PEC through the flash lookup table.
pub struct LookupPec;

impl PecStrategy for LookupPec {
    const ENABLED: bool = true;

    #[inline]
    fn update(pec: u8, byte: u8) -> u8 {
        SmbusPec::update(pec, byte)
    }
}

/// PEC computed bit by bit, trading speed for 256 bytes of flash.
pub struct ComputedPec;

impl PecStrategy for ComputedPec {
    const ENABLED: bool = true;

    fn update(pec: u8, byte: u8) -> u8 {
        let mut crc = pec ^ byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ SMB_CRC_POLYNOMIAL
            } else {
                crc << 1
            };
        }
        crc
    }
}

#[cfg(feature = "pec-lookup")]
pub type DefaultPec = LookupPec;

#[cfg(all(feature = "pec-calculation", not(feature = "pec-lookup")))]
pub type DefaultPec = ComputedPec;

#[cfg(not(any(feature = "pec-lookup", feature = "pec-calculation")))]
pub type DefaultPec = NoPec;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pec_table_matches_reference_entries() {
        assert_eq!(PEC_TABLE[0x00], 0x00);
        assert_eq!(PEC_TABLE[0x01], 0x07);
        assert_eq!(PEC_TABLE[0x08], 0x38);
        assert_eq!(PEC_TABLE[0x80], 0x89);
        assert_eq!(PEC_TABLE[0xFF], 0xF3);
    }

    #[test]
    fn smbus_polynomial_check_value() {
        // CRC-8/SMBUS check value, computed from a zero seed
        let crc = b"123456789"
            .iter()
            .fold(0, |crc, &byte| SmbusPec::update(crc, byte));
        assert_eq!(crc, 0xF4);
    }

    #[test]
    fn dallas_check_value() {
        // CRC-8/MAXIM-DOW check value
        assert_eq!(DallasCrc::checksum(b"123456789"), 0xA1);
    }

    #[test]
    fn computed_pec_matches_lookup() {
        for pec in 0..=255u8 {
            for byte in [0x00, 0x01, 0x5A, 0x80, 0xC3, 0xFF] {
                assert_eq!(ComputedPec::update(pec, byte), LookupPec::update(pec, byte));
            }
        }
    }

    #[test]
    fn disabled_pec_never_changes() {
        assert_eq!(NoPec::update(0xFF, 0x12), 0xFF);
        assert!(!NoPec::ENABLED);
    }

    #[test]
    fn append_writes_checksum_after_data() {
        let mut buf = [0x01, 0x90, 0x00];
        let crc = SmbusPec::append(&mut buf, 2);
        assert_eq!(crc, Some(SmbusPec::checksum(&[0x01, 0x90])));
        assert_eq!(buf[2], SmbusPec::checksum(&[0x01, 0x90]));
        assert!(SmbusPec::verify(&buf, 2));
    }

    #[test]
    fn append_without_room_fails() {
        let mut buf = [0x01, 0x90];
        assert_eq!(SmbusPec::append(&mut buf, 2), None);
        assert_eq!(buf, [0x01, 0x90]);
    }

    #[test]
    fn verify_rejects_missing_checksum() {
        assert!(!SmbusPec::verify(&[0x01, 0x90], 2));
        assert!(!DallasCrc::verify(&[], 0));
    }

    #[test]
    fn message_followed_by_checksum_accumulates_to_zero() {
        let data = [0x64, 0x11, 0x07, 0x1E, 0x3C];
        let crc = LookupPec::update(
            data.iter().fold(0xFF, |pec, &byte| LookupPec::update(pec, byte)),
            SmbusPec::checksum(&data),
        );
        assert_eq!(crc, 0);
    }
}
