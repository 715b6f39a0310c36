//! SMBus slave protocol engine.
//!
//! The hardware layer detects address matches, data bytes and stop
//! conditions and calls the `on_*` hooks, usually from the I2C interrupt.
//! The engine collects the message, checks its length and PEC and hands
//! it to a [`SmbusHandler`], which may stage a response for the master's
//! next read.

use core::marker::PhantomData;

use heapless::Vec;

use crate::config::{address_byte, RX_BUFFER_LENGTH, SMB_WRITE, TX_BUFFER_LENGTH};
use crate::crc::{DefaultPec, PecStrategy};
use crate::error::BusError;

/// Byte sent when the master reads without a staged response.
pub const FALLBACK_BYTE: u8 = 0xFF;

pub type RxBuffer = Vec<u8, RX_BUFFER_LENGTH>;
pub type TxBuffer = Vec<u8, TX_BUFFER_LENGTH>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveState {
    Idle,
    /// Receiving a message from the master.
    WriteRequested,
    /// A response is staged and waiting for the master to read it.
    ReadRequested,
    /// The staged response is being clocked out.
    WriteReadRequested,
}

pub trait SmbusHandler {
    /// Expected message length for `command`, command code included and
    /// PEC excluded. `None` for an unknown command.
    fn expected_length(&self, command: u8) -> Option<usize>;

    /// Act on a validated message. Anything pushed into `response` is
    /// sent on the master's next read.
    fn process_message(&mut self, message: &[u8], response: &mut TxBuffer) -> Result<(), BusError>;
}

pub struct SmbusSlave<H, P = DefaultPec> {
    handler: H,
    address: u8,
    rx: RxBuffer,
    tx: TxBuffer,
    tx_count: usize,
    state: SlaveState,
    enable: bool,
    error: bool,
    overflow: bool,
    pec: u8,
    _pec: PhantomData<P>,
}

impl<H, P> SmbusSlave<H, P>
where
    H: SmbusHandler,
    P: PecStrategy,
{
    /// Create a disabled engine answering to the 7 bit `address`.
    pub const fn new(handler: H, address: u8) -> Self {
        Self {
            handler,
            address,
            rx: Vec::new(),
            tx: Vec::new(),
            tx_count: 0,
            state: SlaveState::Idle,
            enable: false,
            error: false,
            overflow: false,
            pec: P::SEED,
            _pec: PhantomData,
        }
    }

    /// Start acknowledging requests.
    pub fn enable(&mut self) {
        self.enable = true;
    }

    /// Stop acknowledging requests and drop any message in flight.
    pub fn disable(&mut self) {
        self.enable = false;
        self.reset_to_idle();
    }

    /// Drop the message in flight after a bus fault. The engine stays
    /// enabled and the error flag is left as it was.
    pub fn abort(&mut self) {
        self.reset_to_idle();
    }

    pub fn is_enabled(&self) -> bool {
        self.enable
    }

    /// Sticky error flag. Only [`clear_error`](Self::clear_error) resets it.
    pub fn error(&self) -> bool {
        self.error
    }

    pub fn clear_error(&mut self) {
        self.error = false;
    }

    pub fn state(&self) -> SlaveState {
        self.state
    }

    pub fn rx_count(&self) -> usize {
        self.rx.len()
    }

    pub fn tx_length(&self) -> usize {
        self.tx.len()
    }

    pub fn tx_count(&self) -> usize {
        self.tx_count
    }

    /// The staged response.
    pub fn response(&self) -> &[u8] {
        &self.tx
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Address matched with the write bit. Returns `false` to NACK.
    ///
    /// A staged response the master never read is discarded.
    pub fn on_write_requested(&mut self) -> bool {
        if !self.enable {
            return false;
        }
        self.rx.clear();
        self.tx.clear();
        self.tx_count = 0;
        self.overflow = false;
        self.pec = P::update(P::SEED, address_byte(self.address, SMB_WRITE));
        self.state = SlaveState::WriteRequested;
        true
    }

    /// A data byte arrived. Returns `false` to NACK it.
    pub fn on_byte_received(&mut self, byte: u8) -> bool {
        if !self.enable || self.state != SlaveState::WriteRequested {
            return false;
        }
        if self.rx.push(byte).is_err() {
            self.overflow = true;
            self.error = true;
            return false;
        }
        self.pec = P::update(self.pec, byte);
        true
    }

    /// The master finished writing, by a stop or a repeated start.
    ///
    /// Does nothing unless a write is in progress. On rejection the sticky
    /// error flag is set and the engine returns to idle.
    pub fn on_write_complete(&mut self) -> Result<(), BusError> {
        if self.state != SlaveState::WriteRequested {
            return Ok(());
        }
        match self.dispatch() {
            Ok(()) => {
                self.state = if self.tx.is_empty() {
                    SlaveState::Idle
                } else {
                    SlaveState::ReadRequested
                };
                Ok(())
            }
            Err(err) => {
                self.error = true;
                self.reset_to_idle();
                Err(err)
            }
        }
    }

    /// The master clocks out the next byte of the response.
    ///
    /// Reading with nothing staged sets the error flag. Reading past the
    /// end of the response yields [`FALLBACK_BYTE`].
    pub fn on_read_requested(&mut self) -> u8 {
        if !self.enable {
            return FALLBACK_BYTE;
        }
        match self.state {
            SlaveState::ReadRequested | SlaveState::WriteReadRequested => {
                self.state = SlaveState::WriteReadRequested;
                match self.tx.get(self.tx_count) {
                    Some(&byte) => {
                        self.tx_count += 1;
                        byte
                    }
                    None => FALLBACK_BYTE,
                }
            }
            _ => {
                self.error = true;
                FALLBACK_BYTE
            }
        }
    }

    /// Stop condition.
    ///
    /// Completes a pending write. A response that was (partly) read is
    /// finished; one not read yet is kept for a separate read transaction.
    pub fn on_transaction_complete(&mut self) -> Result<(), BusError> {
        let result = self.on_write_complete();
        if self.state == SlaveState::WriteReadRequested {
            self.reset_to_idle();
        }
        result
    }

    fn dispatch(&mut self) -> Result<(), BusError> {
        if self.overflow {
            return Err(BusError::BufferOverflow);
        }
        let command = *self.rx.first().ok_or(BusError::ProtocolLength)?;
        let expected = self
            .handler
            .expected_length(command)
            .ok_or(BusError::UnknownCommand)?;
        let length = self.checked_length(expected)?;

        self.tx.clear();
        self.tx_count = 0;
        let result = self.handler.process_message(&self.rx[..length], &mut self.tx);
        if result.is_err() {
            self.tx.clear();
        }
        result
    }

    /// Apply the length rule: exactly `expected` bytes, or `expected + 1`
    /// when the trailing byte is a valid PEC.
    fn checked_length(&self, expected: usize) -> Result<usize, BusError> {
        let count = self.rx.len();
        if count == expected {
            Ok(expected)
        } else if P::ENABLED && count == expected + 1 {
            // The PEC over address, message and PEC byte itself is zero
            if self.pec == 0 {
                Ok(expected)
            } else {
                Err(BusError::Integrity)
            }
        } else {
            Err(BusError::ProtocolLength)
        }
    }

    fn reset_to_idle(&mut self) {
        self.rx.clear();
        self.tx.clear();
        self.tx_count = 0;
        self.overflow = false;
        self.state = SlaveState::Idle;
    }
}
