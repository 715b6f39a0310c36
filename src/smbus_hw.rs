//! I2C1 in slave mode, feeding bus events into the shared engine.
//!
//! embassy-stm32 only drives the I2C peripheral as a master, so the
//! blocking driver is used to set up clocks, pins and timing, and the
//! slave registers are programmed directly through the PAC.

use aquarium_core::SlaveState;
use embassy_stm32::i2c::I2c;
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::mode::Blocking;
use embassy_stm32::pac;
use embassy_stm32::pac::i2c::vals::{Addmode, Dir};

use crate::signals::with_engine;

/// Owns the peripheral so its clock stays enabled.
pub struct SmbusSlaveHw {
    _i2c: I2c<'static, Blocking>,
}

impl SmbusSlaveHw {
    /// Reprogram a configured I2C1 as a slave on `address` and start
    /// taking bus interrupts.
    pub fn new(i2c: I2c<'static, Blocking>, address: u8) -> Self {
        let regs = pac::I2C1;

        regs.cr1().modify(|w| w.set_pe(false));
        regs.oar1().write(|w| {
            w.set_oa1(u16::from(address) << 1);
            w.set_oa1mode(Addmode::BIT7);
            w.set_oa1en(true);
        });
        regs.cr1().modify(|w| {
            w.set_addrie(true);
            w.set_rxie(true);
            w.set_txie(true);
            w.set_stopie(true);
            w.set_nackie(true);
            w.set_errie(true);
            w.set_pe(true);
        });

        interrupt::I2C1.set_priority(Priority::P1);
        interrupt::I2C1.unpend();
        unsafe { interrupt::I2C1.enable() };

        SmbusSlaveHw { _i2c: i2c }
    }
}

#[interrupt]
fn I2C1() {
    let regs = pac::I2C1;
    let isr = regs.isr().read();

    if isr.rxne() {
        let byte = regs.rxdr().read().rxdata();
        if !with_engine(|engine| engine.on_byte_received(byte)) {
            warn!("smbus: byte {=u8:x} refused", byte);
        }
    }

    if isr.addr() {
        if isr.dir() == Dir::READ {
            // a repeated start ends the write part of the transaction
            if let Err(err) = with_engine(|engine| engine.on_write_complete()) {
                warn!("smbus: message dropped: {}", err);
            }
            // drop a byte left in TXDR by an earlier read
            regs.isr().write(|w| w.set_txe(true));
        } else if !with_engine(|engine| engine.on_write_requested()) {
            warn!("smbus: write while disabled");
        }
        regs.icr().write(|w| w.set_addrcf(true));
    }

    if isr.txis() {
        let byte = with_engine(|engine| engine.on_read_requested());
        regs.txdr().write(|w| w.set_txdata(byte));
    }

    if isr.nackf() {
        // master ended the read
        regs.icr().write(|w| w.set_nackcf(true));
        debug!("smbus: read ended by nack");
    }

    if isr.stopf() {
        regs.icr().write(|w| w.set_stopcf(true));
        if let Err(err) = with_engine(|engine| engine.on_transaction_complete()) {
            warn!("smbus: message dropped: {}", err);
        }
        regs.isr().write(|w| w.set_txe(true));
    }

    if isr.berr() || isr.arlo() || isr.ovr() {
        regs.icr().write(|w| {
            w.set_berrcf(true);
            w.set_arlocf(true);
            w.set_ovrcf(true);
        });
        warn!("smbus: bus error, isr={=u32:x}", isr.0);
        // a half-received message is lost
        with_engine(|engine| {
            if engine.state() == SlaveState::WriteRequested {
                engine.abort();
            }
        });
    }
}
