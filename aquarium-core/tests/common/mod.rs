#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use aquarium_core::channels::ChannelBank;
use aquarium_core::commands::AquariumCommands;
use aquarium_core::config::SMB_OWN_ADDRESS;
use aquarium_core::smbus_slave::SmbusSlave;
use aquarium_core::telemetry::SharedTelemetry;
use aquarium_core::{Crc8, DallasCrc};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

// ============================================================================
// Bus helpers
// ============================================================================

pub type Engine<'a> = SmbusSlave<AquariumCommands<'a, ChannelBank>>;

/// Enabled engine wired to a fresh channel bank.
pub fn engine(telemetry: &SharedTelemetry) -> Engine<'_> {
    let mut engine = SmbusSlave::new(
        AquariumCommands::new(telemetry, ChannelBank::new()),
        SMB_OWN_ADDRESS,
    );
    engine.enable();
    engine
}

/// Master write of `bytes` terminated by a stop.
pub fn write(engine: &mut Engine<'_>, bytes: &[u8]) -> Result<(), aquarium_core::BusError> {
    assert!(engine.on_write_requested());
    for &byte in bytes {
        assert!(engine.on_byte_received(byte));
    }
    engine.on_transaction_complete()
}

/// Master read of `count` bytes terminated by a stop.
pub fn read(engine: &mut Engine<'_>, count: usize) -> Vec<u8> {
    let bytes = (0..count).map(|_| engine.on_read_requested()).collect();
    let _ = engine.on_transaction_complete();
    bytes
}

// ============================================================================
// Simulated open-drain line
// ============================================================================

/// A device on a single-wire line.
///
/// The host side is forwarded as edges; `sample` is asked for the level
/// the host sees while it has released the line.
pub trait LineModel {
    fn drive_low(&mut self, now_ns: u64);
    fn release(&mut self, now_ns: u64);
    /// `true` for a high line.
    fn sample(&mut self, now_ns: u64) -> bool;
}

pub struct Line<M> {
    pub model: M,
    now_ns: u64,
    host_low: bool,
    stretch: Option<(u32, u32)>,
}

impl<M> Line<M> {
    /// Lengthen every `delay_us(us)` by `extra_us`, as an interrupt taken
    /// inside the wait would.
    pub fn stretch(&mut self, us: u32, extra_us: u32) {
        self.stretch = Some((us, extra_us));
    }
}

pub type SharedLine<M> = Rc<RefCell<Line<M>>>;

/// Pin and delay sharing one simulated clock.
pub fn line<M: LineModel>(model: M) -> (SimPin<M>, SimDelay<M>, SharedLine<M>) {
    let line = Rc::new(RefCell::new(Line {
        model,
        now_ns: 0,
        host_low: false,
        stretch: None,
    }));
    (
        SimPin { line: line.clone() },
        SimDelay { line: line.clone() },
        line,
    )
}

pub struct SimPin<M> {
    line: SharedLine<M>,
}

impl<M> ErrorType for SimPin<M> {
    type Error = Infallible;
}

impl<M: LineModel> OutputPin for SimPin<M> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut guard = self.line.borrow_mut();
        let line = &mut *guard;
        line.host_low = true;
        line.model.drive_low(line.now_ns);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut guard = self.line.borrow_mut();
        let line = &mut *guard;
        line.host_low = false;
        line.model.release(line.now_ns);
        Ok(())
    }
}

impl<M: LineModel> InputPin for SimPin<M> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut guard = self.line.borrow_mut();
        let line = &mut *guard;
        if line.host_low {
            return Ok(false);
        }
        Ok(line.model.sample(line.now_ns))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

pub struct SimDelay<M> {
    line: SharedLine<M>,
}

impl<M> DelayNs for SimDelay<M> {
    fn delay_ns(&mut self, ns: u32) {
        self.line.borrow_mut().now_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        let extra = match self.line.borrow().stretch {
            Some((target, extra)) if target == us => extra,
            _ => 0,
        };
        self.delay_ns((us + extra) * 1_000);
    }
}

// ============================================================================
// DS18B20 model
// ============================================================================

const RESET_MIN_NS: u64 = 480_000;
const WRITE_ZERO_MIN_NS: u64 = 15_000;
// the sensor drives a read slot until 15 us after the falling edge
const READ_VALID_NS: u64 = 15_000;
const PRESENCE_WINDOW_NS: core::ops::RangeInclusive<u64> = 15_000..=240_000;

/// Scratchpad for 85.0 C, the power-on value.
pub const POWER_ON_SCRATCHPAD: [u8; 9] = [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x1C];

/// Scratchpad holding `register`, with a valid checksum.
pub fn scratchpad(register: u16) -> [u8; 9] {
    let [lo, hi] = register.to_le_bytes();
    let mut data = [lo, hi, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0];
    DallasCrc::append(&mut data, 8);
    data
}

/// One DS18B20 answering to SKIP ROM.
///
/// Slots are told apart by pulse width: a reset is at least 480 us low,
/// a write 0 at least 15 us. A short pulse is a read slot when the host
/// samples before pulling low again, a write 1 otherwise. A read sampled
/// later than 15 us after the falling edge sees the released line.
pub struct Ds18b20Model {
    pub present: bool,
    pub scratchpad: [u8; 9],
    /// Read slots held low after CONVERT T.
    pub busy_slots: usize,
    /// Bytes written after each reset.
    pub frames: Vec<Vec<u8>>,
    /// Widest low pulse taken as a write 1.
    pub widest_write_one_ns: u64,
    low_since: u64,
    short_pulse: Option<u64>,
    reset_released_at: Option<u64>,
    bits: Vec<bool>,
    converting: bool,
    reads: VecDeque<bool>,
}

impl Ds18b20Model {
    pub fn new(scratchpad: [u8; 9]) -> Self {
        Self {
            present: true,
            scratchpad,
            busy_slots: 3,
            frames: Vec::new(),
            widest_write_one_ns: 0,
            low_since: 0,
            short_pulse: None,
            reset_released_at: None,
            bits: Vec::new(),
            converting: false,
            reads: VecDeque::new(),
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new(POWER_ON_SCRATCHPAD)
        }
    }

    fn written_bit(&mut self, bit: bool) {
        self.bits.push(bit);
        if self.bits.len() < 8 {
            return;
        }
        let byte = self
            .bits
            .drain(..)
            .enumerate()
            .fold(0u8, |byte, (pos, bit)| byte | (u8::from(bit) << pos));
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        let frame = self.frames.last_mut().unwrap();
        frame.push(byte);

        match frame.as_slice() {
            [0xCC, 0x44] => self.converting = true,
            [0xCC, 0xBE] => {
                self.reads = self
                    .scratchpad
                    .iter()
                    .flat_map(|&byte| (0..8).map(move |pos| (byte >> pos) & 1 == 1))
                    .collect();
            }
            _ => {}
        }
    }

    fn read_slot(&mut self) -> bool {
        if !self.present {
            return true;
        }
        if self.converting {
            if self.busy_slots > 0 {
                self.busy_slots -= 1;
                return false;
            }
            self.converting = false;
            return true;
        }
        self.reads.pop_front().unwrap_or(true)
    }
}

impl LineModel for Ds18b20Model {
    fn drive_low(&mut self, now_ns: u64) {
        if let Some(width) = self.short_pulse.take() {
            self.widest_write_one_ns = self.widest_write_one_ns.max(width);
            self.written_bit(true);
        }
        self.reset_released_at = None;
        self.low_since = now_ns;
    }

    fn release(&mut self, now_ns: u64) {
        let width = now_ns - self.low_since;
        if width >= RESET_MIN_NS {
            self.frames.push(Vec::new());
            self.bits.clear();
            self.reads.clear();
            self.reset_released_at = Some(now_ns);
        } else if width >= WRITE_ZERO_MIN_NS {
            self.written_bit(false);
        } else {
            self.short_pulse = Some(width);
        }
    }

    fn sample(&mut self, now_ns: u64) -> bool {
        if self.short_pulse.take().is_some() {
            let bit = self.read_slot();
            return bit || now_ns - self.low_since > READ_VALID_NS;
        }
        match self.reset_released_at {
            Some(at) if PRESENCE_WINDOW_NS.contains(&(now_ns - at)) => !self.present,
            _ => true,
        }
    }
}

// ============================================================================
// RHT03 model
// ============================================================================

/// One RHT03 answering a start pulse of at least 1 ms.
///
/// Levels follow the datasheet, relative to the host releasing the line:
/// 20 us high, 80 us low, 80 us high, then per bit 50 us low and 26 us
/// (0) or 70 us (1) high, then a closing 50 us low.
pub struct Rht03Model {
    pub data: [u8; 5],
    pub responsive: bool,
    low_since: u64,
    started_at: Option<u64>,
}

impl Rht03Model {
    pub fn new(humidity: u16, temperature: u16) -> Self {
        let [h_hi, h_lo] = humidity.to_be_bytes();
        let [t_hi, t_lo] = temperature.to_be_bytes();
        let checksum = h_hi
            .wrapping_add(h_lo)
            .wrapping_add(t_hi)
            .wrapping_add(t_lo);
        Self::with_frame([h_hi, h_lo, t_hi, t_lo, checksum])
    }

    pub fn with_frame(data: [u8; 5]) -> Self {
        Self {
            data,
            responsive: true,
            low_since: 0,
            started_at: None,
        }
    }

    fn level_at(&self, t_us: u64) -> bool {
        if t_us < 20 {
            return true;
        }
        if t_us < 100 {
            return false;
        }
        if t_us < 180 {
            return true;
        }
        let mut cursor = 180;
        for byte in self.data {
            for pos in (0..8).rev() {
                if t_us < cursor + 50 {
                    return false;
                }
                cursor += 50;
                cursor += if (byte >> pos) & 1 == 1 { 70 } else { 26 };
                if t_us < cursor {
                    return true;
                }
            }
        }
        t_us >= cursor + 50
    }
}

impl LineModel for Rht03Model {
    fn drive_low(&mut self, now_ns: u64) {
        self.low_since = now_ns;
        self.started_at = None;
    }

    fn release(&mut self, now_ns: u64) {
        if self.responsive && now_ns - self.low_since >= 1_000_000 {
            self.started_at = Some(now_ns);
        }
    }

    fn sample(&mut self, now_ns: u64) -> bool {
        match self.started_at {
            Some(at) => self.level_at((now_ns - at) / 1_000),
            None => true,
        }
    }
}
