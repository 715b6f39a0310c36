use embedded_hal::delay::DelayNs;

use crate::config::CORE_CLOCK_HZ;

/// Busy-wait delay counted in core cycles.
///
/// The embassy time driver ticks at 32.768 kHz, far too coarse for 1-Wire
/// slots. An interrupt taken during the wait stretches it, so the sensor
/// drivers mask interrupts around the timing-critical part of each slot.
#[derive(Clone, Copy)]
pub struct CycleDelay;

impl CycleDelay {
    const CYCLES_PER_US: u32 = CORE_CLOCK_HZ / 1_000_000;
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (u64::from(ns) * u64::from(CORE_CLOCK_HZ)).div_ceil(1_000_000_000);
        cortex_m::asm::delay(cycles as u32);
    }

    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(us.saturating_mul(Self::CYCLES_PER_US));
    }
}
