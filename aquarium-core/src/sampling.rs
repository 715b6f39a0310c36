//! Helpers for the main sampling loop.

/// Slots in the depth moving average.
pub const DEPTH_WINDOW: usize = 8;

/// Mean of one burst of ADC samples, zero for an empty burst.
pub fn burst_average(samples: &[u16]) -> u16 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
    (sum / samples.len() as u32) as u16
}

/// Moving average over the last [`DEPTH_WINDOW`] depth readings.
///
/// The first reading fills the whole window so the average starts at a
/// real value instead of ramping up from zero.
#[derive(Debug, Clone)]
pub struct DepthFilter {
    readings: [u16; DEPTH_WINDOW],
    index: usize,
    primed: bool,
}

impl DepthFilter {
    pub const fn new() -> Self {
        Self {
            readings: [0; DEPTH_WINDOW],
            index: 0,
            primed: false,
        }
    }

    /// Add a reading and return the new average.
    pub fn push(&mut self, reading: u16) -> u16 {
        if self.primed {
            self.readings[self.index] = reading;
        } else {
            self.readings = [reading; DEPTH_WINDOW];
            self.primed = true;
        }
        self.index = (self.index + 1) % DEPTH_WINDOW;
        self.average()
    }

    pub fn average(&self) -> u16 {
        let sum: u32 = self.readings.iter().map(|&r| u32::from(r)).sum();
        (sum / DEPTH_WINDOW as u32) as u16
    }
}

impl Default for DepthFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Which sensors to read on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Due {
    pub temperature: bool,
    pub air: bool,
    pub depth: bool,
}

/// Tick schedule of the sampling loop: water temperature every
/// `temperature_every` ticks, air every `air_every` ticks, depth on every
/// tick. Both start due on the first tick.
#[derive(Debug, Clone)]
pub struct SampleSchedule {
    tick: u32,
    temperature_every: u32,
    air_every: u32,
}

impl SampleSchedule {
    /// Zero periods are treated as 1.
    pub const fn new(temperature_every: u32, air_every: u32) -> Self {
        Self {
            tick: 0,
            temperature_every: if temperature_every == 0 { 1 } else { temperature_every },
            air_every: if air_every == 0 { 1 } else { air_every },
        }
    }

    pub fn next(&mut self) -> Due {
        let due = Due {
            temperature: self.tick % self.temperature_every == 0,
            air: self.tick % self.air_every == 0,
            depth: true,
        };
        self.tick = self.tick.wrapping_add(1);
        due
    }
}
