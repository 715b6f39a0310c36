//! LED dimming channels.

use crate::config::CHANNEL_COUNT;

/// One 8-bit intensity per channel, channel 1 first.
pub type Intensities = [u8; CHANNEL_COUNT];

/// Anything that can take a full set of channel intensities.
///
/// Called from the bus interrupt, so implementations must not block.
pub trait ChannelOutput {
    fn set_channels(&mut self, intensities: &Intensities);
}

impl<O: ChannelOutput + ?Sized> ChannelOutput for &mut O {
    fn set_channels(&mut self, intensities: &Intensities) {
        (**self).set_channels(intensities);
    }
}

/// Last intensities applied by SETCHANNELS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelBank {
    values: Intensities,
}

impl ChannelBank {
    pub const fn new() -> Self {
        Self {
            values: [0; CHANNEL_COUNT],
        }
    }

    pub fn values(&self) -> &Intensities {
        &self.values
    }

    /// Intensity of a zero-based channel.
    pub fn get(&self, channel: usize) -> Option<u8> {
        self.values.get(channel).copied()
    }
}

impl ChannelOutput for ChannelBank {
    fn set_channels(&mut self, intensities: &Intensities) {
        self.values = *intensities;
    }
}

/// Boot pattern: channel k (zero-based) at `(k + 1) * 30`.
pub fn startup_ramp() -> Intensities {
    core::array::from_fn(|k| ((k + 1) * 30) as u8)
}
