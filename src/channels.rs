use aquarium_core::config::CHANNEL_COUNT;
use aquarium_core::Intensities;
use cortex_m::prelude::_embedded_hal_Pwm;
use embassy_stm32::timer::{simple_pwm::SimplePwm, Channel as TimChannel, GeneralInstance4Channel};

const TIMER_CHANNELS: [TimChannel; 4] = [
    TimChannel::Ch1,
    TimChannel::Ch2,
    TimChannel::Ch3,
    TimChannel::Ch4,
];

/// LED channels 1-4 on the first timer, 5-8 on the second.
pub struct PwmBank<A: GeneralInstance4Channel, B: GeneralInstance4Channel> {
    low: SimplePwm<'static, A>,
    high: SimplePwm<'static, B>,
}

impl<A: GeneralInstance4Channel, B: GeneralInstance4Channel> PwmBank<A, B> {
    pub fn new(mut low: SimplePwm<'static, A>, mut high: SimplePwm<'static, B>) -> Self {
        for (k, &chan) in TIMER_CHANNELS.iter().cycle().take(CHANNEL_COUNT).enumerate() {
            if k < TIMER_CHANNELS.len() {
                low.enable(chan);
            } else {
                high.enable(chan);
            }
        }
        PwmBank { low, high }
    }

    pub fn set(&mut self, intensities: &Intensities) {
        for (k, &val) in intensities.iter().enumerate() {
            let chan = TIMER_CHANNELS[k % TIMER_CHANNELS.len()];
            if k < TIMER_CHANNELS.len() {
                let duty = value_to_duty(val, self.low.get_max_duty());
                self.low.set_duty(chan, duty);
            } else {
                let duty = value_to_duty(val, self.high.get_max_duty());
                self.high.set_duty(chan, duty);
            }
        }
    }
}

fn value_to_duty(val: u8, max_duty: u32) -> u32 {
    val as u32 * max_duty / 255
}
