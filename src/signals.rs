use core::cell::RefCell;

use aquarium_core::config::SMB_OWN_ADDRESS;
use aquarium_core::{AquariumCommands, ChannelOutput, Intensities, SharedTelemetry, SmbusSlave};
use embassy_stm32::peripherals::{TIM1, TIM3};
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::channels::PwmBank;

/// Readings served to the bus master.
pub static TELEMETRY: SharedTelemetry = SharedTelemetry::new();

/// LED timers, installed once by `main`.
pub static PWM: Mutex<CriticalSectionRawMutex, RefCell<Option<PwmBank<TIM3, TIM1>>>> =
    Mutex::new(RefCell::new(None));

pub fn install_pwm(bank: PwmBank<TIM3, TIM1>) {
    PWM.lock(|pwm| *pwm.borrow_mut() = Some(bank));
}

/// Writes SETCHANNELS results straight to the timers from the bus
/// interrupt.
pub struct PwmChannels;

impl ChannelOutput for PwmChannels {
    fn set_channels(&mut self, intensities: &Intensities) {
        PWM.lock(|pwm| match pwm.borrow_mut().as_mut() {
            Some(bank) => {
                bank.set(intensities);
                debug!("channels: {}", intensities);
            }
            None => warn!("channels: timers not ready"),
        });
    }
}

pub type Engine = SmbusSlave<AquariumCommands<'static, PwmChannels>>;

/// The bus engine, driven from the I2C1 interrupt.
pub static ENGINE: Mutex<CriticalSectionRawMutex, RefCell<Engine>> = Mutex::new(RefCell::new(
    SmbusSlave::new(AquariumCommands::new(&TELEMETRY, PwmChannels), SMB_OWN_ADDRESS),
));

pub fn with_engine<R>(f: impl FnOnce(&mut Engine) -> R) -> R {
    ENGINE.lock(|engine| f(&mut engine.borrow_mut()))
}
