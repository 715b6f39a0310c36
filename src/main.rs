#![no_std]
#![no_main]

#[macro_use]
mod fmt;

mod channels;
mod config;
mod delay;
mod signals;
mod smbus_hw;

use aquarium_core::config::SMB_OWN_ADDRESS;
use aquarium_core::{
    burst_average, startup_ramp, DepthFilter, Ds18b20, OneWire, Rht03, SampleSchedule,
};
#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::Spawner;
use embassy_stm32::adc::{Adc, AdcChannel, AnyAdcChannel, SampleTime};
use embassy_stm32::gpio::{Flex, OutputType, Pin, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::peripherals::*;
use embassy_stm32::time::khz;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::Peripheral;
use embassy_time::{Ticker, Timer};

use crate::channels::PwmBank;
use crate::config::*;
use crate::delay::CycleDelay;
use crate::signals::{install_pwm, with_engine, TELEMETRY};
use crate::smbus_hw::SmbusSlaveHw;

/// Open-drain pin for a single-wire sensor, released (high) at start.
fn sensor_pin(pin: impl Peripheral<P = impl Pin> + 'static) -> Flex<'static> {
    let mut flex = Flex::new(pin);
    flex.set_high();
    flex.set_as_input_output(Speed::Low);
    flex
}

async fn read_depth(adc: &mut Adc<'static, ADC1>, channel: &mut AnyAdcChannel<ADC1>) -> u16 {
    let mut samples = [0u16; DEPTH_BURST_SAMPLES];
    for sample in samples.iter_mut() {
        *sample = adc.blocking_read(channel);
        Timer::after(DEPTH_BURST_INTERVAL).await;
    }
    burst_average(&samples)
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_stm32::init(Default::default());
    info!("aquarium controller, smbus address {=u8:x}", SMB_OWN_ADDRESS);

    let pwm_low = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new_ch1(p.PA6, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PA7, OutputType::PushPull)),
        Some(PwmPin::new_ch3(p.PB0, OutputType::PushPull)),
        Some(PwmPin::new_ch4(p.PB1, OutputType::PushPull)),
        PWM_FREQUENCY,
        Default::default(),
    );
    let pwm_high = SimplePwm::new(
        p.TIM1,
        Some(PwmPin::new_ch1(p.PA8, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PB3, OutputType::PushPull)),
        Some(PwmPin::new_ch3(p.PB6, OutputType::PushPull)),
        Some(PwmPin::new_ch4(p.PA11, OutputType::PushPull)),
        PWM_FREQUENCY,
        Default::default(),
    );
    let mut bank = PwmBank::new(pwm_low, pwm_high);
    let ramp = startup_ramp();
    bank.set(&ramp);
    info!("channels: {}", ramp);
    // installed before the bus interrupt is enabled
    install_pwm(bank);

    let i2c = I2c::new_blocking(p.I2C1, p.PB8, p.PB9, khz(100), i2c::Config::default());
    with_engine(|engine| engine.enable());
    let _smbus = SmbusSlaveHw::new(i2c, SMB_OWN_ADDRESS);

    let mut adc = Adc::new(p.ADC1);
    adc.set_sample_time(SampleTime::CYCLES160_5);
    let mut depth_channel = p.PA0.degrade_adc();

    let mut water = Ds18b20::with_conversion_limit(
        OneWire::new(sensor_pin(p.PA5), CycleDelay),
        CONVERSION_POLL_LIMIT,
    );
    let mut air = Rht03::new(sensor_pin(p.PA4), CycleDelay);

    let mut schedule = SampleSchedule::new(TEMPERATURE_EVERY_TICKS, AIR_EVERY_TICKS);
    let mut depth = DepthFilter::new();
    let mut bus_error_seen = false;
    let mut ticker = Ticker::every(SAMPLE_TICK);

    loop {
        let due = schedule.next();

        // failed reads keep the previous value published
        if due.temperature {
            match water.read_temperature() {
                Ok(reading) => {
                    info!("water: {=i16}/16 C", reading.sixteenths());
                    TELEMETRY.publish_temperature(reading);
                }
                Err(err) => warn!("water temperature: {}", err),
            }
        }

        if due.air {
            match air.read() {
                Ok(reading) => {
                    info!(
                        "air: {=u16} dC, {=u16} d%RH",
                        reading.temperature,
                        reading.humidity
                    );
                    TELEMETRY.publish_humidity(reading);
                }
                Err(err) => warn!("air temperature/humidity: {}", err),
            }
        }

        if due.depth {
            let burst = read_depth(&mut adc, &mut depth_channel).await;
            info!("depth raw: {=u16}", burst);
            // legacy-depth: the window is fed 0 and the burst only logged
            #[cfg(feature = "legacy-depth")]
            let burst = 0;
            let level = depth.push(burst);
            info!("depth: {=u16}", level);
            TELEMETRY.publish_depth(level);
        }

        let bus_error = with_engine(|engine| engine.error());
        if bus_error && !bus_error_seen {
            warn!("smbus: error flag set");
        }
        bus_error_seen = bus_error;

        ticker.next().await;
    }
}
