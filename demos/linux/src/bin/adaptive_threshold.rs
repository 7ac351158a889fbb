//! Adaptive threshold example
//!
//! This example demonstrates how to:
//! - Describe the board resources with a `Board`
//! - Run a supervised session that retries setup until the chip answers
//! - Step the comparator window from the polled interrupt flag

use embassy_futures::block_on;
use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
use linux_embedded_hal::I2cdev;
use tcs34725::device::{Board, PollResult, Unavailable};
use tcs34725::{
    BlockingI2cInterface, Device, DeviceConfig, Listener, Measurement, PartialProfile, State, Step,
    StopSignal, Strategy, Threshold,
};

static STOP: StopSignal = StopSignal::new();

/// Bus only; the LED and INT pins are not wired
struct LinuxBoard {
    path: &'static str,
}

impl Board for LinuxBoard {
    type Bus = BlockingI2cInterface<I2cdev>;
    type Led = Unavailable;
    type Interrupt = Unavailable;
    type Error = LinuxI2CError;

    async fn acquire_bus(&mut self) -> Result<Self::Bus, Self::Error> {
        Ok(BlockingI2cInterface {
            i2c: I2cdev::new(self.path)?,
        })
    }

    async fn acquire_led(&mut self) -> Result<Self::Led, Self::Error> {
        Ok(Unavailable)
    }

    async fn acquire_interrupt(&mut self) -> Result<Self::Interrupt, Self::Error> {
        Ok(Unavailable)
    }
}

struct Printer;

impl Listener for Printer {
    fn on_data(&mut self, data: &Measurement, poll: &PollResult) {
        let flagged = poll.status().is_some_and(|s| s.threshold_violation);
        println!(
            "C: {:5} | {:8.2} lux | {:6.0} K{}",
            data.raw.clear,
            data.lux,
            data.color_temperature_k,
            if flagged { " | out of window" } else { "" }
        );
    }

    fn on_step(&mut self, step: &Step) {
        let window = step.adjustment.threshold;
        println!(
            "step {:?}: clear {} -> window {}..{}",
            step.adjustment.direction, step.adjustment.sample_clear, window.low, window.high
        );
    }

    fn on_state(&mut self, state: State) {
        println!("state: {state:?}");
    }
}

fn main() {
    let mut config = DeviceConfig::polled(500, Strategy::Walk);
    config.retry_interval_ms = 2000;
    config.profile = PartialProfile {
        power_on: Some(true),
        active: Some(true),
        interrupts: Some(true),
        integration_time_ms: Some(100.8),
        threshold: Some(Threshold::new(900, 1100)),
        ..PartialProfile::default()
    };

    let mut device = Device::new(LinuxBoard { path: "/dev/i2c-1" }, config, Printer);

    println!("Press Ctrl+C to exit\n");
    block_on(async {
        if device.setup_with_retry(&STOP).await.is_ok() {
            device.start(&STOP).await;
        }
    });
}
