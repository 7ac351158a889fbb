//! Basic color reading example
//!
//! This example demonstrates how to:
//! - Verify the chip identity
//! - Apply a profile with gain and integration time
//! - Read RGB, lux and color temperature

use std::thread::sleep;
use std::time::Duration;

use embassy_futures::block_on;
use tcs34725::{Gain, PartialProfile, Tcs34725};

// This example uses linux-embedded-hal for demonstration
// Replace with your platform's I2C implementation
use linux_embedded_hal::I2cdev;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let i2c = I2cdev::new("/dev/i2c-1")?;
    let mut sensor = Tcs34725::new_blocking(i2c);

    println!("Initializing TCS34725 sensor...");
    block_on(sensor.verify_id()).map_err(|e| format!("{e:?}"))?;

    block_on(sensor.set_profile(&PartialProfile {
        power_on: Some(true),
        active: Some(true),
        integration_time_ms: Some(153.6),
        gain: Some(Gain::X4),
        ..PartialProfile::default()
    }))
    .map_err(|e| format!("{e:?}"))?;

    let report = block_on(sensor.profile()).map_err(|e| format!("{e:?}"))?;
    println!(
        "Integration {:.1} ms, gain {}x, wait {}",
        report.integration.time_ms,
        report.gain.multiplier(),
        report.wait.time_ms
    );
    println!("Press Ctrl+C to exit\n");

    loop {
        sleep(Duration::from_millis(200));

        let status = block_on(sensor.status()).map_err(|e| format!("{e:?}"))?;
        if !status.valid {
            continue;
        }

        let data = block_on(sensor.data()).map_err(|e| format!("{e:?}"))?;
        println!(
            "C: {:5} R: {:5} G: {:5} B: {:5} | #{:02X}{:02X}{:02X} | {:8.2} lux | {:6.0} K",
            data.raw.clear,
            data.raw.red,
            data.raw.green,
            data.raw.blue,
            data.rgb.r,
            data.rgb.g,
            data.rgb.b,
            data.lux,
            data.color_temperature_k
        );
    }
}
