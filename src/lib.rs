//! # TCS34725 RGB Color Light-to-Digital Converter Driver
//!
//! This is a platform-agnostic Rust driver for the TCS34725 (and TCS34721) color
//! sensor, built using the [`embedded-hal`] and [`embedded-hal-async`] traits for
//! I2C communication.
//!
//! The TCS34725 provides:
//! - Clear, Red, Green and Blue 16-bit channels
//! - Programmable gain (1x, 4x, 16x, 60x)
//! - Programmable integration time (2.4ms to 614.4ms) and wait time (up to 7.4s)
//! - A clear channel interrupt with a low/high comparator window and persistence filter
//! - I2C interface (address 0x29)
//!
//! ## Features
//!
//! - **Register codec** mapping profiles and measurements to register bytes
//! - **Profile service** reading and writing the whole configuration at once
//! - **Lux and color temperature** derivation
//! - **Adaptive threshold window** that follows the light level after every interrupt
//! - **Device lifecycle** with setup retry, polling, LED flash and interrupt handling
//! - `defmt-03`, `log` and `serde` feature gates
//!
//! ## Blocking HALs
//!
//! Every driver method is `async`; there is no separate blocking API. A
//! blocking bus is wrapped with [`Tcs34725::new_blocking`] (or
//! [`BlockingI2cInterface`](ll::BlockingI2cInterface) for a [`Device`] board),
//! whose futures complete on first poll. Drive them with
//! `embassy_futures::block_on` as in the quick start below.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tcs34725::{Gain, PartialProfile, Tcs34725};
//!
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let mut sensor = Tcs34725::new_blocking(i2c);
//!
//! embassy_futures::block_on(async {
//!     sensor.verify_id().await.unwrap();
//!
//!     sensor
//!         .set_profile(&PartialProfile {
//!             power_on: Some(true),
//!             active: Some(true),
//!             integration_time_ms: Some(153.6),
//!             gain: Some(Gain::X4),
//!             ..PartialProfile::default()
//!         })
//!         .await
//!         .unwrap();
//!
//!     let data = sensor.data().await.unwrap();
//!     let _ = (data.rgb, data.lux, data.color_temperature_k);
//! });
//! ```
//!
//! ## Adaptive Interrupts
//!
//! ```rust,ignore
//! use tcs34725::Strategy;
//!
//! // Wait for the INT line, then move the window to follow the light level
//! int_pin.wait_for_high().await?;
//! let step = sensor.step(Strategy::Jump).await?;
//! ```
//!
//! The [`device`] module wraps all of this into a supervised session.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//! [`embedded-hal-async`]: https://crates.io/crates/embedded-hal-async

#![no_std]
#![deny(missing_docs)]

#[cfg(all(feature = "defmt-03", feature = "log"))]
compile_error!("features `defmt-03` and `log` are mutually exclusive");

// Must come first so the macros are visible to the other modules
mod fmt;

pub mod codec;
pub mod device;
pub mod ll;
pub mod measurement;
pub mod profile;
pub mod threshold;
pub mod types;

#[cfg(test)]
mod testing;

use embassy_time::Instant;

pub use codec::CodecError;
pub use device::{Board, Device, DeviceConfig, Listener, State, StopSignal};
pub use ll::{BlockingI2cInterface, I2cInterface, RegisterBus, CHIP_ID, I2C_ADDRESS};
pub use measurement::{Measurement, Ratio, Rgb};
pub use profile::{PartialProfile, Profile, ProfileReport};
pub use threshold::{Adjustment, Direction, Step, Strategy};
pub use types::{
    Configuration, Enable, Gain, IntegrationTiming, Persistence, RawSample, Status, Threshold,
    WaitTime, WaitTiming,
};

use ll::{registers, COMMAND_BULK_DATA, DATA_BLOCK_LEN};
use profile::{read_register, write_register};

/// All possible errors in this crate
#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transaction failed
    Bus(E),
    /// Value cannot be represented in the registers
    Codec(CodecError),
    /// Invalid device ID detected
    InvalidDeviceId {
        /// Expected device ID
        expected: u8,
        /// Found device ID
        found: u8,
    },
}

impl<E> From<CodecError> for Error<E> {
    fn from(error: CodecError) -> Self {
        Self::Codec(error)
    }
}

/// High-level TCS34725 driver
pub struct Tcs34725<B> {
    bus: B,
}

impl<I: embedded_hal_async::i2c::I2c> Tcs34725<I2cInterface<I>> {
    /// Create a driver on an async I2C bus
    pub fn new_i2c(i2c: I) -> Self {
        Self::new(I2cInterface { i2c })
    }
}

impl<I: embedded_hal::i2c::I2c> Tcs34725<BlockingI2cInterface<I>> {
    /// Create a driver on a blocking I2C bus
    ///
    /// The methods stay `async` but never yield; run them with
    /// `embassy_futures::block_on`.
    pub fn new_blocking(i2c: I) -> Self {
        Self::new(BlockingI2cInterface { i2c })
    }
}

impl<B, E> Tcs34725<B>
where
    B: RegisterBus<Error = E>,
{
    /// Create a driver on any register bus
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Destroy the driver and return the bus
    pub fn destroy(self) -> B {
        self.bus
    }

    /// Read the ID register
    pub async fn id(&mut self) -> Result<u8, Error<E>> {
        read_register(&mut self.bus, registers::ID).await
    }

    /// Check that the chip answers with [`CHIP_ID`]
    pub async fn verify_id(&mut self) -> Result<(), Error<E>> {
        let found = self.id().await?;
        if found != CHIP_ID {
            return Err(Error::InvalidDeviceId {
                expected: CHIP_ID,
                found,
            });
        }
        Ok(())
    }

    /// Read STATUS
    pub async fn status(&mut self) -> Result<Status, Error<E>> {
        let value = read_register(&mut self.bus, registers::STATUS).await?;
        Ok(codec::decode_status(value))
    }

    /// Read ENABLE
    pub async fn enable(&mut self) -> Result<Enable, Error<E>> {
        let value = read_register(&mut self.bus, registers::ENABLE).await?;
        Ok(codec::decode_enable(value))
    }

    /// Write ENABLE
    pub async fn set_enable(&mut self, enable: Enable) -> Result<(), Error<E>> {
        write_register(&mut self.bus, registers::ENABLE, codec::encode_enable(enable)).await
    }

    /// Read ATIME
    pub async fn integration_timing(&mut self) -> Result<IntegrationTiming, Error<E>> {
        let value = read_register(&mut self.bus, registers::ATIME).await?;
        Ok(codec::decode_integration_timing(value))
    }

    /// Write ATIME from a duration
    pub async fn set_integration_time(&mut self, ms: f32) -> Result<(), Error<E>> {
        let atime = codec::encode_integration_time_ms(ms)?;
        write_register(&mut self.bus, registers::ATIME, atime).await
    }

    /// Read WTIME together with the WLONG flag
    pub async fn wait_time(&mut self) -> Result<WaitTime, Error<E>> {
        let timing = codec::decode_wait_timing(read_register(&mut self.bus, registers::WTIME).await?);
        let config = self.configuration().await?;
        Ok(codec::format_wait_time(timing, config.wlong))
    }

    /// Write WTIME as a raw step count, leaving WLONG alone
    pub async fn set_wait_count(&mut self, count: u16) -> Result<(), Error<E>> {
        let wtime = codec::encode_wait_count(count)?;
        write_register(&mut self.bus, registers::WTIME, wtime).await
    }

    /// Write WTIME and WLONG from a duration
    pub async fn set_wait_time(&mut self, ms: f32) -> Result<(), Error<E>> {
        let (wtime, wlong) = codec::encode_wait_time_ms(ms)?;
        write_register(&mut self.bus, registers::WTIME, wtime).await?;
        self.set_configuration(Configuration { wlong }).await
    }

    /// Read CONFIG
    pub async fn configuration(&mut self) -> Result<Configuration, Error<E>> {
        let value = read_register(&mut self.bus, registers::CONFIG).await?;
        Ok(codec::decode_configuration(value))
    }

    /// Write CONFIG
    pub async fn set_configuration(&mut self, config: Configuration) -> Result<(), Error<E>> {
        write_register(
            &mut self.bus,
            registers::CONFIG,
            codec::encode_configuration(config),
        )
        .await
    }

    /// Read PERS
    pub async fn persistence(&mut self) -> Result<Persistence, Error<E>> {
        let value = read_register(&mut self.bus, registers::PERS).await?;
        Ok(codec::decode_persistence(value))
    }

    /// Write PERS
    pub async fn set_persistence(&mut self, persistence: Persistence) -> Result<(), Error<E>> {
        let value = codec::encode_persistence(persistence)?;
        write_register(&mut self.bus, registers::PERS, value).await
    }

    /// Read CONTROL
    pub async fn gain(&mut self) -> Result<Gain, Error<E>> {
        let value = read_register(&mut self.bus, registers::CONTROL).await?;
        Ok(Gain::from_code(value))
    }

    /// Write CONTROL
    pub async fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
        write_register(&mut self.bus, registers::CONTROL, gain.code()).await
    }

    /// Read the comparator window
    pub async fn threshold(&mut self) -> Result<Threshold, Error<E>> {
        profile::read_threshold(&mut self.bus).await
    }

    /// Write the comparator window
    pub async fn set_threshold(&mut self, threshold: Threshold) -> Result<(), Error<E>> {
        profile::write_threshold(&mut self.bus, threshold).await
    }

    /// Read the whole configuration block
    pub async fn profile(&mut self) -> Result<ProfileReport, Error<E>> {
        profile::read_profile(&mut self.bus).await
    }

    /// Apply a profile over [`Profile::DEFAULT`], ENABLE last
    pub async fn set_profile(&mut self, profile: &PartialProfile) -> Result<(), Error<E>> {
        profile::write_profile(&mut self.bus, profile).await
    }

    /// Re-arm the clear channel interrupt
    pub async fn clear_interrupt(&mut self) -> Result<(), Error<E>> {
        profile::clear_interrupt(&mut self.bus).await
    }

    /// Read the four color channels using block read for data coherency
    pub async fn raw_sample(&mut self) -> Result<RawSample, Error<E>> {
        let mut block = [0u8; DATA_BLOCK_LEN];
        self.bus
            .read(COMMAND_BULK_DATA, &mut block)
            .await
            .map_err(Error::Bus)?;
        Ok(codec::decode_raw_sample(&block))
    }

    /// Read the color channels and derive the measurement
    pub async fn data(&mut self) -> Result<Measurement, Error<E>> {
        Ok(measurement::derive_measurement(self.raw_sample().await?))
    }

    /// Handle a clear channel interrupt
    ///
    /// Reads the window and a fresh sample, moves the window, writes it back
    /// and re-arms the interrupt. The interrupt is cleared even when the sample
    /// is back inside the window.
    pub async fn step(&mut self, strategy: Strategy) -> Result<Step, Error<E>> {
        let threshold = self.threshold().await?;
        let sample = self.raw_sample().await?;
        self.apply_step(threshold, sample.clear, Instant::now(), strategy)
            .await
    }

    /// Like [`Self::step`] with a sample that was already read
    pub async fn step_with_sample(
        &mut self,
        sample_clear: u16,
        timestamp: Instant,
        strategy: Strategy,
    ) -> Result<Step, Error<E>> {
        let threshold = self.threshold().await?;
        self.apply_step(threshold, sample_clear, timestamp, strategy)
            .await
    }

    async fn apply_step(
        &mut self,
        threshold: Threshold,
        sample_clear: u16,
        timestamp: Instant,
        strategy: Strategy,
    ) -> Result<Step, Error<E>> {
        let adjustment = threshold::adapt(threshold, sample_clear, strategy);
        if adjustment.is_step() {
            self.set_threshold(adjustment.threshold).await?;
        } else {
            warn!(
                "interrupt with sample {} inside window {}..{}",
                sample_clear,
                threshold.low,
                threshold.high
            );
        }
        self.clear_interrupt().await?;
        Ok(Step {
            adjustment,
            timestamp,
        })
    }
}
