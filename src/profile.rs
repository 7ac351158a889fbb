//! Whole-device configuration read and written as one unit

use crate::codec;
use crate::ll::{
    registers, register_command, RegisterBus, COMMAND_BULK_PROFILE, COMMAND_BULK_THRESHOLD,
    COMMAND_CLEAR, PROFILE_BLOCK_LEN, THRESHOLD_BLOCK_LEN,
};
use crate::types::{
    Configuration, Enable, Gain, IntegrationTiming, Persistence, Status, Threshold, WaitTime,
};
use crate::Error;

/// Logical device configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Profile {
    /// Oscillator on
    pub power_on: bool,
    /// RGBC conversions running
    pub active: bool,
    /// Wait state between conversions
    pub wait: bool,
    /// Clear channel interrupt output
    pub interrupts: bool,
    /// Integration time in milliseconds
    pub integration_time_ms: f32,
    /// Wait time in milliseconds
    pub wait_time_ms: f32,
    /// Comparator window
    pub threshold: Threshold,
    /// Interrupt persistence filter
    pub filtering: Persistence,
    /// Analog gain
    pub gain: Gain,
}

impl Profile {
    /// Powered off, interrupts enabled, shortest timings, empty window
    pub const DEFAULT: Self = Self {
        power_on: false,
        active: false,
        wait: false,
        interrupts: true,
        integration_time_ms: 2.4,
        wait_time_ms: 2.4,
        threshold: Threshold::new(0, 0),
        filtering: Persistence::Every,
        gain: Gain::X1,
    };

    /// ENABLE flags of this profile
    pub const fn enable(&self) -> Enable {
        Enable {
            power_on: self.power_on,
            active: self.active,
            wait: self.wait,
            interrupts: self.interrupts,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Profile with every field optional, completed from [`Profile::DEFAULT`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PartialProfile {
    /// Oscillator on
    pub power_on: Option<bool>,
    /// RGBC conversions running
    pub active: Option<bool>,
    /// Wait state between conversions
    pub wait: Option<bool>,
    /// Clear channel interrupt output
    pub interrupts: Option<bool>,
    /// Integration time in milliseconds
    pub integration_time_ms: Option<f32>,
    /// Wait time in milliseconds
    pub wait_time_ms: Option<f32>,
    /// Comparator window
    pub threshold: Option<Threshold>,
    /// Interrupt persistence filter
    pub filtering: Option<Persistence>,
    /// Analog gain
    pub gain: Option<Gain>,
}

impl PartialProfile {
    /// No field set
    pub const EMPTY: Self = Self {
        power_on: None,
        active: None,
        wait: None,
        interrupts: None,
        integration_time_ms: None,
        wait_time_ms: None,
        threshold: None,
        filtering: None,
        gain: None,
    };

    /// Fill unset fields from `base`
    pub fn merge_over(&self, base: &Profile) -> Profile {
        Profile {
            power_on: self.power_on.unwrap_or(base.power_on),
            active: self.active.unwrap_or(base.active),
            wait: self.wait.unwrap_or(base.wait),
            interrupts: self.interrupts.unwrap_or(base.interrupts),
            integration_time_ms: self.integration_time_ms.unwrap_or(base.integration_time_ms),
            wait_time_ms: self.wait_time_ms.unwrap_or(base.wait_time_ms),
            threshold: self.threshold.unwrap_or(base.threshold),
            filtering: self.filtering.unwrap_or(base.filtering),
            gain: self.gain.unwrap_or(base.gain),
        }
    }

    /// Fill unset fields from [`Profile::DEFAULT`]
    pub fn resolve(&self) -> Profile {
        self.merge_over(&Profile::DEFAULT)
    }
}

impl From<Profile> for PartialProfile {
    fn from(profile: Profile) -> Self {
        Self {
            power_on: Some(profile.power_on),
            active: Some(profile.active),
            wait: Some(profile.wait),
            interrupts: Some(profile.interrupts),
            integration_time_ms: Some(profile.integration_time_ms),
            wait_time_ms: Some(profile.wait_time_ms),
            threshold: Some(profile.threshold),
            filtering: Some(profile.filtering),
            gain: Some(profile.gain),
        }
    }
}

/// Everything decoded from one profile block read
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ProfileReport {
    /// ENABLE flags
    pub enable: Enable,
    /// Integration timing
    pub integration: IntegrationTiming,
    /// Wait timing including the long-wait flag
    pub wait: WaitTime,
    /// Comparator window
    pub threshold: Threshold,
    /// Persistence filter
    pub filtering: Persistence,
    /// Gain multiplier
    pub gain: Gain,
    /// Device id byte
    pub id: u8,
    /// Status flags
    pub status: Status,
}

impl ProfileReport {
    /// Decode a profile block starting at ENABLE
    pub fn decode(block: &[u8; PROFILE_BLOCK_LEN]) -> Result<Self, codec::CodecError> {
        let at = |register: u8| block[usize::from(register)];
        let config = codec::decode_configuration(at(registers::CONFIG));
        let threshold_start = usize::from(registers::AILTL);
        Ok(Self {
            enable: codec::decode_enable(at(registers::ENABLE)),
            integration: codec::decode_integration_timing(at(registers::ATIME)),
            wait: codec::format_wait_time(
                codec::decode_wait_timing(at(registers::WTIME)),
                config.wlong,
            ),
            threshold: codec::decode_threshold(
                &block[threshold_start..threshold_start + THRESHOLD_BLOCK_LEN],
            )?,
            filtering: codec::decode_persistence(at(registers::PERS)),
            gain: Gain::from_code(at(registers::CONTROL)),
            id: at(registers::ID),
            status: codec::decode_status(at(registers::STATUS)),
        })
    }

    /// The profile that would reproduce this hardware state
    pub fn profile(&self) -> Profile {
        Profile {
            power_on: self.enable.power_on,
            active: self.enable.active,
            wait: self.enable.wait,
            interrupts: self.enable.interrupts,
            integration_time_ms: self.integration.time_ms,
            wait_time_ms: self.wait.time_ms,
            threshold: self.threshold,
            filtering: self.filtering,
            gain: self.gain,
        }
    }
}

/// Read and decode the whole configuration block
pub async fn read_profile<B: RegisterBus>(bus: &mut B) -> Result<ProfileReport, Error<B::Error>> {
    let mut block = [0u8; PROFILE_BLOCK_LEN];
    bus.read(COMMAND_BULK_PROFILE, &mut block)
        .await
        .map_err(Error::Bus)?;
    Ok(ProfileReport::decode(&block)?)
}

/// Apply `profile` over [`Profile::DEFAULT`]
///
/// Every value is encoded before the first transaction so an invalid field
/// leaves the chip untouched. ENABLE is written last, and only if all other
/// writes succeeded.
pub async fn write_profile<B: RegisterBus>(
    bus: &mut B,
    profile: &PartialProfile,
) -> Result<(), Error<B::Error>> {
    let profile = profile.resolve();

    let atime = codec::encode_integration_time_ms(profile.integration_time_ms)?;
    let (wtime, wlong) = codec::encode_wait_time_ms(profile.wait_time_ms)?;
    let threshold = codec::encode_threshold(profile.threshold);
    let persistence = codec::encode_persistence(profile.filtering)?;
    let config = codec::encode_configuration(Configuration { wlong });
    let control = profile.gain.code();
    let enable = codec::encode_enable(profile.enable());

    write_register(bus, registers::ATIME, atime).await?;
    write_register(bus, registers::WTIME, wtime).await?;
    bus.write(COMMAND_BULK_THRESHOLD, &threshold)
        .await
        .map_err(Error::Bus)?;
    write_register(bus, registers::PERS, persistence).await?;
    write_register(bus, registers::CONFIG, config).await?;
    write_register(bus, registers::CONTROL, control).await?;

    write_register(bus, registers::ENABLE, enable).await
}

/// Re-arm the clear channel comparator
pub async fn clear_interrupt<B: RegisterBus>(bus: &mut B) -> Result<(), Error<B::Error>> {
    bus.write_special(COMMAND_CLEAR).await.map_err(Error::Bus)
}

/// Read the comparator window
pub async fn read_threshold<B: RegisterBus>(bus: &mut B) -> Result<Threshold, Error<B::Error>> {
    let mut block = [0u8; THRESHOLD_BLOCK_LEN];
    bus.read(COMMAND_BULK_THRESHOLD, &mut block)
        .await
        .map_err(Error::Bus)?;
    Ok(codec::decode_threshold(&block)?)
}

/// Write the comparator window
pub async fn write_threshold<B: RegisterBus>(
    bus: &mut B,
    threshold: Threshold,
) -> Result<(), Error<B::Error>> {
    bus.write(COMMAND_BULK_THRESHOLD, &codec::encode_threshold(threshold))
        .await
        .map_err(Error::Bus)
}

pub(crate) async fn read_register<B: RegisterBus>(
    bus: &mut B,
    address: u8,
) -> Result<u8, Error<B::Error>> {
    let mut buf = [0u8; 1];
    bus.read(register_command(address), &mut buf)
        .await
        .map_err(Error::Bus)?;
    Ok(buf[0])
}

pub(crate) async fn write_register<B: RegisterBus>(
    bus: &mut B,
    address: u8,
    value: u8,
) -> Result<(), Error<B::Error>> {
    bus.write(register_command(address), &[value])
        .await
        .map_err(Error::Bus)
}
