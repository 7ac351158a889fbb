//! Session configuration

use crate::profile::PartialProfile;
use crate::threshold::Strategy;

/// Configuration for one device session
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Label used in log lines
    #[cfg_attr(feature = "serde", serde(skip))]
    pub name: &'static str,
    /// Delay between setup attempts (milliseconds)
    pub retry_interval_ms: u64,
    /// Re-arm the interrupt once after the profile is applied
    pub clear_interrupt_on_start: bool,
    /// Profile applied on every setup, over [`crate::Profile::DEFAULT`]
    pub profile: PartialProfile,
    /// Poll timer behaviour
    pub poll: PollConfig,
    /// Threshold stepping behaviour
    pub step: StepConfig,
    /// Flash LED
    pub led: PeripheralConfig,
    /// Hardware interrupt line
    pub interrupt: PeripheralConfig,
}

impl DeviceConfig {
    /// Polled status and data, no stepping
    pub const DEFAULT: Self = Self {
        name: "tcs34725",
        retry_interval_ms: 5000,
        clear_interrupt_on_start: true,
        profile: PartialProfile::EMPTY,
        poll: PollConfig::DEFAULT,
        step: StepConfig::DEFAULT,
        led: PeripheralConfig::DISABLED,
        interrupt: PeripheralConfig::DISABLED,
    };

    /// Hardware interrupt driven stepping with polling switched off
    pub const fn interrupt_driven(strategy: Strategy) -> Self {
        Self {
            poll: PollConfig::DISABLED,
            step: StepConfig::hardware(strategy),
            interrupt: PeripheralConfig::ENABLED,
            ..Self::DEFAULT
        }
    }

    /// Polling with stepping decided from the polled status
    pub const fn polled(interval_ms: u64, strategy: Strategy) -> Self {
        Self {
            poll: PollConfig::every(interval_ms),
            step: StepConfig::software(strategy),
            ..Self::DEFAULT
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Poll timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PollConfig {
    /// Run the poll timer at all
    pub enabled: bool,
    /// Poll period (milliseconds)
    pub interval_ms: u64,
    /// Read STATUS on each poll
    pub status: bool,
    /// Read the whole profile block on each poll; supersedes `status`
    pub profile: bool,
    /// Do not read data or emit data events
    pub skip_data: bool,
    /// LED on-time before the data read (milliseconds), 0 for no flash
    pub flash_ms: u64,
}

impl PollConfig {
    /// Status and data once a second
    pub const DEFAULT: Self = Self::every(1000);

    /// No poll timer
    pub const DISABLED: Self = Self {
        enabled: false,
        ..Self::DEFAULT
    };

    /// Status and data every `interval_ms`
    pub const fn every(interval_ms: u64) -> Self {
        Self {
            enabled: true,
            interval_ms,
            status: true,
            profile: false,
            skip_data: false,
            flash_ms: 0,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Threshold stepping configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepConfig {
    /// Adapt the window at all
    pub enabled: bool,
    /// Adaptation policy
    pub strategy: Strategy,
    /// Also step when a poll sees the interrupt flag set
    pub software_interrupt: bool,
}

impl StepConfig {
    /// Stepping off
    pub const DEFAULT: Self = Self {
        enabled: false,
        strategy: Strategy::Walk,
        software_interrupt: false,
    };

    /// Step on the interrupt line
    pub const fn hardware(strategy: Strategy) -> Self {
        Self {
            enabled: true,
            strategy,
            software_interrupt: false,
        }
    }

    /// Step on the polled interrupt flag
    pub const fn software(strategy: Strategy) -> Self {
        Self {
            enabled: true,
            strategy,
            software_interrupt: true,
        }
    }
}

impl Default for StepConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Optional peripheral switch; the pin itself belongs to the [`super::Board`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeripheralConfig {
    /// Acquire the peripheral during setup
    pub enabled: bool,
}

impl PeripheralConfig {
    /// Acquire during setup
    pub const ENABLED: Self = Self { enabled: true };
    /// Leave unused
    pub const DISABLED: Self = Self { enabled: false };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_polls_without_stepping() {
        let config = DeviceConfig::default();
        assert_eq!(config.retry_interval_ms, 5000);
        assert!(config.clear_interrupt_on_start);
        assert!(config.poll.enabled && config.poll.status);
        assert_eq!(config.poll.interval_ms, 1000);
        assert!(!config.step.enabled);
        assert!(!config.led.enabled && !config.interrupt.enabled);
    }

    #[test]
    fn interrupt_driven_preset() {
        let config = DeviceConfig::interrupt_driven(Strategy::Jump);
        assert!(!config.poll.enabled);
        assert!(config.interrupt.enabled);
        assert_eq!(config.step, StepConfig::hardware(Strategy::Jump));
    }

    #[test]
    fn polled_preset_steps_in_software() {
        let config = DeviceConfig::polled(250, Strategy::Walk);
        assert_eq!(config.poll.interval_ms, 250);
        assert!(config.step.software_interrupt);
        assert!(!config.interrupt.enabled);
    }
}
