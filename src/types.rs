//! Typed register values

use crate::codec::CodecError;

/// ENABLE register flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Enable {
    /// Oscillator on (PON)
    pub power_on: bool,
    /// RGBC conversions running (AEN)
    pub active: bool,
    /// Wait state between conversions (WEN)
    pub wait: bool,
    /// Clear channel interrupt output (AIEN)
    pub interrupts: bool,
}

/// Decoded ATIME register
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct IntegrationTiming {
    /// Raw ATIME byte
    pub atime: u8,
    /// Number of 2.4 ms integration cycles
    pub cycles: u16,
    /// Largest count a channel can reach with this timing
    pub max_count: u32,
    /// Integration time in milliseconds
    pub time_ms: f32,
}

/// Decoded WTIME register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct WaitTiming {
    /// Raw WTIME byte
    pub wtime: u8,
    /// Number of wait steps
    pub count: u16,
}

/// Wait timing combined with the CONFIG long-wait flag
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct WaitTime {
    /// Raw WTIME byte
    pub wtime: u8,
    /// Number of wait steps
    pub count: u16,
    /// Steps are 12x longer
    pub wlong: bool,
    /// Wait time in milliseconds
    pub time_ms: f32,
}

/// CONFIG register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Configuration {
    /// Long wait (WLONG)
    pub wlong: bool,
}

/// Clear channel comparator window
///
/// `low <= high` by convention only; nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Threshold {
    /// Lower bound of the silent band
    pub low: u16,
    /// Upper bound of the silent band
    pub high: u16,
}

impl Threshold {
    /// Create a window
    pub const fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }

    /// True if `clear` lies inside the window (bounds inclusive)
    pub const fn contains(&self, clear: u16) -> bool {
        clear >= self.low && clear <= self.high
    }
}

/// Interrupt persistence filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Persistence {
    /// Every out-of-band cycle raises the interrupt
    #[default]
    Every,
    /// Consecutive out-of-band cycles required; `Cycles(0)` is the same as `Every`
    Cycles(u8),
}

// (cycle count, APRES code), 0 aliases "every"
const APRES_TABLE: [(u8, u8); 16] = [
    (0, 0b0000),
    (1, 0b0001),
    (2, 0b0010),
    (3, 0b0011),
    (5, 0b0100),
    (10, 0b0101),
    (15, 0b0110),
    (20, 0b0111),
    (25, 0b1000),
    (30, 0b1001),
    (35, 0b1010),
    (40, 0b1011),
    (45, 0b1100),
    (50, 0b1101),
    (55, 0b1110),
    (60, 0b1111),
];

impl Persistence {
    /// Cycle count, `0` for every cycle
    pub const fn cycles(self) -> u8 {
        match self {
            Self::Every => 0,
            Self::Cycles(n) => n,
        }
    }

    /// Collapse `Cycles(0)` into `Every`
    #[must_use]
    pub const fn normalized(self) -> Self {
        match self {
            Self::Cycles(0) => Self::Every,
            other => other,
        }
    }

    /// APRES code for this setting
    pub fn code(self) -> Result<u8, CodecError> {
        let cycles = self.cycles();
        APRES_TABLE
            .iter()
            .find(|(count, _)| *count == cycles)
            .map(|(_, code)| *code)
            .ok_or(CodecError::Persistence(cycles))
    }

    /// Setting for an APRES code; only the low four bits are considered
    pub fn from_code(code: u8) -> Self {
        let code = code & crate::ll::masks::PERS_APRES;
        let cycles = APRES_TABLE
            .iter()
            .find(|(_, c)| *c == code)
            .map_or(0, |(count, _)| *count);
        if cycles == 0 {
            Self::Every
        } else {
            Self::Cycles(cycles)
        }
    }
}

/// RGBC analog gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gain {
    /// 1x gain
    #[default]
    X1 = 0b00,
    /// 4x gain
    X4 = 0b01,
    /// 16x gain
    X16 = 0b10,
    /// 60x gain
    X60 = 0b11,
}

const GAIN_TABLE: [(u8, Gain); 4] = [(1, Gain::X1), (4, Gain::X4), (16, Gain::X16), (60, Gain::X60)];

impl Gain {
    /// Gain for a multiplier in {1, 4, 16, 60}
    pub fn from_multiplier(multiplier: u8) -> Result<Self, CodecError> {
        GAIN_TABLE
            .iter()
            .find(|(m, _)| *m == multiplier)
            .map(|(_, gain)| *gain)
            .ok_or(CodecError::Gain(multiplier))
    }

    /// Gain for an AGAIN code; only the low two bits are considered
    pub const fn from_code(code: u8) -> Self {
        match code & crate::ll::masks::CONTROL_AGAIN {
            0b00 => Self::X1,
            0b01 => Self::X4,
            0b10 => Self::X16,
            _ => Self::X60,
        }
    }

    /// Amplification factor
    pub const fn multiplier(self) -> u8 {
        match self {
            Self::X1 => 1,
            Self::X4 => 4,
            Self::X16 => 16,
            Self::X60 => 60,
        }
    }

    /// AGAIN code
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Status {
    /// An integration cycle has completed since AEN was set (AVALID)
    pub valid: bool,
    /// The clear channel left the threshold window (AINT)
    pub threshold_violation: bool,
}

/// One bulk read of the four color channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSample {
    /// Clear (unfiltered) channel count
    pub clear: u16,
    /// Red channel count
    pub red: u16,
    /// Green channel count
    pub green: u16,
    /// Blue channel count
    pub blue: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_every_aliases() {
        assert_eq!(Persistence::Every.code(), Ok(0));
        assert_eq!(Persistence::Cycles(0).code(), Ok(0));
        assert_eq!(Persistence::Cycles(0).normalized(), Persistence::Every);
        assert_eq!(Persistence::from_code(0), Persistence::Every);
    }

    #[test]
    fn persistence_ignores_reserved_bits() {
        assert_eq!(Persistence::from_code(0xF5), Persistence::Cycles(10));
    }

    #[test]
    fn gain_from_code_masks() {
        assert_eq!(Gain::from_code(0b1111_1110), Gain::X16);
        assert_eq!(Gain::X60.multiplier(), 60);
    }

    #[test]
    fn threshold_contains_is_inclusive() {
        let window = Threshold::new(280, 290);
        assert!(window.contains(280));
        assert!(window.contains(290));
        assert!(!window.contains(291));
        assert!(!window.contains(279));
    }
}
