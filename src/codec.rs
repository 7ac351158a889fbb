//! Conversion between typed values and register bytes
//!
//! Encoders validate their input and return [`CodecError`] for values the
//! hardware cannot represent. Decoders are total: every byte pattern the chip
//! can hold decodes to something.

use crate::ll::masks;
use crate::types::{
    Configuration, Enable, Gain, IntegrationTiming, Persistence, RawSample, Status, Threshold,
    WaitTime, WaitTiming,
};

/// Duration of one integration or wait step
pub const STEP_MS: f32 = 2.4;
/// Wait step multiplier applied when WLONG is set
pub const LONG_WAIT_MULTIPLIER: f32 = 12.0;
/// Maximum number of integration or wait steps
pub const MAX_STEPS: u16 = 256;
/// Longest wait reachable without WLONG
pub const MAX_SHORT_WAIT_MS: f32 = MAX_STEPS as f32 * STEP_MS;

/// Value outside what the hardware can represent
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum CodecError {
    /// Integration time (ms) outside 2.4..=614.4
    IntegrationTime(f32),
    /// Wait time (ms) outside 2.4..=7372.8
    WaitTime(f32),
    /// Wait step count outside 1..=256
    WaitCount(u16),
    /// Persistence count not in the APRES table
    Persistence(u8),
    /// Gain multiplier not in {1, 4, 16, 60}
    Gain(u8),
    /// Block shorter than the field being decoded
    ShortBuffer {
        /// Bytes required
        expected: usize,
        /// Bytes supplied
        found: usize,
    },
}

/// Encode the ENABLE register
pub fn encode_enable(enable: Enable) -> u8 {
    let mut value = 0;
    if enable.interrupts {
        value |= masks::ENABLE_AIEN;
    }
    if enable.wait {
        value |= masks::ENABLE_WEN;
    }
    if enable.active {
        value |= masks::ENABLE_AEN;
    }
    if enable.power_on {
        value |= masks::ENABLE_PON;
    }
    value
}

/// Decode the ENABLE register
pub fn decode_enable(value: u8) -> Enable {
    Enable {
        power_on: value & masks::ENABLE_PON != 0,
        active: value & masks::ENABLE_AEN != 0,
        wait: value & masks::ENABLE_WEN != 0,
        interrupts: value & masks::ENABLE_AIEN != 0,
    }
}

// Step arithmetic runs in f64 against an exact 2.4 so that values such as
// 614.4f32 do not land one step short.
const STEP_MS_F64: f64 = 2.4;

fn steps(ms: f32, step_ms: f64) -> f64 {
    libm::trunc(f64::from(ms) / step_ms)
}

/// Encode an integration time into ATIME
///
/// The time is quantized down to whole 2.4 ms cycles.
pub fn encode_integration_time_ms(ms: f32) -> Result<u8, CodecError> {
    let count = steps(ms, STEP_MS_F64);
    if !(1.0..=f64::from(MAX_STEPS)).contains(&count) {
        return Err(CodecError::IntegrationTime(ms));
    }
    Ok((MAX_STEPS - count as u16) as u8)
}

/// Decode ATIME
pub fn decode_integration_timing(atime: u8) -> IntegrationTiming {
    let cycles = MAX_STEPS - u16::from(atime);
    IntegrationTiming {
        atime,
        cycles,
        max_count: u32::from(cycles) * 1024,
        time_ms: f32::from(cycles) * STEP_MS,
    }
}

/// Encode a wait time into WTIME plus the WLONG flag
///
/// The 2.4 ms step is used while it can reach `ms`; longer waits switch to the
/// 12x step. The returned flag must be written to CONFIG alongside WTIME.
pub fn encode_wait_time_ms(ms: f32) -> Result<(u8, bool), CodecError> {
    let wlong = ms > MAX_SHORT_WAIT_MS;
    let step_ms = if wlong {
        STEP_MS_F64 * f64::from(LONG_WAIT_MULTIPLIER)
    } else {
        STEP_MS_F64
    };
    let count = steps(ms, step_ms);
    if !(1.0..=f64::from(MAX_STEPS)).contains(&count) {
        return Err(CodecError::WaitTime(ms));
    }
    Ok(((MAX_STEPS - count as u16) as u8, wlong))
}

/// Encode a wait step count into WTIME
pub fn encode_wait_count(count: u16) -> Result<u8, CodecError> {
    if !(1..=MAX_STEPS).contains(&count) {
        return Err(CodecError::WaitCount(count));
    }
    Ok((MAX_STEPS - count) as u8)
}

/// Decode WTIME
pub fn decode_wait_timing(wtime: u8) -> WaitTiming {
    WaitTiming {
        wtime,
        count: MAX_STEPS - u16::from(wtime),
    }
}

/// Combine decoded WTIME with the WLONG flag into a duration
pub fn format_wait_time(timing: WaitTiming, wlong: bool) -> WaitTime {
    let multiplier = if wlong { LONG_WAIT_MULTIPLIER } else { 1.0 };
    WaitTime {
        wtime: timing.wtime,
        count: timing.count,
        wlong,
        time_ms: f32::from(timing.count) * STEP_MS * multiplier,
    }
}

/// Encode CONFIG
pub fn encode_configuration(config: Configuration) -> u8 {
    if config.wlong {
        masks::CONFIG_WLONG
    } else {
        0
    }
}

/// Decode CONFIG
pub fn decode_configuration(value: u8) -> Configuration {
    Configuration {
        wlong: value & masks::CONFIG_WLONG != 0,
    }
}

/// Encode a window as the AILTL..AIHTH block
pub fn encode_threshold(threshold: Threshold) -> [u8; 4] {
    let [low_lo, low_hi] = threshold.low.to_le_bytes();
    let [high_lo, high_hi] = threshold.high.to_le_bytes();
    [low_lo, low_hi, high_lo, high_hi]
}

/// Decode the AILTL..AIHTH block
pub fn decode_threshold(block: &[u8]) -> Result<Threshold, CodecError> {
    match block {
        [low_lo, low_hi, high_lo, high_hi, ..] => Ok(Threshold {
            low: u16::from_le_bytes([*low_lo, *low_hi]),
            high: u16::from_le_bytes([*high_lo, *high_hi]),
        }),
        _ => Err(CodecError::ShortBuffer {
            expected: 4,
            found: block.len(),
        }),
    }
}

/// Encode PERS
pub fn encode_persistence(persistence: Persistence) -> Result<u8, CodecError> {
    persistence.code()
}

/// Decode PERS
pub fn decode_persistence(value: u8) -> Persistence {
    Persistence::from_code(value)
}

/// Encode CONTROL from a gain multiplier
pub fn encode_gain(multiplier: u8) -> Result<u8, CodecError> {
    Gain::from_multiplier(multiplier).map(Gain::code)
}

/// Decode CONTROL into a gain multiplier
pub fn decode_gain(value: u8) -> u8 {
    Gain::from_code(value).multiplier()
}

/// Decode STATUS
pub fn decode_status(value: u8) -> Status {
    Status {
        valid: value & masks::STATUS_AVALID != 0,
        threshold_violation: value & masks::STATUS_AINT != 0,
    }
}

/// Decode the CDATAL..BDATAH block
pub fn decode_raw_sample(block: &[u8; 8]) -> RawSample {
    RawSample {
        clear: u16::from_le_bytes([block[0], block[1]]),
        red: u16::from_le_bytes([block[2], block[3]]),
        green: u16::from_le_bytes([block[4], block[5]]),
        blue: u16::from_le_bytes([block[6], block[7]]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_bits() {
        let all = Enable {
            power_on: true,
            active: true,
            wait: true,
            interrupts: true,
        };
        assert_eq!(encode_enable(all), 0x1B);
        assert_eq!(decode_enable(0x1B), all);
        assert_eq!(decode_enable(0x03), Enable {
            power_on: true,
            active: true,
            ..Enable::default()
        });
    }

    #[test]
    fn integration_time_quantization_bound() {
        let mut ms = 2.4f32;
        while ms <= 614.4 {
            let atime = encode_integration_time_ms(ms).unwrap();
            let decoded = decode_integration_timing(atime);
            assert!(
                (ms - decoded.time_ms).abs() <= 2.4 + 1e-3,
                "{ms} decoded as {}",
                decoded.time_ms
            );
            ms += 0.7;
        }
    }

    #[test]
    fn integration_time_extremes() {
        assert_eq!(encode_integration_time_ms(2.4), Ok(0xFF));
        assert_eq!(encode_integration_time_ms(614.4), Ok(0x00));
        assert_eq!(
            encode_integration_time_ms(700.0),
            Err(CodecError::IntegrationTime(700.0))
        );
        assert!(encode_integration_time_ms(1.0).is_err());
    }

    #[test]
    fn integration_timing_decode() {
        let timing = decode_integration_timing(0xC0);
        assert_eq!(timing.cycles, 64);
        assert_eq!(timing.max_count, 65536);
        assert!((timing.time_ms - 153.6).abs() < 1e-3);
    }

    #[test]
    fn wait_time_short_regime() {
        let (wtime, wlong) = encode_wait_time_ms(24.0).unwrap();
        assert!(!wlong);
        assert_eq!(wtime, 246);
        let formatted = format_wait_time(decode_wait_timing(wtime), wlong);
        assert_eq!(formatted.count, 10);
        assert!((formatted.time_ms - 24.0).abs() < 1e-3);
    }

    #[test]
    fn wait_time_switches_to_long() {
        let (wtime, wlong) = encode_wait_time_ms(700.0).unwrap();
        assert!(wlong);
        // trunc(700 / 28.8) = 24
        assert_eq!(wtime, 232);
        let formatted = format_wait_time(decode_wait_timing(wtime), wlong);
        assert!((formatted.time_ms - 691.2).abs() < 1e-2);
    }

    #[test]
    fn wait_time_out_of_range() {
        assert_eq!(encode_wait_time_ms(1.0), Err(CodecError::WaitTime(1.0)));
        assert_eq!(encode_wait_time_ms(8000.0), Err(CodecError::WaitTime(8000.0)));
        assert!(encode_wait_time_ms(7372.8).is_ok());
    }

    #[test]
    fn wait_count_bounds() {
        assert_eq!(encode_wait_count(256), Ok(0));
        assert_eq!(encode_wait_count(1), Ok(255));
        assert_eq!(encode_wait_count(0), Err(CodecError::WaitCount(0)));
        assert_eq!(encode_wait_count(257), Err(CodecError::WaitCount(257)));
    }

    #[test]
    fn threshold_round_trip() {
        for (low, high) in [(0, 0), (280, 290), (0x1234, 0xFFFF), (0xFFFF, 0)] {
            let window = Threshold { low, high };
            let block = encode_threshold(window);
            assert_eq!(decode_threshold(&block), Ok(window));
        }
        assert_eq!(encode_threshold(Threshold::new(0x1234, 0xABCD)), [0x34, 0x12, 0xCD, 0xAB]);
    }

    #[test]
    fn threshold_short_block() {
        assert_eq!(
            decode_threshold(&[1, 2, 3]),
            Err(CodecError::ShortBuffer {
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn persistence_table() {
        for cycles in [1u8, 2, 3, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60] {
            let code = encode_persistence(Persistence::Cycles(cycles)).unwrap();
            assert_eq!(decode_persistence(code), Persistence::Cycles(cycles));
        }
        assert_eq!(decode_persistence(encode_persistence(Persistence::Every).unwrap()), Persistence::Every);
        assert_eq!(encode_persistence(Persistence::Cycles(4)), Err(CodecError::Persistence(4)));
    }

    #[test]
    fn gain_table() {
        for multiplier in [1u8, 4, 16, 60] {
            assert_eq!(decode_gain(encode_gain(multiplier).unwrap()), multiplier);
        }
        for multiplier in [0u8, 2, 8, 64] {
            assert_eq!(encode_gain(multiplier), Err(CodecError::Gain(multiplier)));
        }
    }

    #[test]
    fn status_bits() {
        assert_eq!(decode_status(0x11), Status {
            valid: true,
            threshold_violation: true
        });
        assert_eq!(decode_status(0x01), Status {
            valid: true,
            threshold_violation: false
        });
    }

    #[test]
    fn raw_sample_layout() {
        let sample = decode_raw_sample(&[100, 0, 50, 0, 25, 0, 0, 1]);
        assert_eq!(sample, RawSample {
            clear: 100,
            red: 50,
            green: 25,
            blue: 256
        });
    }
}
