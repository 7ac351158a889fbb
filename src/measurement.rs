//! Physical quantities derived from a raw color sample

use crate::types::RawSample;

/// Each channel as a fraction of full scale
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Ratio {
    /// Red / 0xFFFF
    pub r: f32,
    /// Green / 0xFFFF
    pub g: f32,
    /// Blue / 0xFFFF
    pub b: f32,
    /// Clear / 0xFFFF
    pub c: f32,
}

/// Display color, each channel normalized against clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Rgb {
    /// Red, 0-255
    pub r: u8,
    /// Green, 0-255
    pub g: u8,
    /// Blue, 0-255
    pub b: u8,
    /// Clear was zero so no color could be derived
    pub zero: bool,
}

/// Measurement derived from one [`RawSample`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Measurement {
    /// The sample everything else was computed from
    pub raw: RawSample,
    /// Channel ratios
    pub ratio: Ratio,
    /// Display color
    pub rgb: Rgb,
    /// Photometric proxy (CIE Y); NaN when clear is zero
    pub lux: f32,
    /// Correlated color temperature in Kelvin; NaN when clear is zero
    pub color_temperature_k: f32,
}

impl Measurement {
    /// Derive all quantities from a raw sample
    pub fn from_raw(raw: RawSample) -> Self {
        derive_measurement(raw)
    }
}

const FULL_SCALE: f32 = 65535.0;

/// Derive ratio, display color, lux and color temperature
pub fn derive_measurement(raw: RawSample) -> Measurement {
    let ratio = Ratio {
        r: f32::from(raw.red) / FULL_SCALE,
        g: f32::from(raw.green) / FULL_SCALE,
        b: f32::from(raw.blue) / FULL_SCALE,
        c: f32::from(raw.clear) / FULL_SCALE,
    };

    if raw.clear == 0 {
        return Measurement {
            raw,
            ratio,
            rgb: Rgb {
                zero: true,
                ..Rgb::default()
            },
            lux: f32::NAN,
            color_temperature_k: f32::NAN,
        };
    }

    let (lux, color_temperature_k) = lux_and_temperature(raw);
    Measurement {
        raw,
        ratio,
        rgb: display_rgb(raw),
        lux,
        color_temperature_k,
    }
}

// `as u8` truncates toward zero and saturates above 255
fn display_rgb(raw: RawSample) -> Rgb {
    let clear = f32::from(raw.clear);
    let scale = |channel: u16| (f32::from(channel) / clear * 255.0) as u8;
    Rgb {
        r: scale(raw.red),
        g: scale(raw.green),
        b: scale(raw.blue),
        zero: false,
    }
}

fn lux_and_temperature(raw: RawSample) -> (f32, f32) {
    let r = f32::from(raw.red);
    let g = f32::from(raw.green);
    let b = f32::from(raw.blue);

    // Map RGB to CIE tristimulus values
    let x = -0.14282 * r + 1.54924 * g + -0.95641 * b;
    let y = -0.32466 * r + 1.57837 * g + -0.73191 * b;
    let z = -0.68202 * r + 0.77073 * g + 0.56332 * b;

    // Chromaticity coordinates
    let sum = x + y + z;
    let xc = x / sum;
    let yc = y / sum;

    // McCamy's approximation for CCT
    let n = (xc - 0.3320) / (0.1858 - yc);
    let cct = 449.0 * libm::powf(n, 3.0) + 3525.0 * libm::powf(n, 2.0) + 6823.3 * n + 5520.33;

    (y, cct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_clear_yields_zero_rgb_and_nan() {
        let measurement = derive_measurement(RawSample::default());
        assert_eq!(measurement.rgb, Rgb {
            r: 0,
            g: 0,
            b: 0,
            zero: true
        });
        assert!(measurement.lux.is_nan());
        assert!(measurement.color_temperature_k.is_nan());
    }

    #[test]
    fn rgb_is_scaled_by_clear() {
        let raw = RawSample {
            clear: 100,
            red: 50,
            green: 25,
            blue: 0,
        };
        let measurement = derive_measurement(raw);
        assert_eq!(measurement.raw, raw);
        assert_eq!(measurement.rgb, Rgb {
            r: 127,
            g: 63,
            b: 0,
            zero: false
        });
        assert!((measurement.ratio.r - 50.0 / 65535.0).abs() < 1e-9);
        assert!((measurement.ratio.g - 25.0 / 65535.0).abs() < 1e-9);
        assert!((measurement.ratio.c - 100.0 / 65535.0).abs() < 1e-9);
        assert!(measurement.ratio.b.abs() < f32::EPSILON);
    }

    #[test]
    fn lux_is_tristimulus_y() {
        let raw = RawSample {
            clear: 1000,
            red: 400,
            green: 300,
            blue: 200,
        };
        let measurement = derive_measurement(raw);
        let expected = -0.32466 * 400.0 + 1.57837 * 300.0 + -0.73191 * 200.0;
        assert!((measurement.lux - expected).abs() < 1e-2);
        assert!(measurement.color_temperature_k.is_finite());
    }

    #[test]
    fn channel_above_clear_saturates() {
        let raw = RawSample {
            clear: 10,
            red: 20,
            green: 10,
            blue: 5,
        };
        let rgb = derive_measurement(raw).rgb;
        assert_eq!(rgb.r, 255);
        assert_eq!(rgb.g, 255);
        assert_eq!(rgb.b, 127);
    }
}
