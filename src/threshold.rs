//! Adaptive comparator window
//!
//! The chip only raises an interrupt when the clear channel leaves the
//! `[low, high]` window. After each violation the window is moved so that it
//! follows the light level, using one of two [`Strategy`] policies:
//!
//! - [`Strategy::Jump`] recentres the window on the sample, keeping half the
//!   previous range on each side. Fast transitions cost one interrupt.
//! - [`Strategy::Walk`] shifts the window by half its range toward the sample.
//!   Every intermediate window is visited, so consumers that expect
//!   continuous stepping see no gaps.
//!
//! [`adapt`] is a pure function of the current window, the sample and the
//! strategy. Writing the result back and re-arming the interrupt is the
//! caller's job; see [`crate::Tcs34725::step`].

use embassy_time::Instant;

use crate::types::Threshold;

/// Window adaptation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Recentre the window on the sample
    Jump,
    /// Shift the window by half its range
    #[default]
    Walk,
}

/// Side of the window the sample fell on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Direction {
    /// Below `low`
    Down,
    /// Inside the window, nothing to adapt
    None,
    /// Above `high`
    Up,
}

impl Direction {
    /// Classify `clear` against `window`
    pub const fn of(clear: u16, window: Threshold) -> Self {
        if clear > window.high {
            Self::Up
        } else if clear < window.low {
            Self::Down
        } else {
            Self::None
        }
    }

    /// `-1`, `0` or `+1`
    pub const fn signum(self) -> i32 {
        match self {
            Self::Down => -1,
            Self::None => 0,
            Self::Up => 1,
        }
    }
}

/// Outcome of one adaptation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Adjustment {
    /// Window to write back; unchanged when `direction` is [`Direction::None`]
    pub threshold: Threshold,
    /// Side of the old window the sample fell on
    pub direction: Direction,
    /// Clear channel value that triggered the adaptation
    pub sample_clear: u16,
}

impl Adjustment {
    /// True if the window moved
    pub fn is_step(&self) -> bool {
        self.direction != Direction::None
    }
}

/// Step event emitted after an adaptation was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Step {
    /// The applied adjustment
    pub adjustment: Adjustment,
    /// When the triggering sample was read
    pub timestamp: Instant,
}

/// Compute the next window for `sample_clear`
pub fn adapt(threshold: Threshold, sample_clear: u16, strategy: Strategy) -> Adjustment {
    let direction = Direction::of(sample_clear, threshold);
    if direction == Direction::None {
        return Adjustment {
            threshold,
            direction,
            sample_clear,
        };
    }

    let low = i32::from(threshold.low);
    let high = i32::from(threshold.high);
    let sample = i32::from(sample_clear);
    let half_range = (high - low) / 2;

    let (new_low, new_high) = match strategy {
        Strategy::Jump => (sample - half_range, sample + half_range),
        Strategy::Walk => {
            let step = direction.signum() * half_range;
            (low + step, high + step)
        }
    };

    Adjustment {
        threshold: Threshold {
            low: clamp(new_low),
            high: clamp(new_high),
        },
        direction,
        sample_clear,
    }
}

fn clamp(bound: i32) -> u16 {
    bound.clamp(0, i32::from(u16::MAX)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_recentres_on_sample() {
        let adjustment = adapt(Threshold::new(280, 290), 300, Strategy::Jump);
        assert_eq!(adjustment.direction, Direction::Up);
        assert_eq!(adjustment.threshold, Threshold::new(295, 305));
        assert_eq!(adjustment.sample_clear, 300);
    }

    #[test]
    fn walk_shifts_by_half_range() {
        let adjustment = adapt(Threshold::new(280, 290), 270, Strategy::Walk);
        assert_eq!(adjustment.direction, Direction::Down);
        assert_eq!(adjustment.threshold, Threshold::new(275, 285));
    }

    #[test]
    fn walk_up() {
        let adjustment = adapt(Threshold::new(280, 290), 1000, Strategy::Walk);
        assert_eq!(adjustment.threshold, Threshold::new(285, 295));
    }

    #[test]
    fn low_clamp_leaves_high_alone() {
        let adjustment = adapt(Threshold::new(2, 8), 0, Strategy::Walk);
        assert_eq!(adjustment.direction, Direction::Down);
        assert_eq!(adjustment.threshold, Threshold::new(0, 5));
    }

    #[test]
    fn jump_clamps_each_bound_independently() {
        let adjustment = adapt(Threshold::new(100, 200), 10, Strategy::Jump);
        assert_eq!(adjustment.threshold, Threshold::new(0, 60));

        let adjustment = adapt(Threshold::new(100, 200), 65530, Strategy::Jump);
        assert_eq!(adjustment.threshold, Threshold::new(65480, 0xFFFF));
    }

    #[test]
    fn inside_window_is_not_a_step() {
        let window = Threshold::new(280, 290);
        let adjustment = adapt(window, 285, Strategy::Jump);
        assert_eq!(adjustment.direction, Direction::None);
        assert_eq!(adjustment.threshold, window);
        assert!(!adjustment.is_step());
    }

    #[test]
    fn empty_window_recentres_without_growing() {
        let adjustment = adapt(Threshold::new(0, 0), 500, Strategy::Jump);
        assert_eq!(adjustment.threshold, Threshold::new(500, 500));
    }
}
