//! Lens model for Apple Music-like focus effects
//!
//! Every visual property of a line is a function of `diff`, the absolute
//! distance in line units between the line and the active position:
//!
//! | Property | Shape | Band |
//! |----------|-------|------|
//! | scale    | linear ramp `activeScale → 1.0` | `0.0 ..= 0.8` |
//! | opacity  | linear ramp `1.0 → 0.5` | `1.0 ..= 3.5` |
//! | blur     | step `0 → blurMax` | at `0.3` |
//! | emphasis | step (colour + weight) | at `0.5` |
//!
//! The ramps and steps are plain values so the same instances can be
//! evaluated here and transcribed by the script exporter.

use crate::features::settings::ValidConfig;

/// Scale band: only lines closer than this pop
pub const SCALE_BAND_END: f64 = 0.8;
/// Opacity starts fading beyond this distance
pub const OPACITY_FADE_START: f64 = 1.0;
/// Opacity reaches its floor at this distance
pub const OPACITY_FADE_END: f64 = 3.5;
/// Lines never fade below this opacity
pub const OPACITY_FLOOR: f64 = 0.5;
/// Lines at or beyond this distance are blurred
pub const BLUR_THRESHOLD: f64 = 0.3;
/// Lines closer than this use the active colour and weight
pub const EMPHASIS_THRESHOLD: f64 = 0.5;

/// Clamped linear interpolation over a distance band
///
/// `from` for `diff <= start`, `to` for `diff >= end`, linear in between.
/// Continuous at both edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub start: f64,
    pub end: f64,
    pub from: f64,
    pub to: f64,
}

impl Ramp {
    pub const fn new(start: f64, end: f64, from: f64, to: f64) -> Self {
        Self {
            start,
            end,
            from,
            to,
        }
    }

    #[inline]
    pub fn eval(&self, diff: f64) -> f64 {
        if diff <= self.start {
            self.from
        } else if diff < self.end {
            let t = (diff - self.start) / (self.end - self.start);
            self.from + (self.to - self.from) * t
        } else {
            self.to
        }
    }
}

/// Threshold switch: `below` for `diff < threshold`, else `at_or_above`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<T> {
    pub threshold: f64,
    pub below: T,
    pub at_or_above: T,
}

impl<T: Copy> Step<T> {
    pub const fn new(threshold: f64, below: T, at_or_above: T) -> Self {
        Self {
            threshold,
            below,
            at_or_above,
        }
    }

    #[inline]
    pub fn eval(&self, diff: f64) -> T {
        if diff < self.threshold {
            self.below
        } else {
            self.at_or_above
        }
    }
}

/// Fixed vertical grid translated so the active position sits at 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Distance between adjacent lines in pixels
    pub pitch: f64,
}

impl Grid {
    #[inline]
    pub fn offset(&self, line_index: f64, active_index: f64) -> f64 {
        line_index * self.pitch - active_index * self.pitch
    }
}

/// Distance-driven focus effect for one configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensModel {
    pub grid: Grid,
    pub scale: Ramp,
    pub opacity: Ramp,
    /// Blur radius in pixels
    pub blur: Step<f64>,
    /// Whether the line is drawn with the active colour and bold weight
    pub emphasis: Step<bool>,
}

impl LensModel {
    /// Build the lens for a validated configuration
    ///
    /// `inactive_scale` is deliberately not consulted: the scale outside the
    /// emphasis band is always 1.0 in this recipe.
    pub fn new(config: &ValidConfig) -> Self {
        Self {
            grid: Grid {
                pitch: config.spacing,
            },
            scale: Ramp::new(0.0, SCALE_BAND_END, config.active_scale, 1.0),
            opacity: Ramp::new(OPACITY_FADE_START, OPACITY_FADE_END, 1.0, OPACITY_FLOOR),
            blur: Step::new(BLUR_THRESHOLD, 0.0, config.blur_max),
            emphasis: Step::new(EMPHASIS_THRESHOLD, true, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::settings::ScriptConfig;

    fn lens_with(config: ScriptConfig) -> LensModel {
        LensModel::new(&config.validated().unwrap())
    }

    #[test]
    fn test_scale_band() {
        let lens = lens_with(ScriptConfig::default());

        assert_eq!(lens.scale.eval(0.0), 1.1);
        assert!((lens.scale.eval(0.4) - 1.05).abs() < 1e-12);
        // continuous at the band edge
        assert_eq!(lens.scale.eval(SCALE_BAND_END), 1.0);
        assert!((lens.scale.eval(SCALE_BAND_END - 1e-9) - 1.0).abs() < 1e-6);
        assert_eq!(lens.scale.eval(0.81), 1.0);
        assert_eq!(lens.scale.eval(12.0), 1.0);
    }

    #[test]
    fn test_ramps_match_closed_form_bit_for_bit() {
        for active_scale in [1.1, 1.37, 0.9] {
            let lens = lens_with(ScriptConfig {
                active_scale,
                ..Default::default()
            });
            for k in 0..=10_000 {
                let diff = k as f64 * 0.0005;
                if diff < SCALE_BAND_END {
                    let t = diff / 0.8;
                    let expected = active_scale + (1.0 - active_scale) * t;
                    assert_eq!(lens.scale.eval(diff).to_bits(), expected.to_bits(), "diff {}", diff);
                }
                if diff > OPACITY_FADE_START && diff < OPACITY_FADE_END {
                    let t = (diff - 1.0) / 2.5;
                    let expected = 1.0 - 0.5 * t;
                    assert_eq!(lens.opacity.eval(diff).to_bits(), expected.to_bits(), "diff {}", diff);
                }
            }
        }
    }

    #[test]
    fn test_inactive_scale_is_not_applied() {
        let lens = lens_with(ScriptConfig {
            inactive_scale: 0.5,
            ..Default::default()
        });
        assert_eq!(lens.scale.eval(2.0), 1.0);
    }

    #[test]
    fn test_opacity_band() {
        let lens = lens_with(ScriptConfig::default());

        for diff in [0.0, 0.5, 1.0] {
            assert_eq!(lens.opacity.eval(diff), 1.0, "diff {}", diff);
        }
        assert!((lens.opacity.eval(2.25) - 0.75).abs() < 1e-12);
        for diff in [3.5, 4.0, 100.0] {
            assert_eq!(lens.opacity.eval(diff), 0.5, "diff {}", diff);
        }
    }

    #[test]
    fn test_opacity_is_monotonic_beyond_one() {
        let lens = lens_with(ScriptConfig::default());
        let mut last = lens.opacity.eval(1.0);
        let mut diff = 1.0;
        while diff <= 5.0 {
            let value = lens.opacity.eval(diff);
            assert!(value <= last, "opacity rose at diff {}", diff);
            last = value;
            diff += 0.01;
        }
    }

    #[test]
    fn test_blur_is_binary() {
        for blur_max in [0.0, 20.0, 100.0] {
            let lens = lens_with(ScriptConfig {
                blur_max,
                ..Default::default()
            });
            assert_eq!(lens.blur.eval(0.0), 0.0);
            assert_eq!(lens.blur.eval(0.299), 0.0);
            assert_eq!(lens.blur.eval(0.3), blur_max);
            assert_eq!(lens.blur.eval(0.7), blur_max);
            assert_eq!(lens.blur.eval(50.0), blur_max);
        }
    }

    #[test]
    fn test_emphasis_threshold() {
        let lens = lens_with(ScriptConfig::default());
        assert!(lens.emphasis.eval(0.0));
        assert!(lens.emphasis.eval(0.49));
        assert!(!lens.emphasis.eval(0.5));
        assert!(!lens.emphasis.eval(3.0));
    }

    #[test]
    fn test_grid_is_linear() {
        let grid = Grid { pitch: 180.0 };
        assert_eq!(grid.offset(2.0, 2.0), 0.0);
        assert_eq!(grid.offset(3.0, 2.0), 180.0);
        assert_eq!(grid.offset(0.0, 2.0), -360.0);
        assert_eq!(grid.offset(6.0, 2.0), 720.0);
    }
}
