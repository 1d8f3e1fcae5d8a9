//! Lyrics animation parameter engine
//!
//! Maps a (possibly fractional) active position and a validated config to the
//! visual state of every lyric line. Pure: no clock, no randomness, no I/O, so
//! the live preview and the exported host script can evaluate it identically.
//!
//! ## Key Components
//!
//! - `LensModel`: distance-driven scale, opacity, blur and emphasis
//! - `FocusTransition`: damped move of the active position between lines
//! - `LyricsEngine`: lens bound to a line count, produces whole frames

pub mod lens;
pub mod physics;
pub mod types;

pub use lens::LensModel;
pub use physics::FocusTransition;
pub use types::{FontWeight, Frame, LineVisualState};

use rayon::prelude::*;

use crate::features::settings::ValidConfig;

/// Visual state of `line_index` when the focus sits at `active_index`
///
/// Total over all inputs; the caller is responsible for `line_index` being a
/// real line (see [`LyricsEngine::line_state`] for the checked variant).
pub fn compute_line_state(
    line_index: usize,
    active_index: f64,
    config: &ValidConfig,
) -> LineVisualState {
    LensModel::new(config).line_state(line_index as f64, active_index, config)
}

impl LensModel {
    /// Evaluate every sub-formula for one line
    #[inline]
    pub fn line_state(
        &self,
        line_index: f64,
        active_index: f64,
        config: &ValidConfig,
    ) -> LineVisualState {
        let diff = (line_index - active_index).abs();
        let emphasized = self.emphasis.eval(diff);

        LineVisualState {
            offset_y: self.grid.offset(line_index, active_index),
            scale: self.scale.eval(diff),
            opacity: self.opacity.eval(diff),
            blur: self.blur.eval(diff),
            color: if emphasized {
                config.text_color
            } else {
                config.inactive_color
            },
            weight: if emphasized {
                FontWeight::Bold
            } else {
                FontWeight::Normal
            },
            anchor: config.alignment,
        }
    }
}

/// Lens bound to a config and a lyric line count
#[derive(Debug, Clone)]
pub struct LyricsEngine {
    config: ValidConfig,
    lens: LensModel,
    line_count: usize,
}

impl LyricsEngine {
    pub fn new(config: ValidConfig, line_count: usize) -> Self {
        let lens = LensModel::new(&config);
        Self {
            config,
            lens,
            line_count,
        }
    }

    pub fn config(&self) -> &ValidConfig {
        &self.config
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Checked single-line evaluation
    pub fn line_state(
        &self,
        line_index: usize,
        active_index: f64,
    ) -> Result<LineVisualState, EngineError> {
        if line_index >= self.line_count {
            return Err(EngineError::LineOutOfRange {
                index: line_index,
                line_count: self.line_count,
            });
        }
        Ok(compute_line_state(line_index, active_index, &self.config))
    }

    /// Evaluate all lines for one active position
    pub fn frame(&self, sequence: u64, active_index: f64) -> Frame {
        let mut frame = Frame {
            sequence,
            active_position: active_index,
            lines: Vec::with_capacity(self.line_count),
        };
        self.fill_frame(&mut frame, sequence, active_index);
        frame
    }

    /// Recompute `frame` in place, reusing its line buffer
    pub fn fill_frame(&self, frame: &mut Frame, sequence: u64, active_index: f64) {
        frame.sequence = sequence;
        frame.active_position = active_index;
        frame.lines.clear();
        frame.lines.extend(
            (0..self.line_count)
                .map(|i| self.lens.line_state(i as f64, active_index, &self.config)),
        );
    }

    /// Same as [`frame`](Self::frame), lines evaluated on the rayon pool
    pub fn frame_par(&self, sequence: u64, active_index: f64) -> Frame {
        let lines = (0..self.line_count)
            .into_par_iter()
            .map(|i| self.lens.line_state(i as f64, active_index, &self.config))
            .collect();
        Frame {
            sequence,
            active_position: active_index,
            lines,
        }
    }
}

/// Errors raised by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Caller asked for a line that does not exist
    LineOutOfRange { index: usize, line_count: usize },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::LineOutOfRange { index, line_count } => write!(
                f,
                "Line index {} out of range for {} lyric lines",
                index, line_count
            ),
        }
    }
}

impl std::error::Error for EngineError {}
