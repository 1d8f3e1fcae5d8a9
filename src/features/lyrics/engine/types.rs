//! Output types of the lyrics engine

use serde::Serialize;

use crate::features::settings::{Alignment, Rgb};

/// Font weight of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Normal,
    Bold,
}

/// Rendering attributes of one line at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineVisualState {
    /// Vertical offset from the focus anchor in pixels (positive = below)
    pub offset_y: f64,
    /// Scale factor, 1.0 = natural size
    pub scale: f64,
    /// Opacity (0.5 - 1.0)
    pub opacity: f64,
    /// Blur radius in pixels
    pub blur: f64,
    pub color: Rgb,
    pub weight: FontWeight,
    pub anchor: Alignment,
}

impl LineVisualState {
    /// Whether the line is drawn as the focused one
    pub fn is_emphasized(&self) -> bool {
        self.weight == FontWeight::Bold
    }
}

/// Visual state of every line for one active position
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Monotonic frame counter assigned by the render driver
    pub sequence: u64,
    /// Active position the frame was computed for
    pub active_position: f64,
    /// One entry per lyric line, in line order
    pub lines: Vec<LineVisualState>,
}

