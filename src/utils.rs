//! Utility functions

use std::path::PathBuf;

use crate::features::settings::Rgb;

// ============================================================================
// Paths
// ============================================================================

/// Get the per-user config directory for amlyrics
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "amlyrics", "amlyrics")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

// ============================================================================
// Color
// ============================================================================

/// Blend `color` over a black background at `opacity`
///
/// Terminals have no alpha channel, so opacity is baked into the colour.
pub fn fade_to_black(color: Rgb, opacity: f64) -> Rgb {
    let a = opacity.clamp(0.0, 1.0);
    let channel = |c: u8| (c as f64 * a).round() as u8;
    Rgb::new(channel(color.r), channel(color.g), channel(color.b))
}
