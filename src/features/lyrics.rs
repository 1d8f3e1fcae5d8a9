//! Lyrics module - parsing, animation and playback
//!
//! - `parser`: lyric sequence loading (plain text, LRC)
//! - `engine`: pure per-line visual state computation
//! - `driver`: timer-driven active line and frame production

pub mod driver;
pub mod engine;
pub mod parser;

// Re-export commonly used items
pub use driver::{DriverOptions, DriverSummary, FrameSink, RenderDriver};
pub use engine::{Frame, LineVisualState, LyricsEngine};
pub use parser::*;
