//! Terminal preview sink
//!
//! Draws each frame as a block of text lines: colour faded by opacity,
//! bold for the emphasized line, a dimmed tag for blurred lines.

use std::io::Write;

use colored::Colorize;

use crate::features::lyrics::{Frame, FrameSink, LyricSequence};
use crate::features::settings::Alignment;
use crate::utils::fade_to_black;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// [`FrameSink`] writing frames to a terminal (or any writer)
pub struct TerminalSink<W: Write + Send + 'static> {
    texts: Vec<String>,
    width: usize,
    out: W,
    clear: bool,
    failed: bool,
}

impl TerminalSink<std::io::Stdout> {
    /// Sink redrawing the whole screen on stdout
    pub fn stdout(lyrics: &LyricSequence) -> Self {
        Self::new(lyrics, std::io::stdout()).clearing(true)
    }
}

impl<W: Write + Send + 'static> TerminalSink<W> {
    pub fn new(lyrics: &LyricSequence, out: W) -> Self {
        let texts: Vec<String> = lyrics.lines().iter().map(|l| l.text.clone()).collect();
        let width = texts.iter().map(|t| t.chars().count()).max().unwrap_or(0);
        Self {
            texts,
            width,
            out,
            clear: false,
            failed: false,
        }
    }

    /// Clear the screen before every frame
    pub fn clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, frame: &Frame) -> std::io::Result<()> {
        let mut block = String::new();
        if self.clear {
            block.push_str(CLEAR_SCREEN);
        }
        block.push_str(&format!(
            "{}\n\n",
            format!(
                "frame {:>5}  active {:>6.3}",
                frame.sequence, frame.active_position
            )
            .dimmed()
        ));

        for (text, state) in self.texts.iter().zip(&frame.lines) {
            let pad = match state.anchor {
                Alignment::Left => 0,
                Alignment::Center => (self.width - text.chars().count()) / 2,
            };
            let c = fade_to_black(state.color, state.opacity);
            let mut styled = text.truecolor(c.r, c.g, c.b);
            if state.is_emphasized() {
                styled = styled.bold();
            }

            block.push_str(&format!(
                "{} {}{}",
                format!("{:>+7.1}", state.offset_y).dimmed(),
                " ".repeat(pad),
                styled
            ));
            if state.blur > 0.0 {
                block.push_str(&format!(" {}", format!("~blur {}", state.blur).dimmed()));
            }
            if (state.scale - 1.0).abs() > f64::EPSILON {
                block.push_str(&format!(" {}", format!("x{:.2}", state.scale).dimmed()));
            }
            block.push('\n');
        }

        self.out.write_all(block.as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write + Send + 'static> FrameSink for TerminalSink<W> {
    fn render(&mut self, frame: &Frame) {
        if let Err(e) = self.draw(frame) {
            // report once, a closed pipe would otherwise flood the log
            if !self.failed {
                tracing::warn!("Failed to draw preview frame: {}", e);
                self.failed = true;
            }
        }
    }
}
