//! Lyric sequence types

use serde::{Deserialize, Serialize};

/// Lyrics format enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsFormat {
    /// One lyric per text line
    Plain,
    /// Standard LRC format [mm:ss.xx]text
    Lrc,
}

/// A single line of lyrics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    /// The line text
    pub text: String,
    /// Start time in milliseconds, when the source carries timing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
}

impl LyricLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start_time: None,
        }
    }

    pub fn timed(text: impl Into<String>, start_time: u64) -> Self {
        Self {
            text: text.into(),
            start_time: Some(start_time),
        }
    }
}

/// Ordered, non-empty, read-only list of lyric lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricSequence {
    lines: Vec<LyricLine>,
}

impl LyricSequence {
    /// Wrap parsed lines; a sequence needs at least one line
    pub fn new(lines: Vec<LyricLine>) -> Result<Self, LyricsError> {
        if lines.is_empty() {
            return Err(LyricsError::Empty);
        }
        Ok(Self { lines })
    }

    /// Build an untimed sequence from plain strings
    #[cfg(test)]
    pub fn from_texts<I, S>(texts: I) -> Result<Self, LyricsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(LyricLine::new).collect())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    /// Whether every line carries a start time
    pub fn is_timed(&self) -> bool {
        self.lines.iter().all(|l| l.start_time.is_some())
    }
}

/// Errors that can occur while loading lyrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsError {
    /// The source contained no lyric line
    Empty,
    Io(String),
}

impl std::fmt::Display for LyricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LyricsError::Empty => write!(f, "Lyrics contain no lines"),
            LyricsError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for LyricsError {}
