//! Lyrics parsing module
//!
//! Supports two sources:
//! - Plain: one lyric per text line, blank lines skipped
//! - LRC: Standard line-level lyrics [mm:ss.xx]text

mod lrc;
mod types;

pub use types::*;

use std::path::Path;

/// Lines shown when no lyrics file is supplied
pub const SAMPLE_LYRICS: [&str; 7] = [
    "Hear me",
    "雨夜里灿烂的烟火",
    "一秒绽放一秒又坠落",
    "追逐流逝的烟火",
    "我的世界 流光闪烁",
    "如果你听到我",
    "会不会懂",
];

/// Built-in sample sequence
pub fn sample_lyrics() -> LyricSequence {
    LyricSequence::new(SAMPLE_LYRICS.iter().map(|&t| LyricLine::new(t)).collect())
        .unwrap_or_else(|_| unreachable!("sample lyrics are not empty"))
}

/// Detect lyrics format from content
///
/// LRC wins as soon as any line opens with a timestamp.
pub fn detect_format(content: &str) -> LyricsFormat {
    if content.lines().any(lrc::has_timestamp) {
        LyricsFormat::Lrc
    } else {
        LyricsFormat::Plain
    }
}

/// Parse lyrics from string content
pub fn parse_lyrics(content: &str) -> Result<LyricSequence, LyricsError> {
    let format = detect_format(content);
    parse_lyrics_with_format(content, format)
}

/// Parse lyrics with specified format
pub fn parse_lyrics_with_format(
    content: &str,
    format: LyricsFormat,
) -> Result<LyricSequence, LyricsError> {
    let lines = match format {
        LyricsFormat::Lrc => lrc::parse_lrc(content),
        LyricsFormat::Plain => content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(LyricLine::new)
            .collect(),
    };
    LyricSequence::new(lines)
}

/// Load lyrics from a file
pub fn load_lyrics(path: &Path) -> Result<LyricSequence, LyricsError> {
    let content = std::fs::read_to_string(path).map_err(|e| LyricsError::Io(e.to_string()))?;
    // tolerate a UTF-8 BOM from Windows editors
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let lyrics = parse_lyrics(content)?;
    tracing::debug!(
        "Loaded {} lyric lines from {:?} (timed: {})",
        lyrics.len(),
        path,
        lyrics.is_timed()
    );
    Ok(lyrics)
}
