//! Standard LRC format parser
//!
//! Supports the common [mm:ss.xx]text format with line-level synchronization.

use super::types::LyricLine;

/// Parse timestamp from LRC format: [mm:ss.xx] or [mm:ss:xx]
fn parse_time(src: &str) -> Option<(usize, u64)> {
    if !src.starts_with('[') {
        return None;
    }

    let end_bracket = src.find(']')?;
    let time_str = &src[1..end_bracket];

    // Skip metadata tags like [ar:Artist], [ti:Title]
    if time_str.chars().next().is_some_and(|c| c.is_alphabetic()) {
        return None;
    }

    // Parse mm:ss.xx or mm:ss:xx
    let parts: Vec<&str> = time_str.split([':', '.']).collect();

    let time_ms = match parts.len() {
        2 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            to_millis(min, sec, 0)?
        }
        3 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            let ms_str = parts[2];
            let mut ms: u64 = ms_str.parse().ok()?;

            // xx (centiseconds) vs xxx (milliseconds)
            match ms_str.len() {
                1 => ms *= 100,
                2 => ms *= 10,
                3 => {}
                _ => return None,
            }

            to_millis(min, sec, ms)?
        }
        _ => return None,
    };

    Some((end_bracket + 1, time_ms))
}

/// `None` when the timestamp does not fit in a `u64` of milliseconds
fn to_millis(min: u64, sec: u64, ms: u64) -> Option<u64> {
    min.checked_mul(60_000)?
        .checked_add(sec.checked_mul(1000)?)?
        .checked_add(ms)
}

/// Parse a single LRC line, which may have multiple timestamps
fn parse_line(line: &str) -> Vec<LyricLine> {
    let mut timestamps = Vec::new();
    let mut pos = 0;
    let line = line.trim();

    while pos < line.len() {
        if let Some((consumed, time)) = parse_time(&line[pos..]) {
            timestamps.push(time);
            pos += consumed;
        } else {
            break;
        }
    }

    let text = line[pos..].trim();
    if text.is_empty() {
        return Vec::new();
    }

    timestamps
        .into_iter()
        .map(|start| LyricLine::timed(text, start))
        .collect()
}

/// Whether a line opens with an LRC timestamp
pub fn has_timestamp(line: &str) -> bool {
    parse_time(line.trim()).is_some()
}

/// Parse LRC content into timed lyric lines, sorted by start time
///
/// Untimed lines, metadata tags and empty (instrumental) lines are dropped.
pub fn parse_lrc(src: &str) -> Vec<LyricLine> {
    let mut result: Vec<LyricLine> = src.lines().flat_map(parse_line).collect();
    // stable: equal timestamps keep file order
    result.sort_by_key(|l| l.start_time);
    result
}
