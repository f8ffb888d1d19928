//! Subtitle entries and SubRip parsing.
//!
//! This module provides [`SubtitleEntry`], one timed caption, together with
//! [`parse_srt`] and [`load_srt`] for reading SubRip (`.srt`) files. Text
//! subtitle tracks embedded in a media container can be read with
//! [`MediaFile::subtitle_entries`](crate::MediaFile::subtitle_entries).
//!
//! # Example
//!
//! ```
//! use subclip::parse_srt;
//!
//! let entries = parse_srt("1\n00:00:01,000 --> 00:00:04,000\nHello world\n")?;
//! assert_eq!(entries.len(), 1);
//! assert_eq!(entries[0].text, "Hello world");
//! # Ok::<(), subclip::SubclipError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use crate::error::SubclipError;

/// A half-open range of character offsets `[start, end)` into an entry's
/// normalized text.
///
/// Offsets count Unicode scalar values, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchSpan {
    /// Character index of the first matched character.
    pub start: usize,
    /// Character index one past the last matched character.
    pub end: usize,
}

impl MatchSpan {
    /// Number of characters covered by the span.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` falls inside the span.
    pub fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }
}

/// A single subtitle caption with its display interval.
///
/// The authored `text` is kept untouched for display. Matching works on a
/// separate normalized copy (lowercased for case-insensitive runs), and the
/// [`match_spans`](SubtitleEntry::match_spans) index into that copy.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    /// The cue number, as written in the subtitle file.
    pub index: usize,
    /// When this subtitle starts displaying.
    pub start: Duration,
    /// When this subtitle stops displaying.
    pub end: Duration,
    /// The caption text as authored.
    pub text: String,
    normalized: String,
    match_spans: Vec<MatchSpan>,
}

impl SubtitleEntry {
    /// Create an unmatched entry.
    pub fn new(index: usize, start: Duration, end: Duration, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            index,
            start,
            end,
            normalized: text.clone(),
            text,
            match_spans: Vec::new(),
        }
    }

    /// The comparison copy of the text that match offsets refer to.
    pub fn normalized_text(&self) -> &str {
        &self.normalized
    }

    /// Every recorded occurrence of the pattern, in scan order.
    ///
    /// Empty unless the entry was returned by the [`Matcher`](crate::Matcher).
    pub fn match_spans(&self) -> &[MatchSpan] {
        &self.match_spans
    }

    /// The first recorded occurrence, if any.
    pub fn first_match(&self) -> Option<MatchSpan> {
        self.match_spans.first().copied()
    }

    /// Whether the matcher recorded at least one occurrence.
    pub fn is_match(&self) -> bool {
        !self.match_spans.is_empty()
    }

    /// Display duration of the entry.
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Return a copy annotated with a normalized text and its match spans.
    pub(crate) fn with_matches(&self, normalized: String, match_spans: Vec<MatchSpan>) -> Self {
        Self {
            index: self.index,
            start: self.start,
            end: self.end,
            text: self.text.clone(),
            normalized,
            match_spans,
        }
    }
}

/// Read and parse a SubRip file.
///
/// # Errors
///
/// - [`SubclipError::FileOpen`] if the file cannot be read.
/// - [`SubclipError::SubtitleParse`] if the content is malformed.
pub fn load_srt<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleEntry>, SubclipError> {
    let path = path.as_ref();
    log::debug!("Loading subtitles from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|error| SubclipError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;
    parse_srt(&content)
}

/// Parse SubRip content into entries, in file order.
///
/// A leading UTF-8 byte order mark is ignored, CRLF line endings are
/// accepted, and multi-line captions are joined with `\n`. Both `,` and `.`
/// are accepted as the millisecond separator, and anything after the end
/// timestamp (positional hints) is ignored. A block without a cue number
/// is numbered after its position.
///
/// # Errors
///
/// Returns [`SubclipError::SubtitleParse`] naming the offending line when a
/// block has no timing line, a timestamp is malformed, or an entry ends
/// before it starts.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>, SubclipError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut entries = Vec::new();
    let mut lines = content.lines().enumerate().peekable();

    loop {
        while lines
            .peek()
            .is_some_and(|(_, line)| line.trim().is_empty())
        {
            lines.next();
        }

        let Some((first_number, first_line)) = lines.next() else {
            break;
        };

        let (index, timing_number, timing_line) = if first_line.contains("-->") {
            (entries.len() + 1, first_number, first_line)
        } else {
            let index = first_line.trim().parse::<usize>().map_err(|_| {
                SubclipError::SubtitleParse {
                    line: first_number + 1,
                    reason: format!("expected a cue number, found {:?}", first_line.trim()),
                }
            })?;
            let (timing_number, timing_line) =
                lines.next().ok_or_else(|| SubclipError::SubtitleParse {
                    line: first_number + 2,
                    reason: "missing timing line".to_string(),
                })?;
            (index, timing_number, timing_line)
        };

        let (start, end) = parse_timing_line(timing_line).map_err(|reason| {
            SubclipError::SubtitleParse {
                line: timing_number + 1,
                reason,
            }
        })?;
        if end < start {
            return Err(SubclipError::SubtitleParse {
                line: timing_number + 1,
                reason: format!("cue ends ({end:?}) before it starts ({start:?})"),
            });
        }

        let mut text_lines: Vec<&str> = Vec::new();
        while let Some((_, line)) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            text_lines.push(line.trim_end());
            lines.next();
        }

        entries.push(SubtitleEntry::new(index, start, end, text_lines.join("\n")));
    }

    log::debug!("Parsed {} subtitle entries", entries.len());
    Ok(entries)
}

/// Split `00:00:01,000 --> 00:00:04,000 X1:...` into its two timestamps.
fn parse_timing_line(line: &str) -> Result<(Duration, Duration), String> {
    let (start_text, rest) = line
        .split_once("-->")
        .ok_or_else(|| format!("expected a timing line, found {:?}", line.trim()))?;
    let end_text = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| "missing end timestamp".to_string())?;

    Ok((parse_timestamp(start_text.trim())?, parse_timestamp(end_text)?))
}

/// Parse `HH:MM:SS,mmm` (or `HH:MM:SS.mmm`, or `MM:SS,mmm`).
pub(crate) fn parse_timestamp(value: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid timestamp {value:?}");

    let (clock, fraction) = match value.find([',', '.']) {
        Some(position) => (&value[..position], &value[position + 1..]),
        None => (value, ""),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [hours, minutes, seconds] => (*hours, *minutes, *seconds),
        [minutes, seconds] => ("0", *minutes, *seconds),
        _ => return Err(invalid()),
    };

    let hours: u64 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: u64 = seconds.trim().parse().map_err(|_| invalid())?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    // Normalise the fraction to milliseconds: "5" is 500ms, "0005" is 0ms.
    let millis = if fraction.is_empty() {
        0
    } else {
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let digits: String = fraction.chars().chain("000".chars()).take(3).collect();
        digits.parse::<u64>().map_err(|_| invalid())?
    };

    Ok(Duration::from_millis(
        ((hours * 60 + minutes) * 60 + seconds) * 1000 + millis,
    ))
}

/// Format a duration as `HH:MM:SS.mmm`.
pub fn format_timestamp(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = duration.subsec_millis();
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Strip ASS/SSA formatting from a decoded subtitle rect.
///
/// Removes the `Dialogue:` field prefix and `{\...}` override blocks, and
/// turns `\N` line breaks into newlines.
pub(crate) fn strip_ass_tags(input: &str) -> String {
    // Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,Text here
    let text = if input.starts_with("Dialogue:") {
        input
            .char_indices()
            .filter(|(_, c)| *c == ',')
            .nth(8)
            .map_or(input, |(position, _)| &input[position + 1..])
    } else {
        input
    };

    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '{' if !in_tag => in_tag = true,
            '}' if in_tag => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .trim()
        .to_string()
}
