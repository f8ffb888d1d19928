//! Pattern matching over subtitle entries.
//!
//! [`Matcher`] scans entries for every non-overlapping occurrence of a
//! [`Pattern`] and returns the entries that matched, annotated with the
//! character offsets of each occurrence.

use crate::pattern::Pattern;
use crate::subtitle::{MatchSpan, SubtitleEntry};

/// Finds subtitle entries containing a pattern.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use subclip::{Matcher, Pattern, SubtitleEntry};
///
/// let entries = vec![
///     SubtitleEntry::new(1, Duration::ZERO, Duration::from_secs(2), "Hello there"),
///     SubtitleEntry::new(2, Duration::from_secs(2), Duration::from_secs(4), "General Kenobi"),
/// ];
/// let matcher = Matcher::new(Pattern::new("hello")?);
/// let matches = matcher.find(&entries);
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].match_spans()[0].start, 0);
/// # Ok::<(), subclip::SubclipError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: Pattern,
}

impl Matcher {
    /// Create a matcher for `pattern`.
    pub fn new(pattern: Pattern) -> Self {
        Self { pattern }
    }

    /// The pattern this matcher searches for.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Return the entries that contain the pattern, in input order.
    ///
    /// Each returned entry carries its normalized text and the spans of all
    /// non-overlapping occurrences. An empty result means there is nothing
    /// to do; it is not an error at this level.
    pub fn find(&self, entries: &[SubtitleEntry]) -> Vec<SubtitleEntry> {
        let matches: Vec<SubtitleEntry> = entries
            .iter()
            .filter_map(|entry| self.match_entry(entry))
            .collect();

        log::debug!(
            "Pattern {:?} matched {} of {} entries",
            self.pattern.as_str(),
            matches.len(),
            entries.len()
        );
        matches
    }

    /// Like [`find`](Self::find), but scans entries on the rayon thread pool.
    /// Results keep input order.
    #[cfg(feature = "rayon")]
    pub fn find_parallel(&self, entries: &[SubtitleEntry]) -> Vec<SubtitleEntry> {
        crate::rayon::parallel_find(self, entries)
    }

    /// Scan a single entry, returning an annotated copy if it matched.
    pub fn match_entry(&self, entry: &SubtitleEntry) -> Option<SubtitleEntry> {
        let normalized = self.pattern.normalize(&entry.text);
        let spans = char_spans(&self.pattern, &normalized);
        if spans.is_empty() {
            None
        } else {
            Some(entry.with_matches(normalized, spans))
        }
    }
}

/// Collect the character-offset spans of every match in `text`.
///
/// Regex offsets are byte positions; they are translated to character
/// positions in a single forward walk since matches arrive in order.
fn char_spans(pattern: &Pattern, text: &str) -> Vec<MatchSpan> {
    let mut spans = Vec::new();
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    let mut advance = |byte_target: usize| {
        char_cursor += text[byte_cursor..byte_target].chars().count();
        byte_cursor = byte_target;
        char_cursor
    };

    // Zero-width matches (`a*`, `\b`) locate nothing to clip.
    for found in pattern.regex().find_iter(text).filter(|found| !found.is_empty()) {
        let start = advance(found.start());
        let end = advance(found.end());
        spans.push(MatchSpan { start, end });
    }

    spans
}
