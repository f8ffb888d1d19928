//! Pattern matching integration tests.

use std::time::Duration;

use subclip::{MatchSpan, Matcher, Pattern, SubclipError, SubtitleEntry};

fn entry(index: usize, text: &str) -> SubtitleEntry {
    let start = Duration::from_secs(index as u64 * 2);
    SubtitleEntry::new(index, start, start + Duration::from_secs(2), text)
}

fn spans(entry: &SubtitleEntry) -> Vec<(usize, usize)> {
    entry
        .match_spans()
        .iter()
        .map(|span| (span.start, span.end))
        .collect()
}

// ── Selection of entries ───────────────────────────────────────────

#[test]
fn returns_only_matching_entries_in_order() {
    let entries = vec![
        entry(1, "Hello there"),
        entry(2, "General Kenobi"),
        entry(3, "you are a bold one, hello"),
    ];
    let matches = Matcher::new(Pattern::new("hello").unwrap()).find(&entries);

    let indices: Vec<usize> = matches.iter().map(|entry| entry.index).collect();
    assert_eq!(indices, vec![1, 3]);
    assert!(matches.iter().all(SubtitleEntry::is_match));
}

#[test]
fn no_match_yields_empty_result() {
    let entries = vec![entry(1, "hello world"), entry(2, "goodbye")];
    let matches = Matcher::new(Pattern::new("xyz").unwrap()).find(&entries);
    assert!(matches.is_empty());
}

#[test]
fn unmatched_entries_have_no_spans() {
    let original = entry(1, "hello world");
    assert!(original.match_spans().is_empty());
    assert!(!original.is_match());
    assert_eq!(original.first_match(), None);
}

// ── Case handling ──────────────────────────────────────────────────

#[test]
fn case_insensitive_by_default() {
    let entries = vec![entry(1, "HELLO There")];
    let matches = Matcher::new(Pattern::new("hello").unwrap()).find(&entries);

    assert_eq!(matches.len(), 1);
    assert_eq!(spans(&matches[0]), vec![(0, 5)]);
    assert_eq!(matches[0].text, "HELLO There");
    assert_eq!(matches[0].normalized_text(), "hello there");
}

#[test]
fn uppercase_pattern_matches_when_insensitive() {
    let entries = vec![entry(1, "hello there")];
    let matches = Matcher::new(Pattern::new("THERE").unwrap()).find(&entries);
    assert_eq!(spans(&matches[0]), vec![(6, 11)]);
}

#[test]
fn case_sensitive_rejects_other_case() {
    let pattern = Pattern::new("hello").unwrap().case_sensitive().unwrap();
    let entries = vec![entry(1, "HELLO"), entry(2, "hello")];
    let matches = Matcher::new(pattern).find(&entries);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].index, 2);
    assert_eq!(matches[0].normalized_text(), "hello");
}

#[test]
fn case_sensitive_keeps_text_unchanged() {
    let pattern = Pattern::with_flags("Kenobi", true, false).unwrap();
    let matches = Matcher::new(pattern).find(&[entry(1, "General Kenobi")]);
    assert_eq!(matches[0].normalized_text(), "General Kenobi");
    assert_eq!(spans(&matches[0]), vec![(8, 14)]);
}

// ── Regex and literal semantics ────────────────────────────────────

#[test]
fn pattern_is_a_regular_expression() {
    let entries = vec![entry(1, "abc"), entry(2, "a-c"), entry(3, "ac")];
    let matches = Matcher::new(Pattern::new("a.c").unwrap()).find(&entries);
    assert_eq!(matches.len(), 2);
}

#[test]
fn literal_escapes_metacharacters() {
    let pattern = Pattern::new("a.c").unwrap().literal().unwrap();
    assert!(pattern.is_literal());

    let entries = vec![entry(1, "abc"), entry(2, "see a.c run")];
    let matches = Matcher::new(pattern).find(&entries);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].index, 2);
    assert_eq!(spans(&matches[0]), vec![(4, 7)]);
}

#[test]
fn uppercase_escapes_keep_meaning_when_insensitive() {
    let matches = Matcher::new(Pattern::new(r"\D+").unwrap()).find(&[entry(1, "123abc")]);
    assert_eq!(spans(&matches[0]), vec![(3, 6)]);
}

#[test]
fn invalid_regex_is_rejected() {
    let result = Pattern::new("(unclosed");
    assert!(matches!(result, Err(SubclipError::InvalidPattern(_))));
}

#[test]
fn invalid_regex_is_fine_as_literal() {
    let pattern = Pattern::with_flags("(unclosed", false, true).unwrap();
    let matches = Matcher::new(pattern).find(&[entry(1, "an (unclosed paren")]);
    assert_eq!(spans(&matches[0]), vec![(3, 12)]);
}

#[test]
fn empty_pattern_is_rejected() {
    assert!(matches!(
        Pattern::new(""),
        Err(SubclipError::InvalidPattern(_))
    ));
}

#[test]
fn zero_width_matches_are_ignored() {
    let matcher = Matcher::new(Pattern::new("x*").unwrap());
    let matches = matcher.find(&[entry(1, "no letter here"), entry(2, "a box")]);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].index, 2);
    assert_eq!(spans(&matches[0]), vec![(4, 5)]);
}

// ── Spans ──────────────────────────────────────────────────────────

#[test]
fn records_every_non_overlapping_occurrence() {
    let matches = Matcher::new(Pattern::new("aa").unwrap()).find(&[entry(1, "aaaaa")]);
    assert_eq!(spans(&matches[0]), vec![(0, 2), (2, 4)]);
}

#[test]
fn spans_are_ascending_and_disjoint() {
    let matches =
        Matcher::new(Pattern::new("o").unwrap()).find(&[entry(1, "to boldly go where no one")]);
    let found = matches[0].match_spans();
    assert_eq!(found.len(), 5);
    for pair in found.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
    assert!(found.iter().all(|span| span.start < span.end));
}

#[test]
fn spans_are_character_offsets() {
    let matches = Matcher::new(Pattern::new("au").unwrap()).find(&[entry(1, "café au lait")]);
    assert_eq!(spans(&matches[0]), vec![(5, 7)]);
    assert_eq!(matches[0].first_match(), Some(MatchSpan { start: 5, end: 7 }));
}

#[test]
fn spans_after_multibyte_characters() {
    let matches = Matcher::new(Pattern::new("ok").unwrap()).find(&[entry(1, "日本語 ok 日本 ok")]);
    assert_eq!(spans(&matches[0]), vec![(4, 6), (10, 12)]);
}

#[test]
fn span_helpers() {
    let span = MatchSpan { start: 2, end: 5 };
    assert_eq!(span.len(), 3);
    assert!(!span.is_empty());
    assert!(span.contains(2));
    assert!(span.contains(4));
    assert!(!span.contains(5));
}

// ── Idempotence ────────────────────────────────────────────────────

#[test]
fn matching_twice_gives_same_spans() {
    let matcher = Matcher::new(Pattern::new("one").unwrap());
    let entries = vec![entry(1, "one two one"), entry(2, "none")];

    let first = matcher.find(&entries);
    let second = matcher.find(&first);
    assert_eq!(first, second);
}

#[test]
fn match_entry_on_single_entry() {
    let matcher = Matcher::new(Pattern::new("two").unwrap());
    assert!(matcher.match_entry(&entry(1, "one two")).is_some());
    assert!(matcher.match_entry(&entry(2, "three")).is_none());
}

// ── Parallel ───────────────────────────────────────────────────────

#[cfg(feature = "rayon")]
#[test]
fn parallel_find_matches_sequential() {
    let entries: Vec<SubtitleEntry> = (1..=500)
        .map(|index| {
            let text = if index % 7 == 0 {
                format!("line {index} has the word")
            } else {
                format!("line {index}")
            };
            entry(index, &text)
        })
        .collect();
    let matcher = Matcher::new(Pattern::new("word").unwrap());

    assert_eq!(matcher.find_parallel(&entries), matcher.find(&entries));
}
