//! Selection mode and index list integration tests.

use subclip::{Selection, SelectionMode, SubclipError};

// ── SelectionMode ──────────────────────────────────────────────────

#[test]
fn mode_defaults_to_first() {
    assert_eq!(SelectionMode::default(), SelectionMode::First);
}

#[test]
fn mode_parses_case_insensitively() {
    assert_eq!("first".parse::<SelectionMode>().unwrap(), SelectionMode::First);
    assert_eq!("ALL".parse::<SelectionMode>().unwrap(), SelectionMode::All);
    assert_eq!(
        " Interactive ".parse::<SelectionMode>().unwrap(),
        SelectionMode::Interactive
    );
    assert!("some".parse::<SelectionMode>().is_err());
}

#[test]
fn mode_display_round_trips_through_parse() {
    for mode in [SelectionMode::First, SelectionMode::All, SelectionMode::Interactive] {
        assert_eq!(mode.to_string().parse::<SelectionMode>().unwrap(), mode);
    }
}

#[test]
fn only_first_is_single_clip() {
    assert!(!SelectionMode::First.is_multi());
    assert!(SelectionMode::All.is_multi());
    assert!(SelectionMode::Interactive.is_multi());
}

#[test]
fn interactive_needs_indices() {
    assert_eq!(SelectionMode::First.selection(), Some(Selection::First));
    assert_eq!(SelectionMode::All.selection(), Some(Selection::All));
    assert_eq!(SelectionMode::Interactive.selection(), None);
}

// ── Parsing index lists ────────────────────────────────────────────

#[test]
fn parses_comma_separated_indices() {
    let selection = Selection::parse("0, 2,3", 4).unwrap();
    assert_eq!(selection, Selection::Indices(vec![0, 2, 3]));
}

#[test]
fn keeps_order_and_duplicates() {
    let selection = Selection::parse("2,0,2", 3).unwrap();
    assert_eq!(selection, Selection::Indices(vec![2, 0, 2]));
}

#[test]
fn tolerates_trailing_newline() {
    let selection = Selection::parse("1\n", 2).unwrap();
    assert_eq!(selection, Selection::Indices(vec![1]));
}

#[test]
fn rejects_out_of_range_index() {
    let error = Selection::parse("0,3", 3).unwrap_err();
    match error {
        SubclipError::InvalidSelection { input, reason } => {
            assert_eq!(input, "0,3");
            assert!(reason.contains("out of range"), "{reason}");
        }
        other => panic!("expected InvalidSelection, got {other:?}"),
    }
}

#[test]
fn rejects_non_numeric_tokens() {
    for input in ["a", "1,b", "-1", "1.5", "1,,2", "1 2"] {
        assert!(
            matches!(
                Selection::parse(input, 10),
                Err(SubclipError::InvalidSelection { .. })
            ),
            "{input:?} should be rejected"
        );
    }
}

#[test]
fn rejects_empty_selection() {
    for input in ["", "   ", "\n"] {
        assert!(matches!(
            Selection::parse(input, 3),
            Err(SubclipError::InvalidSelection { .. })
        ));
    }
}

#[test]
fn any_index_is_out_of_range_without_matches() {
    assert!(Selection::parse("0", 0).is_err());
}

// ── Applying selections ────────────────────────────────────────────

#[test]
fn first_keeps_one_element() {
    let matches = vec!["a", "b", "c"];
    assert_eq!(Selection::First.apply(&matches).unwrap(), vec!["a"]);
}

#[test]
fn first_of_nothing_is_nothing() {
    let matches: Vec<&str> = Vec::new();
    assert!(Selection::First.apply(&matches).unwrap().is_empty());
}

#[test]
fn all_keeps_everything() {
    let matches = vec!["a", "b", "c"];
    assert_eq!(Selection::All.apply(&matches).unwrap(), matches);
}

#[test]
fn indices_pick_in_given_order() {
    let matches = vec!["a", "b", "c"];
    let selection = Selection::parse("2,0,2", matches.len()).unwrap();
    assert_eq!(selection.apply(&matches).unwrap(), vec!["c", "a", "c"]);
}

#[test]
fn indices_are_checked_when_applied() {
    let matches = vec!["a"];
    let selection = Selection::Indices(vec![0, 1]);
    assert!(matches!(
        selection.apply(&matches),
        Err(SubclipError::InvalidSelection { .. })
    ));
}
