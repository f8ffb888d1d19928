//! Output templating integration tests.

use std::path::PathBuf;

use subclip::OutputTemplate;

#[test]
fn single_clip_keeps_path_verbatim() {
    let template = OutputTemplate::new("clips/take_*.mp4");
    assert!(template.has_placeholder());
    assert_eq!(template.resolve(1, false), PathBuf::from("clips/take_*.mp4"));
}

#[test]
fn placeholder_is_replaced_with_ordinal() {
    let template = OutputTemplate::new("clips/take_*.mp4");
    assert_eq!(template.resolve(1, true), PathBuf::from("clips/take_1.mp4"));
    assert_eq!(template.resolve(12, true), PathBuf::from("clips/take_12.mp4"));
}

#[test]
fn every_placeholder_is_replaced() {
    let template = OutputTemplate::new("*/clip_*.wav");
    assert_eq!(template.resolve(3, true), PathBuf::from("3/clip_3.wav"));
}

#[test]
fn missing_placeholder_gets_suffix() {
    let template = OutputTemplate::new("clips/take.mp4");
    assert!(!template.has_placeholder());
    assert_eq!(template.resolve(2, true), PathBuf::from("clips/take_2.mp4"));
}

#[test]
fn missing_placeholder_without_extension() {
    let template = OutputTemplate::new("take");
    assert_eq!(template.resolve(4, true), PathBuf::from("take_4"));
}

#[test]
fn outputs_are_distinct_across_ordinals() {
    let template = OutputTemplate::new("take.mkv");
    let paths: Vec<PathBuf> = (1..=5).map(|ordinal| template.resolve(ordinal, true)).collect();
    for (position, path) in paths.iter().enumerate() {
        assert!(!paths[position + 1..].contains(path));
    }
}
