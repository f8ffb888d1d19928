//! Clip extraction integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and are skipped when they are absent.

use std::path::Path;
use std::time::Duration;

use subclip::{
    CancellationToken, ClipExtractor, ClipKind, ClipOptions, ClipRequest, Clipper,
    FfmpegExtractor, MediaFile, OutputTemplate, SelectionMode, SubclipError, Window,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_video_only_path() -> &'static str {
    "tests/fixtures/sample_video_only.mp4"
}

fn sample_sparse_keyframes_path() -> &'static str {
    "tests/fixtures/sample_sparse_keyframes.mp4"
}

fn sample_subtitled_path() -> &'static str {
    "tests/fixtures/sample_with_subtitles.mkv"
}

fn sample_srt_path() -> &'static str {
    "tests/fixtures/sample.srt"
}

fn request(source: &str, output: &Path, start_ms: u64, end_ms: u64, kind: ClipKind) -> ClipRequest {
    ClipRequest {
        source: source.into(),
        output: output.to_path_buf(),
        window: Window::new(
            Duration::from_millis(start_ms),
            Duration::from_millis(end_ms),
        ),
        kind,
    }
}

// ── Video clips ────────────────────────────────────────────────────

#[test]
fn video_clip_is_written() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("clip.mp4");

    let written = FfmpegExtractor::new()
        .extract(&request(path, &output, 1_000, 2_500, ClipKind::Video))
        .expect("Failed to extract clip");
    assert_eq!(written, output);

    let clip = MediaFile::open(&output).expect("Failed to open clip");
    assert!(clip.has_video());
    assert!(clip.has_audio());
    let duration = clip.duration().as_secs_f64();
    assert!(duration > 1.3 && duration < 1.7, "clip lasted {duration}s");
}

#[test]
fn video_clip_starts_between_keyframes() {
    let path = sample_sparse_keyframes_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("short.mp4");

    // The only keyframe is at 0s; the clip must still last 0.8s, not 2.8s.
    FfmpegExtractor::new()
        .extract(&request(path, &output, 2_000, 2_800, ClipKind::Video))
        .expect("Failed to extract clip");

    let clip = MediaFile::open(&output).expect("Failed to open clip");
    assert!(clip.has_video());
    assert!(clip.has_audio());
    let duration = clip.duration().as_secs_f64();
    assert!(duration > 0.6 && duration < 1.0, "clip lasted {duration}s");
}

#[test]
fn predicted_window_length_is_kept() {
    let path = sample_sparse_keyframes_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("predicted.mkv");

    FfmpegExtractor::new()
        .extract(&request(path, &output, 3_300, 3_700, ClipKind::Video))
        .expect("Failed to extract clip");

    let duration = MediaFile::open(&output)
        .expect("Failed to open clip")
        .duration()
        .as_secs_f64();
    assert!(duration > 0.25 && duration < 0.6, "clip lasted {duration}s");
}

#[test]
fn video_clip_without_audio() {
    let path = sample_video_only_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("silent.mp4");

    FfmpegExtractor::new()
        .extract(&request(path, &output, 0, 1_000, ClipKind::Video))
        .expect("Failed to extract clip");

    let clip = MediaFile::open(&output).expect("Failed to open clip");
    assert!(clip.has_video());
    assert!(!clip.has_audio());
}

#[test]
fn audio_from_video_only_file_fails() {
    let path = sample_video_only_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("none.wav");

    let result = FfmpegExtractor::new().extract(&request(path, &output, 0, 1_000, ClipKind::AudioOnly));
    assert!(matches!(result, Err(SubclipError::NoAudioStream)));
}

// ── Audio clips ────────────────────────────────────────────────────

#[test]
fn audio_clip_is_wav() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("clip.wav");

    FfmpegExtractor::new()
        .extract(&request(path, &output, 500, 1_500, ClipKind::AudioOnly))
        .expect("Failed to extract audio");

    let bytes = std::fs::read(&output).expect("Failed to read clip");
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");

    let clip = MediaFile::open(&output).expect("Failed to open clip");
    assert!(clip.has_audio());
    assert!(!clip.has_video());
    let duration = clip.duration().as_secs_f64();
    assert!(duration > 0.8 && duration < 1.3, "clip lasted {duration}s");
}

// ── Window validation ──────────────────────────────────────────────

#[test]
fn window_past_the_end_is_rejected() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("late.mp4");

    let result = FfmpegExtractor::new().extract(&request(
        path,
        &output,
        3_600_000,
        3_601_000,
        ClipKind::Video,
    ));
    assert!(matches!(result, Err(SubclipError::InvalidTimestamp(_))));
}

#[test]
fn empty_window_is_rejected() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("empty.mp4");

    let result = FfmpegExtractor::new().extract(&request(path, &output, 1_000, 1_000, ClipKind::Video));
    assert!(matches!(result, Err(SubclipError::ClipEncodeError(_))));
}

#[test]
fn cancelled_extraction() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let token = CancellationToken::new();
    token.cancel();
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = temporary_directory.path().join("cancelled.mp4");

    let result = FfmpegExtractor::new()
        .with_cancellation(token)
        .extract(&request(path, &output, 0, 1_000, ClipKind::Video));
    assert!(matches!(result, Err(SubclipError::Cancelled)));
}

// ── Subtitle sources ───────────────────────────────────────────────

#[test]
fn embedded_subtitles_are_read() {
    let path = sample_subtitled_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open test video");
    assert!(media.subtitle_track_count() >= 1);

    let entries = media.subtitle_entries().expect("Failed to read subtitles");
    assert!(!entries.is_empty());
    assert_eq!(entries[0].index, 1);
    for pair in entries.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
    assert!(entries.iter().all(|entry| entry.start <= entry.end));
}

#[test]
fn missing_subtitle_track() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open test video");
    assert_eq!(media.subtitle_track_count(), 0);
    assert!(matches!(
        media.subtitle_entries(),
        Err(SubclipError::NoSubtitleStream)
    ));
    assert!(matches!(
        media.subtitle_track_entries(3),
        Err(SubclipError::NoSubtitleStream)
    ));
}

// ── End to end ─────────────────────────────────────────────────────

#[test]
fn clip_every_match_from_srt() {
    let video = sample_video_path();
    let subtitles = sample_srt_path();
    if !Path::new(video).exists() || !Path::new(subtitles).exists() {
        return;
    }

    let entries = subclip::load_srt(subtitles).expect("Failed to load subtitles");
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let template = OutputTemplate::new(temporary_directory.path().join("line_*.mp4"));

    let clipper = Clipper::new(ClipOptions::new().with_mode(SelectionMode::All));
    let report = clipper
        .clip(
            &entries,
            "line",
            Path::new(video),
            &template,
            &mut FfmpegExtractor::new(),
        )
        .expect("Failed to clip");

    assert!(!report.clips.is_empty());
    for (position, clip) in report.clips.iter().enumerate() {
        assert_eq!(clip.ordinal, position + 1);
        assert!(clip.path.exists(), "{} was not written", clip.path.display());
    }
}
