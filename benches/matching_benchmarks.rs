//! Benchmarks for matching, window computation, and clip extraction.
//!
//! Run with: cargo bench
//! Run with parallel variants: cargo bench --features rayon
//!
//! The extraction benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{path::Path, time::Duration};

use criterion::Criterion;
use subclip::{
    ClipExtractor, ClipKind, ClipRequest, FfmpegExtractor, FfmpegLogLevel, Matcher, Pattern,
    SubtitleEntry, Window, WindowAdjustment, WindowCalculator,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

const LINES: [&str; 6] = [
    "I'll be back.",
    "Hasta la vista, baby.",
    "Come with me if you want to live.",
    "Are you Sarah Connor?",
    "The future is not set. There is no fate but what we make for ourselves.",
    "Il n'y a pas de destin, sauf celui que nous forgeons.",
];

/// About two hours of subtitles, one every three seconds.
fn feature_length_track() -> Vec<SubtitleEntry> {
    (0..2_400)
        .map(|position| {
            let start = Duration::from_secs(position as u64 * 3);
            SubtitleEntry::new(
                position + 1,
                start,
                start + Duration::from_millis(2_500),
                LINES[position % LINES.len()],
            )
        })
        .collect()
}

fn benchmark_matching(criterion: &mut Criterion) {
    let entries = feature_length_track();

    let mut group = criterion.benchmark_group("matching");

    let literal = Matcher::new(Pattern::new("connor").unwrap());
    group.bench_function("literal word", |bencher| {
        bencher.iter(|| literal.find(&entries));
    });

    let expression = Matcher::new(Pattern::new(r"\b(back|live|fate)\b").unwrap());
    group.bench_function("alternation", |bencher| {
        bencher.iter(|| expression.find(&entries));
    });

    let frequent = Matcher::new(Pattern::new("e").unwrap());
    group.bench_function("many spans per entry", |bencher| {
        bencher.iter(|| frequent.find(&entries));
    });

    #[cfg(feature = "rayon")]
    group.bench_function("alternation (parallel)", |bencher| {
        bencher.iter(|| expression.find_parallel(&entries));
    });

    group.finish();
}

fn benchmark_windows(criterion: &mut Criterion) {
    let entries = feature_length_track();
    let matches = Matcher::new(Pattern::new("you").unwrap()).find(&entries);

    let mut group = criterion.benchmark_group("windows");

    let default_windows = WindowCalculator::with_settings(false, WindowAdjustment::new());
    group.bench_function("default", |bencher| {
        bencher.iter(|| default_windows.compute_all(&matches));
    });

    let predicted = WindowCalculator::with_settings(
        true,
        WindowAdjustment::new().with_slide(-0.25).with_pad(0.5),
    );
    group.bench_function("predicted with adjustment", |bencher| {
        bencher.iter(|| predicted.compute_all(&matches));
    });

    #[cfg(feature = "rayon")]
    group.bench_function("predicted (parallel)", |bencher| {
        bencher.iter(|| predicted.compute_all_parallel(&matches));
    });

    group.finish();
}

fn benchmark_extraction(criterion: &mut Criterion) {
    subclip::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let temporary_directory = tempfile::tempdir().unwrap();
    let window = Window::new(Duration::from_secs(1), Duration::from_secs(3));

    let mut group = criterion.benchmark_group("extraction");
    group.sample_size(20);

    for (name, kind, file_name) in [
        ("video re-encode", ClipKind::Video, "clip.mp4"),
        ("audio to wav", ClipKind::AudioOnly, "clip.wav"),
    ] {
        let request = ClipRequest {
            source: SAMPLE_VIDEO.into(),
            output: temporary_directory.path().join(file_name),
            window,
            kind,
        };
        group.bench_function(name, |bencher| {
            bencher.iter(|| FfmpegExtractor::new().extract(&request).unwrap());
        });
    }

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_matching,
    benchmark_windows,
    benchmark_extraction,
);
criterion::criterion_main!(benches);
