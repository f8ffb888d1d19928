//! Progress and cancellation integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use subclip::{
    CancellationToken, ClipExtractor, ClipOptions, ClipRequest, Clipper, OperationType,
    OutputTemplate, ProgressCallback, ProgressInfo, SelectionMode, SubclipError, SubtitleEntry,
};

/// Accepts every request without writing anything.
struct NullExtractor;

impl ClipExtractor for NullExtractor {
    fn extract(&mut self, request: &ClipRequest) -> Result<PathBuf, SubclipError> {
        Ok(request.output.clone())
    }
}

/// Cancels `token` after the first clip.
struct CancellingExtractor {
    token: CancellationToken,
    calls: usize,
}

impl ClipExtractor for CancellingExtractor {
    fn extract(&mut self, request: &ClipRequest) -> Result<PathBuf, SubclipError> {
        self.calls += 1;
        self.token.cancel();
        Ok(request.output.clone())
    }
}

#[derive(Default)]
struct RecordingProgress {
    updates: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.updates.lock().unwrap().push(info.clone());
    }
}

fn entries() -> Vec<SubtitleEntry> {
    (1..=4)
        .map(|index| {
            let start = Duration::from_secs(index as u64 * 5);
            SubtitleEntry::new(index, start, start + Duration::from_secs(2), "say cheese")
        })
        .collect()
}

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    assert!(!CancellationToken::new().is_cancelled());
    assert!(!CancellationToken::default().is_cancelled());
}

#[test]
fn cancellation_token_cancel() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_token_across_threads() {
    let token = CancellationToken::new();
    let worker = token.clone();
    std::thread::spawn(move || worker.cancel())
        .join()
        .expect("thread panicked");
    assert!(token.is_cancelled());
}

// ── Progress callbacks ─────────────────────────────────────────────

#[test]
fn progress_reported_once_per_clip() {
    let progress = Arc::new(RecordingProgress::default());
    let clipper = Clipper::new(
        ClipOptions::new()
            .with_mode(SelectionMode::All)
            .with_progress(progress.clone()),
    );

    clipper
        .clip(
            &entries(),
            "cheese",
            Path::new("movie.mkv"),
            &OutputTemplate::new("cheese_*.mkv"),
            &mut NullExtractor,
        )
        .unwrap();

    let updates = progress.updates.lock().unwrap();
    assert_eq!(updates.len(), 4);
    for (position, info) in updates.iter().enumerate() {
        assert_eq!(info.operation, OperationType::ClipExtraction);
        assert_eq!(info.current, position as u64 + 1);
        assert_eq!(info.total, Some(4));
        assert_eq!(
            info.current_output,
            Some(PathBuf::from(format!("cheese_{}.mkv", position + 1)))
        );
    }

    let last = updates.last().unwrap();
    assert_eq!(last.percentage, Some(100.0));
    assert_eq!(last.estimated_remaining, Some(Duration::ZERO));
}

#[test]
fn cancelling_mid_run_stops_before_next_clip() {
    let token = CancellationToken::new();
    let clipper = Clipper::new(
        ClipOptions::new()
            .with_mode(SelectionMode::All)
            .with_cancellation(token.clone()),
    );
    let mut extractor = CancellingExtractor { token, calls: 0 };

    let result = clipper.clip(
        &entries(),
        "cheese",
        Path::new("movie.mkv"),
        &OutputTemplate::new("cheese_*.mkv"),
        &mut extractor,
    );
    assert!(matches!(result, Err(SubclipError::Cancelled)));
    assert_eq!(extractor.calls, 1);
}
