//! Time windows around matched subtitles.
//!
//! [`WindowCalculator`] turns a matched [`SubtitleEntry`] into the
//! [`Window`] that will be cut from the media file. The window is either the
//! entry's full display interval or, with prediction enabled, the slice of
//! that interval proportional to where the first occurrence sits in the
//! text. A [`WindowAdjustment`] then slides and pads the result.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use subclip::{ClipOptions, Matcher, Pattern, SubtitleEntry, WindowAdjustment, WindowCalculator};
//!
//! let entry = SubtitleEntry::new(
//!     1,
//!     Duration::from_secs(10),
//!     Duration::from_secs(14),
//!     "abcdefghij",
//! );
//! let matched = Matcher::new(Pattern::new("cd")?).find(&[entry]);
//!
//! let options = ClipOptions::new().with_prediction(true);
//! let window = WindowCalculator::new(&options).compute(&matched[0])?;
//! assert_eq!(window.start, Duration::from_millis(10_800));
//! assert_eq!(window.end, Duration::from_millis(11_600));
//! # Ok::<(), subclip::SubclipError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::configuration::ClipOptions;
use crate::diagnostics::{DiagnosticSink, NoOpDiagnostics, SkipReason, WindowDiagnostic};
use crate::error::SubclipError;
use crate::subtitle::{SubtitleEntry, format_timestamp};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Largest slide or pad magnitude accepted, in seconds (about 31 years).
pub const MAX_ADJUSTMENT_SECONDS: f64 = 1_000_000_000.0;

/// A start/end range of the source media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// Where the clip starts.
    pub start: Duration,
    /// Where the clip ends.
    pub end: Duration,
}

impl Window {
    /// Create a window from two offsets.
    pub fn new(start: Duration, end: Duration) -> Self {
        Self { start, end }
    }

    /// The full display interval of `entry`.
    pub fn of_entry(entry: &SubtitleEntry) -> Self {
        Self::new(entry.start, entry.end)
    }

    /// Length of the window, zero if it is inverted.
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Whether the window covers no time at all.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} --> {}",
            format_timestamp(self.start),
            format_timestamp(self.end)
        )
    }
}

/// Slide and pad applied to a window after it is chosen.
///
/// Both values are signed seconds. Slide moves both ends by the same amount;
/// pad subtracts from the start and adds to the end, so a negative pad
/// shrinks the window from both sides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowAdjustment {
    /// Seconds added to both ends.
    pub slide: Option<f64>,
    /// Seconds removed from the start and added to the end.
    pub pad: Option<f64>,
}

impl WindowAdjustment {
    /// No slide, no pad.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slide in seconds.
    #[must_use]
    pub fn with_slide(mut self, seconds: f64) -> Self {
        self.slide = Some(seconds);
        self
    }

    /// Set the pad in seconds.
    #[must_use]
    pub fn with_pad(mut self, seconds: f64) -> Self {
        self.pad = Some(seconds);
        self
    }

    /// Apply slide, then pad, then clamp the start at zero.
    ///
    /// `entry_index` is only used to label the error.
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::InvalidAdjustment`] if slide or pad is not
    /// finite or exceeds [`MAX_ADJUSTMENT_SECONDS`] in magnitude, and
    /// [`SubclipError::InvalidWindow`] if the end is negative after
    /// adjustment.
    pub fn apply(&self, window: Window, entry_index: usize) -> Result<Window, SubclipError> {
        let mut start = duration_to_nanos(window.start);
        let mut end = duration_to_nanos(window.end);
        let invalid = |start: i128, end: i128| SubclipError::InvalidWindow {
            entry_index,
            start: start as f64 / NANOS_PER_SECOND,
            end: end as f64 / NANOS_PER_SECOND,
        };

        if let Some(slide) = self.slide {
            let slide = adjustment_nanos("slide", slide)?;
            start = start.checked_add(slide).ok_or_else(|| invalid(start, end))?;
            end = end.checked_add(slide).ok_or_else(|| invalid(start, end))?;
        }

        if let Some(pad) = self.pad {
            let pad = adjustment_nanos("pad", pad)?;
            start = start.checked_sub(pad).ok_or_else(|| invalid(start, end))?;
            end = end.checked_add(pad).ok_or_else(|| invalid(start, end))?;
        }

        start = start.max(0);

        if end < 0 {
            return Err(invalid(start, end));
        }

        let start_duration = nanos_to_duration(start).ok_or_else(|| invalid(start, end))?;
        let end_duration = nanos_to_duration(end).ok_or_else(|| invalid(start, end))?;
        Ok(Window::new(start_duration, end_duration))
    }
}

/// Computes the final window for matched entries.
///
/// Built from [`ClipOptions`]: whether to predict, the adjustment to apply,
/// and where diagnostics go. Each call is independent, so a calculator can
/// be shared across threads.
#[derive(Clone)]
pub struct WindowCalculator {
    predict: bool,
    adjustment: WindowAdjustment,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for WindowCalculator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("WindowCalculator")
            .field("predict", &self.predict)
            .field("adjustment", &self.adjustment)
            .finish_non_exhaustive()
    }
}

impl WindowCalculator {
    /// Create a calculator from run options.
    pub fn new(options: &ClipOptions) -> Self {
        Self {
            predict: options.predict,
            adjustment: options.adjustment,
            diagnostics: options
                .diagnostics
                .clone()
                .unwrap_or_else(|| Arc::new(NoOpDiagnostics)),
        }
    }

    /// Create a calculator without a diagnostic sink.
    pub fn with_settings(predict: bool, adjustment: WindowAdjustment) -> Self {
        Self {
            predict,
            adjustment,
            diagnostics: Arc::new(NoOpDiagnostics),
        }
    }

    /// Compute the adjusted window for one matched entry.
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::InvalidWindow`] if the adjusted window ends
    /// before zero.
    pub fn compute(&self, entry: &SubtitleEntry) -> Result<Window, SubclipError> {
        let base = if self.predict {
            self.predicted_or_default(entry)
        } else {
            Window::of_entry(entry)
        };

        let window = self.adjustment.apply(base, entry.index)?;
        log::info!("Final window for subtitle #{} is {}", entry.index, window);
        Ok(window)
    }

    /// The sink this calculator reports to.
    pub(crate) fn diagnostics(&self) -> &dyn DiagnosticSink {
        self.diagnostics.as_ref()
    }

    /// Compute windows for several entries, keeping one result per entry.
    pub fn compute_all(&self, entries: &[SubtitleEntry]) -> Vec<Result<Window, SubclipError>> {
        entries.iter().map(|entry| self.compute(entry)).collect()
    }

    /// Compute windows on the rayon thread pool, results in input order.
    #[cfg(feature = "rayon")]
    pub fn compute_all_parallel(
        &self,
        entries: &[SubtitleEntry],
    ) -> Vec<Result<Window, SubclipError>> {
        crate::rayon::parallel_compute(self, entries)
    }

    fn predicted_or_default(&self, entry: &SubtitleEntry) -> Window {
        let outcome = predict_window(entry);
        let diagnostic = match outcome {
            Prediction::Skipped(reason) => WindowDiagnostic::PredictionSkipped {
                entry_index: entry.index,
                reason,
            },
            Prediction::Predicted(window) if entry.match_spans().len() == 1 => {
                WindowDiagnostic::PredictionUsed {
                    entry_index: entry.index,
                    window,
                }
            }
            Prediction::Predicted(window) => WindowDiagnostic::AmbiguousMatch {
                entry_index: entry.index,
                occurrences: entry.match_spans().len(),
                window,
            },
        };

        match &diagnostic {
            WindowDiagnostic::PredictionUsed { .. } => log::debug!("{diagnostic}"),
            _ => log::warn!("{diagnostic}"),
        }
        self.diagnostics.report(&diagnostic);

        match outcome {
            Prediction::Predicted(window) => window,
            Prediction::Skipped(_) => Window::of_entry(entry),
        }
    }
}

/// Outcome of a prediction attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Prediction {
    Predicted(Window),
    Skipped(SkipReason),
}

/// Proportionally place the first occurrence inside the display interval.
fn predict_window(entry: &SubtitleEntry) -> Prediction {
    let Some(first) = entry.first_match() else {
        return Prediction::Skipped(SkipReason::NoMatch);
    };

    let text = entry.normalized_text();
    let text_length = text.chars().count() as u128;
    if text_length == 0 {
        return Prediction::Skipped(SkipReason::EmptyText);
    }

    let pattern_length = first.len();
    let word_characters = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .count();
    if word_characters == pattern_length {
        return Prediction::Skipped(SkipReason::SingleToken);
    }

    let display = entry.duration().as_nanos();
    let start_offset = first.start as u128 * display / text_length;
    let end_offset = (first.start + pattern_length) as u128 * display / text_length;

    let start = entry.start + offset_duration(start_offset);
    let end = start + offset_duration(end_offset - start_offset);
    Prediction::Predicted(Window::new(start, end))
}

fn duration_to_nanos(duration: Duration) -> i128 {
    duration.as_nanos() as i128
}

fn adjustment_nanos(name: &'static str, seconds: f64) -> Result<i128, SubclipError> {
    if !seconds.is_finite() || seconds.abs() > MAX_ADJUSTMENT_SECONDS {
        return Err(SubclipError::InvalidAdjustment {
            name,
            value: seconds,
            limit: MAX_ADJUSTMENT_SECONDS,
        });
    }
    Ok((seconds * NANOS_PER_SECOND).round() as i128)
}

fn nanos_to_duration(nanos: i128) -> Option<Duration> {
    let nanos = u128::try_from(nanos).ok()?;
    let seconds = u64::try_from(nanos / 1_000_000_000).ok()?;
    Some(Duration::new(seconds, (nanos % 1_000_000_000) as u32))
}

/// Offsets never exceed the entry's own duration, so they always fit.
fn offset_duration(nanos: u128) -> Duration {
    Duration::new(
        (nanos / 1_000_000_000) as u64,
        (nanos % 1_000_000_000) as u32,
    )
}
