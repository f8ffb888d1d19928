//! Non-fatal window diagnostics.
//!
//! Predicting a window can fall back to the full subtitle interval or rely
//! on an ambiguous occurrence. Neither is an error, but both change the
//! result, so the [`WindowCalculator`](crate::WindowCalculator) reports them
//! as [`WindowDiagnostic`] events to a [`DiagnosticSink`] in addition to the
//! `log` facade. [`Clipper::plan`](crate::Clipper::plan) reports entries it
//! leaves out under [`InvalidWindowPolicy::Skip`](crate::InvalidWindowPolicy::Skip)
//! the same way.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use subclip::{
//!     ClipOptions, CollectingDiagnostics, Matcher, Pattern, SubtitleEntry, WindowCalculator,
//! };
//!
//! let sink = Arc::new(CollectingDiagnostics::new());
//! let options = ClipOptions::new()
//!     .with_prediction(true)
//!     .with_diagnostics(sink.clone());
//!
//! let entry = SubtitleEntry::new(1, Duration::ZERO, Duration::from_secs(1), "Yes!");
//! let matched = Matcher::new(Pattern::new("yes")?).find(&[entry]);
//! WindowCalculator::new(&options).compute(&matched[0])?;
//!
//! assert_eq!(sink.events().len(), 1);
//! # Ok::<(), subclip::SubclipError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Mutex, PoisonError};

use crate::window::Window;

/// Why a prediction was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SkipReason {
    /// The text's word characters are exactly the match, so there is no
    /// sub-interval to predict.
    SingleToken,
    /// The entry carries no match span.
    NoMatch,
    /// The entry's normalized text is empty.
    EmptyText,
}

/// A non-fatal event raised while computing a window.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum WindowDiagnostic {
    /// A prediction was made from the entry's only occurrence.
    PredictionUsed {
        /// Cue number of the entry.
        entry_index: usize,
        /// The predicted window, before slide and pad.
        window: Window,
    },
    /// A prediction was made from the first of several occurrences.
    AmbiguousMatch {
        /// Cue number of the entry.
        entry_index: usize,
        /// How many occurrences the entry holds.
        occurrences: usize,
        /// The predicted window, before slide and pad.
        window: Window,
    },
    /// Prediction was requested but the default window was used.
    PredictionSkipped {
        /// Cue number of the entry.
        entry_index: usize,
        /// Why prediction was not possible.
        reason: SkipReason,
    },
    /// The entry's adjusted window was invalid and the entry was left out.
    EntrySkipped {
        /// Cue number of the entry.
        entry_index: usize,
        /// Start of the rejected window in seconds.
        start: f64,
        /// End of the rejected window in seconds.
        end: f64,
    },
}

impl WindowDiagnostic {
    /// Cue number of the entry the event belongs to.
    pub fn entry_index(&self) -> usize {
        match self {
            WindowDiagnostic::PredictionUsed { entry_index, .. }
            | WindowDiagnostic::AmbiguousMatch { entry_index, .. }
            | WindowDiagnostic::PredictionSkipped { entry_index, .. }
            | WindowDiagnostic::EntrySkipped { entry_index, .. } => *entry_index,
        }
    }
}

impl Display for WindowDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WindowDiagnostic::PredictionUsed {
                entry_index,
                window,
            } => write!(f, "subtitle #{entry_index}: predicted window is {window}"),
            WindowDiagnostic::AmbiguousMatch {
                entry_index,
                occurrences,
                window,
            } => write!(
                f,
                "subtitle #{entry_index}: {occurrences} occurrences found, \
                 predicted window {window} uses the first one"
            ),
            WindowDiagnostic::PredictionSkipped {
                entry_index,
                reason,
            } => {
                let why = match reason {
                    SkipReason::SingleToken => "the match is the whole subtitle",
                    SkipReason::NoMatch => "no occurrence recorded",
                    SkipReason::EmptyText => "the subtitle text is empty",
                };
                write!(
                    f,
                    "subtitle #{entry_index}: using default window ({why})"
                )
            }
            WindowDiagnostic::EntrySkipped {
                entry_index,
                start,
                end,
            } => write!(
                f,
                "subtitle #{entry_index}: skipped, window {start:.3}s --> {end:.3}s is invalid"
            ),
        }
    }
}

/// Receiver for [`WindowDiagnostic`] events.
///
/// Implementations must be [`Send`] and [`Sync`] because windows may be
/// computed on worker threads when the `rayon` feature is enabled.
pub trait DiagnosticSink: Send + Sync {
    /// Called once per event, in the order the calculator raised them on
    /// the calling thread.
    fn report(&self, diagnostic: &WindowDiagnostic);
}

/// A sink that discards all events.
///
/// This is the default when no sink is configured.
pub(crate) struct NoOpDiagnostics;

impl DiagnosticSink for NoOpDiagnostics {
    fn report(&self, _diagnostic: &WindowDiagnostic) {}
}

/// A sink that stores every event behind a mutex.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<WindowDiagnostic>>,
}

impl CollectingDiagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events collected so far.
    pub fn events(&self) -> Vec<WindowDiagnostic> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return the events collected so far.
    pub fn take(&self) -> Vec<WindowDiagnostic> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn report(&self, diagnostic: &WindowDiagnostic) {
        // A panicking reporter on another thread must not cost later events.
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.clone());
    }
}
