//! Run configuration.
//!
//! [`ClipOptions`] is a builder that carries every setting of a clipping
//! run (matching flags, prediction, slide and pad, selection mode, output
//! kind, failure policy) plus the progress, diagnostic, and cancellation
//! hooks. It is passed explicitly to the [`Clipper`](crate::Clipper) and the
//! components it drives.
//!
//! # Example
//!
//! ```
//! use subclip::{ClipKind, ClipOptions, InvalidWindowPolicy, SelectionMode};
//!
//! let options = ClipOptions::new()
//!     .with_prediction(true)
//!     .with_slide(-0.25)
//!     .with_pad(0.5)
//!     .with_mode(SelectionMode::All)
//!     .with_kind(ClipKind::AudioOnly)
//!     .with_invalid_window_policy(InvalidWindowPolicy::Skip);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::diagnostics::DiagnosticSink;
use crate::error::SubclipError;
use crate::extract::ClipKind;
use crate::pattern::Pattern;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::selection::SelectionMode;
use crate::window::WindowAdjustment;

/// What to do when a selected entry yields an invalid window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidWindowPolicy {
    /// Fail the whole run before any clip is written. This is the default.
    #[default]
    Abort,
    /// Leave the entry out, log a warning, and clip the rest.
    Skip,
}

/// Configuration for a clipping run.
///
/// All fields have defaults: case-insensitive regex matching, no
/// prediction, no slide or pad, [`SelectionMode::First`], video clips, and
/// [`InvalidWindowPolicy::Abort`].
#[derive(Clone)]
pub struct ClipOptions {
    pub(crate) case_sensitive: bool,
    pub(crate) literal: bool,
    pub(crate) predict: bool,
    pub(crate) adjustment: WindowAdjustment,
    pub(crate) mode: SelectionMode,
    pub(crate) kind: ClipKind,
    pub(crate) invalid_window_policy: InvalidWindowPolicy,
    /// Diagnostic sink. `None` means events only go to the `log` facade.
    pub(crate) diagnostics: Option<Arc<dyn DiagnosticSink>>,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for ClipOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClipOptions")
            .field("case_sensitive", &self.case_sensitive)
            .field("literal", &self.literal)
            .field("predict", &self.predict)
            .field("adjustment", &self.adjustment)
            .field("mode", &self.mode)
            .field("kind", &self.kind)
            .field("invalid_window_policy", &self.invalid_window_policy)
            .field("has_diagnostics", &self.diagnostics.is_some())
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            case_sensitive: false,
            literal: false,
            predict: false,
            adjustment: WindowAdjustment::new(),
            mode: SelectionMode::First,
            kind: ClipKind::Video,
            invalid_window_policy: InvalidWindowPolicy::Abort,
            diagnostics: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Compare text case-sensitively.
    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Treat the pattern as plain text instead of a regular expression.
    #[must_use]
    pub fn with_literal(mut self, literal: bool) -> Self {
        self.literal = literal;
        self
    }

    /// Predict a sub-interval from the position of the match.
    #[must_use]
    pub fn with_prediction(mut self, predict: bool) -> Self {
        self.predict = predict;
        self
    }

    /// Move both window ends by `seconds` (negative slides backwards).
    #[must_use]
    pub fn with_slide(mut self, seconds: f64) -> Self {
        self.adjustment.slide = Some(seconds);
        self
    }

    /// Widen the window by `seconds` on each side (negative shrinks).
    #[must_use]
    pub fn with_pad(mut self, seconds: f64) -> Self {
        self.adjustment.pad = Some(seconds);
        self
    }

    /// Set slide and pad together.
    #[must_use]
    pub fn with_adjustment(mut self, adjustment: WindowAdjustment) -> Self {
        self.adjustment = adjustment;
        self
    }

    /// Choose how several matches are handled.
    #[must_use]
    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Choose between video clips and audio-only clips.
    #[must_use]
    pub fn with_kind(mut self, kind: ClipKind) -> Self {
        self.kind = kind;
        self
    }

    /// Choose what happens when an entry's window is invalid.
    #[must_use]
    pub fn with_invalid_window_policy(mut self, policy: InvalidWindowPolicy) -> Self {
        self.invalid_window_policy = policy;
        self
    }

    /// Attach a sink for window diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Attach a progress callback, invoked once per written clip.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the run stops before the next clip (or
    /// packet) and returns [`SubclipError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The configured selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// The configured clip kind.
    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    /// The configured slide and pad.
    pub fn adjustment(&self) -> WindowAdjustment {
        self.adjustment
    }

    /// Compile `source` with this run's case and literal flags.
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::InvalidPattern`] if the expression does not
    /// compile.
    pub fn pattern(&self, source: &str) -> Result<Pattern, SubclipError> {
        Pattern::with_flags(source, self.case_sensitive, self.literal)
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
