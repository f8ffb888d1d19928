//! Run orchestration.
//!
//! A run has three steps, each exposed separately so the caller can put a
//! selection UI between them:
//!
//! 1. [`Clipper::find`] matches the pattern against the subtitle entries.
//! 2. [`Clipper::plan`] narrows the matches to a [`Selection`] and computes
//!    a window for every selected entry, applying the
//!    [`InvalidWindowPolicy`]. No media is touched here, so under
//!    [`InvalidWindowPolicy::Abort`] a bad window fails the run before the
//!    first clip is written.
//! 3. [`Clipper::run`] hands each plan to a [`ClipExtractor`].
//!
//! [`Clipper::clip`] chains all three for the non-interactive modes.
//!
//! # Example
//!
//! ```no_run
//! use subclip::{ClipOptions, Clipper, FfmpegExtractor, OutputTemplate, SelectionMode};
//!
//! let entries = subclip::load_srt("episode.srt")?;
//! let clipper = Clipper::new(ClipOptions::new().with_mode(SelectionMode::All));
//! let report = clipper.clip(
//!     &entries,
//!     "hello",
//!     "episode.mkv".as_ref(),
//!     &OutputTemplate::new("hello_*.mkv"),
//!     &mut FfmpegExtractor::new(),
//! )?;
//! println!("{} clips written", report.clips.len());
//! # Ok::<(), subclip::SubclipError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::configuration::{ClipOptions, InvalidWindowPolicy};
use crate::diagnostics::WindowDiagnostic;
use crate::error::SubclipError;
use crate::extract::{ClipExtractor, ClipRequest};
use crate::matcher::Matcher;
use crate::output::OutputTemplate;
use crate::progress::{OperationType, ProgressTracker};
use crate::selection::{Selection, SelectionMode};
use crate::subtitle::SubtitleEntry;
use crate::window::{Window, WindowCalculator};

/// A selected entry with its final window, ready to extract.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlan {
    /// 1-based position among the planned clips, used in output names.
    pub ordinal: usize,
    /// The matched entry.
    pub entry: SubtitleEntry,
    /// The adjusted window to cut.
    pub window: Window,
}

/// One written clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipOutput {
    /// Ordinal of the plan that produced it.
    pub ordinal: usize,
    /// Index of the subtitle entry it was cut for.
    pub entry_index: usize,
    /// The window that was cut.
    pub window: Window,
    /// Where the clip was written.
    pub path: PathBuf,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipReport {
    /// Clips in the order they were written.
    pub clips: Vec<ClipOutput>,
}

/// Drives matching, planning, and extraction for one run.
#[derive(Debug, Clone)]
pub struct Clipper {
    options: ClipOptions,
    calculator: WindowCalculator,
}

impl Clipper {
    /// Create a clipper for `options`.
    pub fn new(options: ClipOptions) -> Self {
        let calculator = WindowCalculator::new(&options);
        Self {
            options,
            calculator,
        }
    }

    /// The options this clipper runs with.
    pub fn options(&self) -> &ClipOptions {
        &self.options
    }

    /// Find the entries matching `pattern`.
    ///
    /// # Errors
    ///
    /// - [`SubclipError::InvalidPattern`] if `pattern` does not compile.
    /// - [`SubclipError::NoMatch`] if no entry matches.
    pub fn find(
        &self,
        entries: &[SubtitleEntry],
        pattern: &str,
    ) -> Result<Vec<SubtitleEntry>, SubclipError> {
        let matcher = Matcher::new(self.options.pattern(pattern)?);
        let matches = matcher.find(entries);
        if matches.is_empty() {
            return Err(SubclipError::NoMatch {
                pattern: pattern.to_string(),
            });
        }
        Ok(matches)
    }

    /// Select from `matches` and compute a window for each selected entry.
    ///
    /// Under [`InvalidWindowPolicy::Abort`] the first invalid window is
    /// returned as an error. Under [`InvalidWindowPolicy::Skip`] the entry is
    /// left out with a warning and a [`WindowDiagnostic::EntrySkipped`]
    /// event, and ordinals stay contiguous.
    ///
    /// # Errors
    ///
    /// - [`SubclipError::InvalidSelection`] if the selection does not fit
    ///   `matches`.
    /// - [`SubclipError::InvalidWindow`] under the abort policy.
    /// - [`SubclipError::InvalidAdjustment`] if slide or pad is unusable,
    ///   whatever the policy.
    pub fn plan(
        &self,
        matches: &[SubtitleEntry],
        selection: &Selection,
    ) -> Result<Vec<ClipPlan>, SubclipError> {
        let selected = selection.apply(matches)?;
        let mut plans = Vec::with_capacity(selected.len());

        for entry in selected {
            let window = match self.calculator.compute(&entry) {
                Ok(window) => window,
                Err(SubclipError::InvalidWindow {
                    entry_index,
                    start,
                    end,
                }) if self.options.invalid_window_policy == InvalidWindowPolicy::Skip => {
                    let diagnostic = WindowDiagnostic::EntrySkipped {
                        entry_index,
                        start,
                        end,
                    };
                    log::warn!("{diagnostic}");
                    self.calculator.diagnostics().report(&diagnostic);
                    continue;
                }
                Err(error) => return Err(error),
            };

            plans.push(ClipPlan {
                ordinal: plans.len() + 1,
                entry,
                window,
            });
        }

        log::debug!("Planned {} clips", plans.len());
        Ok(plans)
    }

    /// Extract every plan from `source`.
    ///
    /// Output paths come from `template`, numbered when the selection mode
    /// can produce several clips. Progress is reported after each clip.
    ///
    /// # Errors
    ///
    /// - [`SubclipError::Cancelled`] if the token is cancelled between clips.
    /// - Any error from `extractor`; clips already written are kept.
    pub fn run(
        &self,
        plans: &[ClipPlan],
        source: &Path,
        template: &OutputTemplate,
        extractor: &mut dyn ClipExtractor,
    ) -> Result<ClipReport, SubclipError> {
        let multi = self.options.mode.is_multi();
        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::ClipExtraction,
            Some(plans.len() as u64),
        );
        let mut report = ClipReport::default();

        for plan in plans {
            if self.options.is_cancelled() {
                return Err(SubclipError::Cancelled);
            }

            let request = ClipRequest {
                source: source.to_path_buf(),
                output: template.resolve(plan.ordinal, multi),
                window: plan.window,
                kind: self.options.kind,
            };
            let path = extractor.extract(&request)?;
            log::info!(
                "Wrote clip {} for subtitle #{} to {}",
                plan.ordinal,
                plan.entry.index,
                path.display()
            );

            tracker.advance(Some(path.clone()));
            report.clips.push(ClipOutput {
                ordinal: plan.ordinal,
                entry_index: plan.entry.index,
                window: plan.window,
                path,
            });
        }

        Ok(report)
    }

    /// Find, plan, and run in one call using the configured mode.
    ///
    /// # Errors
    ///
    /// Everything [`find`](Self::find), [`plan`](Self::plan), and
    /// [`run`](Self::run) return, plus [`SubclipError::InvalidSelection`]
    /// for [`SelectionMode::Interactive`], which needs indices from the
    /// caller.
    pub fn clip(
        &self,
        entries: &[SubtitleEntry],
        pattern: &str,
        source: &Path,
        template: &OutputTemplate,
        extractor: &mut dyn ClipExtractor,
    ) -> Result<ClipReport, SubclipError> {
        let matches = self.find(entries, pattern)?;
        let selection = self
            .options
            .mode
            .selection()
            .ok_or_else(|| SubclipError::InvalidSelection {
                input: SelectionMode::Interactive.to_string(),
                reason: "interactive mode needs indices chosen by the caller".to_string(),
            })?;
        let plans = self.plan(&matches, &selection)?;
        self.run(&plans, source, template, extractor)
    }
}
