//! # subclip
//!
//! Cut clips out of a video wherever its subtitles say something.
//!
//! `subclip` matches a text pattern against the entries of a subtitle track,
//! derives a time window for each match, and extracts that slice of the
//! media file as a new clip, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Clip the first match
//!
//! ```no_run
//! use subclip::{ClipOptions, Clipper, FfmpegExtractor, OutputTemplate};
//!
//! let entries = subclip::load_srt("episode.srt")?;
//! let clipper = Clipper::new(ClipOptions::new());
//! clipper.clip(
//!     &entries,
//!     "i'll be back",
//!     "episode.mkv".as_ref(),
//!     &OutputTemplate::new("back.mkv"),
//!     &mut FfmpegExtractor::new(),
//! )?;
//! # Ok::<(), subclip::SubclipError>(())
//! ```
//!
//! ### Predict where the words are spoken
//!
//! Long captions cover several seconds. With prediction the window is
//! narrowed to the share of the display interval that matches the position
//! of the words in the caption, and slide and pad give some slack:
//!
//! ```
//! use std::time::Duration;
//!
//! use subclip::{ClipOptions, Clipper, Selection, SubtitleEntry};
//!
//! let entries = vec![SubtitleEntry::new(
//!     1,
//!     Duration::from_secs(10),
//!     Duration::from_secs(14),
//!     "abcdefghij",
//! )];
//! let clipper = Clipper::new(
//!     ClipOptions::new()
//!         .with_prediction(true)
//!         .with_slide(-1.0)
//!         .with_pad(0.5),
//! );
//! let matches = clipper.find(&entries, "cd")?;
//! let plans = clipper.plan(&matches, &Selection::First)?;
//! assert_eq!(plans[0].window.start, Duration::from_millis(9_300));
//! assert_eq!(plans[0].window.end, Duration::from_millis(11_100));
//! # Ok::<(), subclip::SubclipError>(())
//! ```
//!
//! ## Features
//!
//! - **Pattern matching**: case-insensitive regular expressions by default,
//!   with case-sensitive and literal modes
//! - **Window prediction**: proportional sub-interval from the match
//!   position, with diagnostics when the guess is unreliable
//! - **Slide and pad**: shift or widen every window, clamped at zero
//! - **Selection**: first match, all matches, or chosen indices
//! - **Subtitle sources**: `.srt` files or text tracks embedded in the media
//! - **Extraction**: frame-accurate re-encoded video clips or 32-bit PCM
//!   WAV audio
//! - **Progress & cancellation**: per-clip callbacks and
//!   `CancellationToken`
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | `find_parallel()` and `compute_all_parallel()` on rayon threads |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod clipper;
pub mod configuration;
mod conversion;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod matcher;
pub mod media;
pub mod output;
pub mod pattern;
pub mod progress;
#[cfg(feature = "rayon")]
mod rayon;
pub mod selection;
pub mod subtitle;
pub mod window;

pub use clipper::{ClipOutput, ClipPlan, ClipReport, Clipper};
pub use configuration::{ClipOptions, InvalidWindowPolicy};
pub use diagnostics::{CollectingDiagnostics, DiagnosticSink, SkipReason, WindowDiagnostic};
pub use error::SubclipError;
pub use extract::{ClipExtractor, ClipKind, ClipRequest, FfmpegExtractor};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use matcher::Matcher;
pub use media::MediaFile;
pub use output::OutputTemplate;
pub use pattern::Pattern;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use selection::{Selection, SelectionMode};
pub use subtitle::{MatchSpan, SubtitleEntry, format_timestamp, load_srt, parse_srt};
pub use window::{MAX_ADJUSTMENT_SECONDS, Window, WindowAdjustment, WindowCalculator};
