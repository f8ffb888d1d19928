//! Error types for the `subclip` crate.
//!
//! This module defines [`SubclipError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (entry
//! index, computed window values, file paths) to produce an actionable
//! message without additional logging at the call site.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use regex::Error as RegexError;
use thiserror::Error;

/// The unified error type for all `subclip` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubclipError {
    /// The pattern did not match any subtitle entry.
    ///
    /// This is a terminal, user-visible condition rather than a crash: the
    /// run produces no output files.
    #[error("No matches found for pattern {pattern:?}")]
    NoMatch {
        /// The pattern as supplied by the caller.
        pattern: String,
    },

    /// An interactive selection was out of range or malformed.
    #[error("Invalid selection {input:?}: {reason}")]
    InvalidSelection {
        /// The raw selection text (or the offending token).
        input: String,
        /// Why the selection was rejected.
        reason: String,
    },

    /// A computed window ended before zero after slide and pad adjustments.
    #[error(
        "Window for subtitle #{entry_index} is invalid: end {end:.3}s is negative \
         (start {start:.3}s); try adjusting the slide or pad values"
    )]
    InvalidWindow {
        /// Index of the subtitle entry the window was computed for.
        entry_index: usize,
        /// Start of the window in seconds, after clamping.
        start: f64,
        /// End of the window in seconds.
        end: f64,
    },

    /// A slide or pad value is not a usable number of seconds.
    #[error(
        "Invalid {name} of {value} seconds: expected a finite value within \
         ±{limit:.0}s"
    )]
    InvalidAdjustment {
        /// Which adjustment was rejected (`"slide"` or `"pad"`).
        name: &'static str,
        /// The value as supplied.
        value: f64,
        /// Largest accepted magnitude in seconds.
        limit: f64,
    },

    /// The pattern is not a valid regular expression.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A subtitle file could not be parsed.
    #[error("Failed to parse subtitles at line {line}: {reason}")]
    SubtitleParse {
        /// One-based line number where parsing failed.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A media or subtitle file could not be opened.
    #[error("Failed to open file at {path}: {reason}")]
    FileOpen {
        /// Path that was being opened.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The file does not contain an audio stream.
    #[error("No audio stream found in file")]
    NoAudioStream,

    /// The file does not contain a text subtitle stream.
    #[error("No subtitle stream found in file")]
    NoSubtitleStream,

    /// A window timestamp lies beyond the media duration.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(Duration),

    /// Writing a clip to its output container failed.
    #[error("Failed to encode clip: {0}")]
    ClipEncodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for SubclipError {
    fn from(error: FfmpegError) -> Self {
        SubclipError::FfmpegError(error.to_string())
    }
}

impl From<RegexError> for SubclipError {
    fn from(error: RegexError) -> Self {
        SubclipError::InvalidPattern(error.to_string())
    }
}
