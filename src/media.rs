//! Source media handling.
//!
//! [`MediaFile`] opens a media container through FFmpeg, records its
//! duration and best streams, and can read an embedded text subtitle track
//! as [`SubtitleEntry`] values so a separate `.srt` file is not required.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Subtitle, codec::context::Context as CodecContext, format::context::Input, media::Type,
    subtitle::Rect,
};

use crate::error::SubclipError;
use crate::subtitle::{SubtitleEntry, strip_ass_tags};

/// An opened source media file.
///
/// # Example
///
/// ```no_run
/// use subclip::{MediaFile, SubclipError};
///
/// let media = MediaFile::open("episode.mkv")?;
/// println!("Duration: {:?}", media.duration());
/// # Ok::<(), SubclipError>(())
/// ```
pub struct MediaFile {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// Container duration, zero when unknown.
    pub(crate) duration: Duration,
    /// Index of the best video stream, if one exists.
    pub(crate) video_stream_index: Option<usize>,
    /// Index of the best audio stream, if one exists.
    pub(crate) audio_stream_index: Option<usize>,
    /// Indices of all subtitle streams, ordered by track number.
    pub(crate) subtitle_stream_indices: Vec<usize>,
    /// Index of the best subtitle stream, if one exists.
    pub(crate) subtitle_stream_index: Option<usize>,
    pub(crate) file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("duration", &self.duration)
            .field("video_stream_index", &self.video_stream_index)
            .field("audio_stream_index", &self.audio_stream_index)
            .field("subtitle_stream_indices", &self.subtitle_stream_indices)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, and locates the best
    /// video, audio, and subtitle streams.
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::FileOpen`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SubclipError> {
        let file_path = path.as_ref().to_path_buf();
        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| SubclipError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&file_path).map_err(|error| SubclipError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let best = |medium: Type| {
            input_context
                .streams()
                .best(medium)
                .map(|stream| stream.index())
        };
        let video_stream_index = best(Type::Video);
        let audio_stream_index = best(Type::Audio);
        let subtitle_stream_index = best(Type::Subtitle);

        let subtitle_stream_indices: Vec<usize> = input_context
            .streams()
            .filter(|stream| stream.parameters().medium() == Type::Subtitle)
            .map(|stream| stream.index())
            .collect();

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        log::info!(
            "Opened media file: {} (format={}, duration={:.2}s, video={}, audio={}, subtitle_streams={})",
            file_path.display(),
            input_context.format().name(),
            duration.as_secs_f64(),
            video_stream_index.is_some(),
            audio_stream_index.is_some(),
            subtitle_stream_indices.len(),
        );

        Ok(Self {
            input_context,
            duration,
            video_stream_index,
            audio_stream_index,
            subtitle_stream_indices,
            subtitle_stream_index,
            file_path,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Container duration, or [`Duration::ZERO`] if the container does not
    /// declare one.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether the file has a video stream.
    pub fn has_video(&self) -> bool {
        self.video_stream_index.is_some()
    }

    /// Whether the file has an audio stream.
    pub fn has_audio(&self) -> bool {
        self.audio_stream_index.is_some()
    }

    /// Number of subtitle tracks in the container.
    pub fn subtitle_track_count(&self) -> usize {
        self.subtitle_stream_indices.len()
    }

    /// Read the best embedded text subtitle track.
    ///
    /// Packets are read from the current demuxer position, so call this on
    /// a freshly opened file.
    ///
    /// # Errors
    ///
    /// - [`SubclipError::NoSubtitleStream`] if the file has no subtitle track.
    /// - [`SubclipError::FfmpegError`] if decoding fails.
    pub fn subtitle_entries(&mut self) -> Result<Vec<SubtitleEntry>, SubclipError> {
        let stream_index = self
            .subtitle_stream_index
            .ok_or(SubclipError::NoSubtitleStream)?;
        self.decode_subtitle_stream(stream_index)
    }

    /// Read a specific embedded subtitle track (zero-based).
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::NoSubtitleStream`] if `track_index` is out of
    /// range, or any decoding error.
    pub fn subtitle_track_entries(
        &mut self,
        track_index: usize,
    ) -> Result<Vec<SubtitleEntry>, SubclipError> {
        let stream_index = self
            .subtitle_stream_indices
            .get(track_index)
            .copied()
            .ok_or(SubclipError::NoSubtitleStream)?;
        self.decode_subtitle_stream(stream_index)
    }

    /// Decode every text event of a subtitle stream, sorted by start time
    /// and numbered from 1.
    fn decode_subtitle_stream(
        &mut self,
        stream_index: usize,
    ) -> Result<Vec<SubtitleEntry>, SubclipError> {
        log::debug!("Reading subtitles from stream {stream_index}");

        let stream = self
            .input_context
            .stream(stream_index)
            .ok_or(SubclipError::NoSubtitleStream)?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().subtitle().map_err(|error| {
            SubclipError::FfmpegError(format!("Failed to create subtitle decoder: {error}"))
        })?;

        let mut timed_texts: Vec<(Duration, Duration, String)> = Vec::new();
        let mut subtitle = Subtitle::new();

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }

            let got_subtitle = decoder.decode(&packet, &mut subtitle).map_err(|error| {
                SubclipError::FfmpegError(format!("Subtitle decode error: {error}"))
            })?;
            if !got_subtitle {
                continue;
            }

            // Subtitle PTS is in AV_TIME_BASE (microseconds); packet PTS is
            // in the stream time base.
            let base_micros = match subtitle.pts() {
                Some(pts) => pts.max(0) as u64,
                None => {
                    let packet_pts = packet.pts().unwrap_or(0).max(0);
                    (crate::conversion::pts_to_seconds(packet_pts, time_base) * 1_000_000.0)
                        as u64
                }
            };
            let base = Duration::from_micros(base_micros);
            let start = base + Duration::from_millis(subtitle.start() as u64);
            let mut end = base + Duration::from_millis(subtitle.end() as u64);
            if end < start {
                end = start;
            }

            let text_parts: Vec<String> = subtitle
                .rects()
                .filter_map(|rect| match rect {
                    Rect::Text(text) => Some(text.get().trim().to_string()),
                    Rect::Ass(ass) => Some(strip_ass_tags(ass.get())),
                    _ => None,
                })
                .filter(|text| !text.is_empty())
                .collect();

            if !text_parts.is_empty() {
                timed_texts.push((start, end, text_parts.join("\n")));
            }
        }

        timed_texts.sort_by_key(|(start, _, _)| *start);
        let entries: Vec<SubtitleEntry> = timed_texts
            .into_iter()
            .enumerate()
            .map(|(position, (start, end, text))| SubtitleEntry::new(position + 1, start, end, text))
            .collect();

        log::debug!("Decoded {} embedded subtitle entries", entries.len());
        Ok(entries)
    }
}
