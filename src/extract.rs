//! Cutting clips out of source media.
//!
//! [`ClipExtractor`] is the seam between window computation and media I/O:
//! the [`Clipper`](crate::Clipper) hands it one [`ClipRequest`] per selected
//! subtitle. [`FfmpegExtractor`] is the FFmpeg-backed implementation:
//!
//! - [`ClipKind::Video`] decodes from the keyframe before the window,
//!   drops frames ahead of the start, and re-encodes the rest as H.264
//!   (MPEG-4 Part 2 when no H.264 encoder is built in). The best audio
//!   stream is copied packet by packet, trimmed to the window.
//! - [`ClipKind::AudioOnly`] decodes the best audio stream and writes it as
//!   a WAV file with signed 32-bit PCM samples.
//!
//! The output container is inferred from the output path's extension.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use subclip::{ClipExtractor, ClipKind, ClipRequest, FfmpegExtractor, Window};
//!
//! let request = ClipRequest {
//!     source: "episode.mkv".into(),
//!     output: "hello.mkv".into(),
//!     window: Window::new(Duration::from_secs(10), Duration::from_secs(12)),
//!     kind: ClipKind::Video,
//! };
//! FfmpegExtractor::new().extract(&request)?;
//! # Ok::<(), subclip::SubclipError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ffmpeg_next::{
    ChannelLayout, Packet, Rational,
    codec::{Id, context::Context as CodecContext},
    decoder::Video as VideoDecoder,
    encoder::{Audio as AudioEncoder, Video as VideoEncoder},
    format::{Flags as FormatFlags, Pixel, Sample, context::Output, sample::Type as SampleType},
    frame::{Audio as AudioFrame, Video as VideoFrame},
    picture::Type as PictureType,
    software::{
        resampling::Context as ResamplingContext,
        scaling::{Context as ScalingContext, Flags as ScalingFlags},
    },
};

use crate::conversion::{duration_to_seek_timestamp, duration_to_stream_timestamp, pts_to_seconds};
use crate::error::SubclipError;
use crate::media::MediaFile;
use crate::progress::CancellationToken;
use crate::window::Window;

/// Bit rate for the MPEG-4 fallback encoder, which has no quality default.
const FALLBACK_VIDEO_BIT_RATE: usize = 4_000_000;

/// What kind of file a clip is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipKind {
    /// Re-encoded video with its audio. This is the default.
    #[default]
    Video,
    /// Audio only, as 32-bit PCM WAV.
    AudioOnly,
}

impl Display for ClipKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ClipKind::Video => write!(f, "video"),
            ClipKind::AudioOnly => write!(f, "audio"),
        }
    }
}

impl FromStr for ClipKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ClipKind::Video),
            "audio" | "audio-only" => Ok(ClipKind::AudioOnly),
            other => Err(format!("unsupported clip kind {other:?} (expected video or audio)")),
        }
    }
}

/// One clip to write.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    /// Source media path.
    pub source: PathBuf,
    /// Where the clip is written.
    pub output: PathBuf,
    /// The slice of the source to keep, `[start, end)`.
    pub window: Window,
    /// Video or audio-only output.
    pub kind: ClipKind,
}

/// Writes clips for computed windows.
pub trait ClipExtractor {
    /// Write the clip described by `request` and return its path.
    fn extract(&mut self, request: &ClipRequest) -> Result<PathBuf, SubclipError>;
}

/// FFmpeg-backed [`ClipExtractor`].
#[derive(Debug, Clone, Default)]
pub struct FfmpegExtractor {
    cancellation: Option<CancellationToken>,
}

impl FfmpegExtractor {
    /// Create an extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop between packets once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn check_cancelled(&self) -> Result<(), SubclipError> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Err(SubclipError::Cancelled);
        }
        Ok(())
    }

    /// Re-encode the video of the window into `output`, carrying the best
    /// audio stream along by packet copy.
    ///
    /// Decoding starts at the keyframe before the window and frames ahead of
    /// `window.start` are dropped, so the clip starts on the requested frame
    /// whatever the source's keyframe spacing.
    fn write_video(&self, media: &mut MediaFile, output: &Path, window: Window) -> Result<(), SubclipError> {
        let video_stream_index = media.video_stream_index.ok_or(SubclipError::NoVideoStream)?;
        let audio_stream_index = media.audio_stream_index;

        let video_stream = media
            .input_context
            .stream(video_stream_index)
            .ok_or(SubclipError::NoVideoStream)?;
        let video_time_base = video_stream.time_base();
        let frame_rate = Some(video_stream.avg_frame_rate())
            .filter(|rate| rate.numerator() > 0 && rate.denominator() > 0)
            .unwrap_or(Rational(25, 1));
        let decoder = CodecContext::from_parameters(video_stream.parameters())?
            .decoder()
            .video()
            .map_err(encode_error)?;
        let audio_parameters = audio_stream_index
            .and_then(|index| media.input_context.stream(index))
            .map(|stream| (stream.parameters(), stream.time_base()));

        let mut output_context =
            ffmpeg_next::format::output(&output).map_err(|error| SubclipError::FileOpen {
                path: output.to_path_buf(),
                reason: format!("Failed to create output: {error}"),
            })?;
        let needs_global_header = output_context
            .format()
            .flags()
            .contains(FormatFlags::GLOBAL_HEADER);

        let codec = find_video_encoder()?;
        let (width, height) = (decoder.width(), decoder.height());
        let encoder = {
            let mut video_out = output_context.add_stream(codec)?;
            let mut encoder = CodecContext::from_parameters(video_out.parameters())?
                .encoder()
                .video()
                .map_err(encode_error)?;
            encoder.set_width(width);
            encoder.set_height(height);
            encoder.set_format(Pixel::YUV420P);
            encoder.set_time_base(video_time_base);
            encoder.set_frame_rate(Some(frame_rate));
            if codec.id() != Id::H264 {
                encoder.set_bit_rate(FALLBACK_VIDEO_BIT_RATE);
            }
            if needs_global_header {
                unsafe {
                    (*encoder.as_mut_ptr()).flags |=
                        ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
                }
            }
            let encoder = encoder.open_as(codec).map_err(encode_error)?;
            video_out.set_parameters(&encoder);
            video_out.set_time_base(video_time_base);
            encoder
        };

        if let Some((parameters, _)) = &audio_parameters {
            let mut audio_out = output_context.add_stream(ffmpeg_next::encoder::find(Id::None))?;
            audio_out.set_parameters(parameters.clone());
            // Let the muxer pick its own codec tag.
            unsafe {
                (*audio_out.parameters().as_mut_ptr()).codec_tag = 0;
            }
        }

        output_context.write_header().map_err(encode_error)?;
        let output_time_bases: Vec<Rational> = output_context
            .streams()
            .map(|stream| stream.time_base())
            .collect();

        let scaler = if decoder.format() == Pixel::YUV420P {
            None
        } else {
            Some(
                ScalingContext::get(
                    decoder.format(),
                    width,
                    height,
                    Pixel::YUV420P,
                    width,
                    height,
                    ScalingFlags::BILINEAR,
                )
                .map_err(encode_error)?,
            )
        };

        let mut video = VideoPipeline {
            decoder,
            scaler,
            encoder,
            input_time_base: video_time_base,
            output_time_base: output_time_bases[0],
            start_pts: duration_to_stream_timestamp(window.start, video_time_base),
            end_pts: duration_to_stream_timestamp(window.end, video_time_base),
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            encoded_packet: Packet::empty(),
            frames_written: 0,
            finished: false,
        };
        let mut audio = audio_parameters.map(|(_, time_base)| PacketCopy {
            input_time_base: time_base,
            output_time_base: output_time_bases[1],
            output_index: 1,
            start_pts: duration_to_stream_timestamp(window.start, time_base),
            end_pts: duration_to_stream_timestamp(window.end, time_base),
            packets_written: 0,
            finished: false,
        });

        let seek_timestamp = duration_to_seek_timestamp(window.start);
        media.input_context.seek(seek_timestamp, ..seek_timestamp)?;

        for (stream, packet) in media.input_context.packets() {
            self.check_cancelled()?;

            let input_index = stream.index();
            if input_index == video_stream_index {
                if !video.finished {
                    video.push(&packet, &mut output_context)?;
                }
            } else if Some(input_index) == audio_stream_index
                && let Some(audio) = audio.as_mut()
                && !audio.finished
            {
                audio.copy(packet, &mut output_context)?;
            }

            if video.finished && audio.as_ref().is_none_or(|audio| audio.finished) {
                break;
            }
        }
        video.finish(&mut output_context)?;

        if video.frames_written == 0 {
            return Err(SubclipError::ClipEncodeError(format!(
                "no video frame found in window {window}"
            )));
        }

        output_context.write_trailer().map_err(encode_error)?;
        log::debug!(
            "Encoded {} frames and copied {} audio packets to {}",
            video.frames_written,
            audio.map_or(0, |audio| audio.packets_written),
            output.display()
        );
        Ok(())
    }

    /// Decode the window of the best audio stream and write it as WAV.
    fn write_audio(&self, media: &mut MediaFile, output: &Path, window: Window) -> Result<(), SubclipError> {
        let audio_stream_index = media.audio_stream_index.ok_or(SubclipError::NoAudioStream)?;

        let stream = media
            .input_context
            .stream(audio_stream_index)
            .ok_or(SubclipError::NoAudioStream)?;
        let input_time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context
            .decoder()
            .audio()
            .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;

        let sample_rate = decoder.rate();
        let channel_layout = decoder.channel_layout();
        let sample_format = Sample::I32(SampleType::Packed);

        let output_codec = ffmpeg_next::encoder::find(Id::PCM_S32LE).ok_or_else(|| {
            SubclipError::ClipEncodeError("PCM s32le encoder is not available".to_string())
        })?;

        let mut output_context = ffmpeg_next::format::output_as(&output, "wav").map_err(|error| {
            SubclipError::FileOpen {
                path: output.to_path_buf(),
                reason: format!("Failed to create output: {error}"),
            }
        })?;

        let (mut encoder, encoder_time_base) =
            create_pcm_encoder(output_codec, sample_format, sample_rate, channel_layout)?;
        {
            let mut output_stream = output_context.add_stream(output_codec)?;
            output_stream.set_parameters(&encoder);
            output_stream.set_time_base(encoder_time_base);
        }
        output_context
            .write_header()
            .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;

        let mut resampler = ResamplingContext::get(
            decoder.format(),
            decoder.channel_layout(),
            sample_rate,
            sample_format,
            channel_layout,
            sample_rate,
        )
        .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;

        let seek_timestamp = duration_to_seek_timestamp(window.start);
        media.input_context.seek(seek_timestamp, ..seek_timestamp)?;

        let start_seconds = window.start.as_secs_f64();
        let end_seconds = window.end.as_secs_f64();
        let mut pipeline = AudioPipeline {
            resampler: &mut resampler,
            encoder: &mut encoder,
            output_context: &mut output_context,
            encoder_time_base,
            resampled_frame: AudioFrame::empty(),
            encoded_packet: Packet::empty(),
            samples_written: 0,
        };
        let mut decoded_frame = AudioFrame::empty();

        'packets: for (stream, packet) in media.input_context.packets() {
            self.check_cancelled()?;
            if stream.index() != audio_stream_index {
                continue;
            }
            if let Some(pts) = packet.pts()
                && pts_to_seconds(pts, input_time_base) >= end_seconds
            {
                break;
            }

            decoder
                .send_packet(&packet)
                .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                match frame_position(&decoded_frame, input_time_base, sample_rate, start_seconds, end_seconds) {
                    FramePosition::Before => continue,
                    FramePosition::After => break 'packets,
                    FramePosition::Inside => pipeline.push(&decoded_frame)?,
                }
            }
        }

        let _ = decoder.send_eof();
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if frame_position(&decoded_frame, input_time_base, sample_rate, start_seconds, end_seconds)
                == FramePosition::Inside
            {
                pipeline.push(&decoded_frame)?;
            }
        }
        pipeline.flush()?;
        let samples_written = pipeline.samples_written;

        output_context
            .write_trailer()
            .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;
        log::debug!("Wrote {samples_written} samples to {}", output.display());
        Ok(())
    }
}

impl ClipExtractor for FfmpegExtractor {
    fn extract(&mut self, request: &ClipRequest) -> Result<PathBuf, SubclipError> {
        log::debug!(
            "Extracting {} clip {} from {} to {}",
            request.kind,
            request.window,
            request.source.display(),
            request.output.display()
        );
        self.check_cancelled()?;

        let mut media = MediaFile::open(&request.source)?;
        let window = fit_window(request.window, media.duration())?;

        match request.kind {
            ClipKind::Video => self.write_video(&mut media, &request.output, window)?,
            ClipKind::AudioOnly => self.write_audio(&mut media, &request.output, window)?,
        }

        Ok(request.output.clone())
    }
}

/// Check a window against the media duration.
///
/// An end past the duration is pulled back to it. A zero duration means the
/// container did not declare one and nothing is checked.
fn fit_window(window: Window, media_duration: Duration) -> Result<Window, SubclipError> {
    let mut window = window;
    if media_duration > Duration::ZERO {
        if window.start >= media_duration {
            return Err(SubclipError::InvalidTimestamp(window.start));
        }
        if window.end > media_duration {
            log::warn!(
                "Window end {:?} is past the media duration {:?}; clipping to the end",
                window.end,
                media_duration
            );
            window.end = media_duration;
        }
    }

    if window.is_empty() {
        return Err(SubclipError::ClipEncodeError(format!(
            "window {window} is empty"
        )));
    }
    Ok(window)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePosition {
    Before,
    Inside,
    After,
}

/// Place a decoded frame relative to the window.
fn frame_position(
    frame: &AudioFrame,
    time_base: Rational,
    sample_rate: u32,
    start_seconds: f64,
    end_seconds: f64,
) -> FramePosition {
    let Some(pts) = frame.pts() else {
        return FramePosition::Inside;
    };
    let frame_start = pts_to_seconds(pts, time_base);
    let frame_end = frame_start + frame.samples() as f64 / f64::from(sample_rate.max(1));

    if frame_end <= start_seconds {
        FramePosition::Before
    } else if frame_start >= end_seconds {
        FramePosition::After
    } else {
        FramePosition::Inside
    }
}

fn encode_error(error: ffmpeg_next::Error) -> SubclipError {
    SubclipError::ClipEncodeError(error.to_string())
}

/// H.264 when the FFmpeg build has an encoder for it, MPEG-4 Part 2 otherwise.
fn find_video_encoder() -> Result<ffmpeg_next::Codec, SubclipError> {
    [Id::H264, Id::MPEG4]
        .into_iter()
        .find_map(ffmpeg_next::encoder::find)
        .ok_or_else(|| {
            SubclipError::ClipEncodeError("no H.264 or MPEG-4 video encoder available".to_string())
        })
}

fn create_pcm_encoder(
    codec: ffmpeg_next::Codec,
    sample_format: Sample,
    sample_rate: u32,
    channel_layout: ChannelLayout,
) -> Result<(AudioEncoder, Rational), SubclipError> {
    let mut encoder_context = CodecContext::new()
        .encoder()
        .audio()
        .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;

    let time_base = Rational(1, sample_rate as i32);
    encoder_context.set_rate(sample_rate as i32);
    encoder_context.set_channel_layout(channel_layout);
    encoder_context.set_format(sample_format);
    encoder_context.set_time_base(time_base);

    let encoder = encoder_context
        .open_as(codec)
        .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;
    Ok((encoder, time_base))
}

/// Resample → encode → write, with running sample count for PTS.
struct AudioPipeline<'a> {
    resampler: &'a mut ResamplingContext,
    encoder: &'a mut AudioEncoder,
    output_context: &'a mut Output,
    encoder_time_base: Rational,
    resampled_frame: AudioFrame,
    encoded_packet: Packet,
    samples_written: i64,
}

impl AudioPipeline<'_> {
    fn push(&mut self, decoded_frame: &AudioFrame) -> Result<(), SubclipError> {
        self.resampler
            .run(decoded_frame, &mut self.resampled_frame)
            .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;

        self.resampled_frame.set_pts(Some(self.samples_written));
        self.samples_written += self.resampled_frame.samples() as i64;

        self.encoder
            .send_frame(&self.resampled_frame)
            .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;
        self.drain()
    }

    fn flush(&mut self) -> Result<(), SubclipError> {
        let _ = self.encoder.send_eof();
        self.drain()
    }

    fn drain(&mut self) -> Result<(), SubclipError> {
        while self.encoder.receive_packet(&mut self.encoded_packet).is_ok() {
            self.encoded_packet.set_stream(0);
            self.encoded_packet
                .rescale_ts(self.encoder_time_base, self.encoder_time_base);
            self.encoded_packet
                .write_interleaved(self.output_context)
                .map_err(|error| SubclipError::ClipEncodeError(error.to_string()))?;
        }
        Ok(())
    }
}

/// Decode → trim → scale → encode for the video stream of a clip.
///
/// Timestamps stay in the input stream's time base and are rebased so the
/// frame at `start_pts` becomes zero.
struct VideoPipeline {
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    encoder: VideoEncoder,
    input_time_base: Rational,
    output_time_base: Rational,
    start_pts: i64,
    end_pts: i64,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    encoded_packet: Packet,
    frames_written: u64,
    finished: bool,
}

impl VideoPipeline {
    fn push(&mut self, packet: &Packet, output: &mut Output) -> Result<(), SubclipError> {
        self.decoder.send_packet(packet).map_err(encode_error)?;
        self.receive_frames(output)
    }

    fn finish(&mut self, output: &mut Output) -> Result<(), SubclipError> {
        let _ = self.decoder.send_eof();
        self.receive_frames(output)?;
        self.encoder.send_eof().map_err(encode_error)?;
        self.drain(output)
    }

    fn receive_frames(&mut self, output: &mut Output) -> Result<(), SubclipError> {
        while self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
            let Some(pts) = self.decoded_frame.timestamp().or(self.decoded_frame.pts()) else {
                continue;
            };
            if pts < self.start_pts {
                continue;
            }
            if pts >= self.end_pts {
                self.finished = true;
                continue;
            }

            let frame = match self.scaler.as_mut() {
                Some(scaler) => {
                    scaler
                        .run(&self.decoded_frame, &mut self.scaled_frame)
                        .map_err(encode_error)?;
                    &mut self.scaled_frame
                }
                None => &mut self.decoded_frame,
            };
            frame.set_pts(Some(pts - self.start_pts));
            // Keyframes are placed by the encoder, not inherited from the source.
            frame.set_kind(PictureType::None);
            self.encoder.send_frame(frame).map_err(encode_error)?;
            self.frames_written += 1;
            self.drain(output)?;
        }
        Ok(())
    }

    fn drain(&mut self, output: &mut Output) -> Result<(), SubclipError> {
        while self.encoder.receive_packet(&mut self.encoded_packet).is_ok() {
            self.encoded_packet.set_stream(0);
            self.encoded_packet
                .rescale_ts(self.input_time_base, self.output_time_base);
            self.encoded_packet
                .write_interleaved(output)
                .map_err(encode_error)?;
        }
        Ok(())
    }
}

/// Packet copy of one stream, trimmed to the window and rebased to zero.
struct PacketCopy {
    input_time_base: Rational,
    output_time_base: Rational,
    output_index: usize,
    start_pts: i64,
    end_pts: i64,
    packets_written: u64,
    finished: bool,
}

impl PacketCopy {
    fn copy(&mut self, mut packet: Packet, output: &mut Output) -> Result<(), SubclipError> {
        let Some(timestamp) = packet.pts().or(packet.dts()) else {
            return Ok(());
        };
        if timestamp >= self.end_pts {
            self.finished = true;
            return Ok(());
        }
        if timestamp < self.start_pts {
            return Ok(());
        }

        packet.set_pts(packet.pts().map(|pts| pts - self.start_pts));
        packet.set_dts(packet.dts().map(|dts| dts - self.start_pts));
        packet.set_stream(self.output_index);
        packet.rescale_ts(self.input_time_base, self.output_time_base);
        packet.set_position(-1);
        packet.write_interleaved(output).map_err(encode_error)?;
        self.packets_written += 1;
        Ok(())
    }
}
