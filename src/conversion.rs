//! Timestamp conversion between [`Duration`] and FFmpeg time bases.

use std::time::Duration;

use ffmpeg_next::Rational;

/// Convert a [`Duration`] to a timestamp in the stream's time base.
pub fn duration_to_stream_timestamp(duration: Duration, time_base: Rational) -> i64 {
    let seconds = duration.as_secs_f64();
    let numerator = time_base.numerator() as f64;
    let denominator = time_base.denominator() as f64;
    (seconds * denominator / numerator) as i64
}

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator().max(1) as f64
}

/// Convert a [`Duration`] to a container-level seek timestamp.
///
/// `input_context.seek()` with no stream expects AV_TIME_BASE units.
pub fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    let micros = duration.as_micros() as i64;
    micros * i64::from(ffmpeg_sys_next::AV_TIME_BASE) / 1_000_000
}
