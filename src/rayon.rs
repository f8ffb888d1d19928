//! Parallel matching and window computation.
//!
//! Both passes are pure per-entry work, so they map directly onto
//! [`rayon`]'s indexed parallel iterators, which keep input order on
//! `collect`.
//!
//! The public API is exposed through
//! [`Matcher::find_parallel`](crate::Matcher) and
//! [`WindowCalculator::compute_all_parallel`](crate::WindowCalculator).

use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::error::SubclipError;
use crate::matcher::Matcher;
use crate::subtitle::SubtitleEntry;
use crate::window::{Window, WindowCalculator};

/// Scan entries on the thread pool, keeping matched entries in input order.
pub(crate) fn parallel_find(matcher: &Matcher, entries: &[SubtitleEntry]) -> Vec<SubtitleEntry> {
    let matches: Vec<SubtitleEntry> = entries
        .par_iter()
        .filter_map(|entry| matcher.match_entry(entry))
        .collect();

    log::debug!(
        "Pattern {:?} matched {} of {} entries (parallel)",
        matcher.pattern().as_str(),
        matches.len(),
        entries.len()
    );
    matches
}

/// Compute one window result per entry on the thread pool.
pub(crate) fn parallel_compute(
    calculator: &WindowCalculator,
    entries: &[SubtitleEntry],
) -> Vec<Result<Window, SubclipError>> {
    entries
        .par_iter()
        .map(|entry| calculator.compute(entry))
        .collect()
}
