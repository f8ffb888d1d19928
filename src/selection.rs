//! Choosing which matches become clips.
//!
//! [`SelectionMode`] is the policy from the command line: the first match,
//! every match, or the ones a person picks. Picking is split in two: the
//! caller renders the matches and collects an index list, then
//! [`Selection::parse`] validates it against the match count before
//! [`Selection::apply`] narrows the list.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::SubclipError;

/// How to handle several matching subtitles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Keep only the first match. This is the default.
    #[default]
    First,
    /// Keep every match.
    All,
    /// Show the matches and keep the ones picked by index.
    Interactive,
}

impl SelectionMode {
    /// Whether this mode can produce more than one clip.
    pub fn is_multi(&self) -> bool {
        !matches!(self, SelectionMode::First)
    }

    /// The selection this mode resolves to without user input.
    ///
    /// `None` for [`SelectionMode::Interactive`], which needs indices.
    pub fn selection(&self) -> Option<Selection> {
        match self {
            SelectionMode::First => Some(Selection::First),
            SelectionMode::All => Some(Selection::All),
            SelectionMode::Interactive => None,
        }
    }
}

impl Display for SelectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SelectionMode::First => write!(f, "first"),
            SelectionMode::All => write!(f, "all"),
            SelectionMode::Interactive => write!(f, "interactive"),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(SelectionMode::First),
            "all" => Ok(SelectionMode::All),
            "interactive" => Ok(SelectionMode::Interactive),
            other => Err(format!(
                "unsupported mode {other:?} (expected first, all, or interactive)"
            )),
        }
    }
}

/// A resolved choice of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The first match only.
    First,
    /// Every match.
    All,
    /// Zero-based indices into the match list, in the order given.
    /// Duplicates are kept.
    Indices(Vec<usize>),
}

impl Selection {
    /// Parse a comma separated index list such as `"0, 2,3"`.
    ///
    /// Every index must be below `match_count`.
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::InvalidSelection`] if the list is empty, a
    /// token is not a non-negative integer, or an index is out of range.
    pub fn parse(input: &str, match_count: usize) -> Result<Self, SubclipError> {
        let invalid = |reason: String| SubclipError::InvalidSelection {
            input: input.trim().to_string(),
            reason,
        };

        if input.trim().is_empty() {
            return Err(invalid("no match was selected".to_string()));
        }

        let mut indices = Vec::new();
        for token in input.split(',') {
            let token = token.trim();
            let index = token
                .parse::<usize>()
                .map_err(|_| invalid(format!("{token:?} is not a match number")))?;
            if index >= match_count {
                return Err(invalid(format!(
                    "{index} is out of range ({match_count} matches, numbered from 0)"
                )));
            }
            indices.push(index);
        }

        Ok(Selection::Indices(indices))
    }

    /// Narrow `matches` to the selection.
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::InvalidSelection`] if an index is out of
    /// range for `matches`.
    pub fn apply<T: Clone>(&self, matches: &[T]) -> Result<Vec<T>, SubclipError> {
        match self {
            Selection::First => Ok(matches.iter().take(1).cloned().collect()),
            Selection::All => Ok(matches.to_vec()),
            Selection::Indices(indices) => indices
                .iter()
                .map(|&index| {
                    matches
                        .get(index)
                        .cloned()
                        .ok_or_else(|| SubclipError::InvalidSelection {
                            input: index.to_string(),
                            reason: format!(
                                "{index} is out of range ({} matches, numbered from 0)",
                                matches.len()
                            ),
                        })
                })
                .collect(),
        }
    }
}
