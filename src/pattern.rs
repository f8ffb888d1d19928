//! Search patterns.
//!
//! A [`Pattern`] is compiled once per run from the text the user typed. By
//! default the text is a regular expression and matching ignores case; both
//! can be changed with [`Pattern::case_sensitive`] and [`Pattern::literal`].

use std::fmt::{Display, Formatter, Result as FmtResult};

use regex::{Regex, RegexBuilder};

use crate::error::SubclipError;

/// A compiled, immutable search pattern.
///
/// # Example
///
/// ```
/// use subclip::Pattern;
///
/// let pattern = Pattern::new("Hello")?;
/// assert_eq!(pattern.normalize("Hello World"), "hello world");
/// # Ok::<(), subclip::SubclipError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    case_sensitive: bool,
    literal: bool,
    regex: Regex,
}

impl Pattern {
    /// Compile a case-insensitive regular expression.
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::InvalidPattern`] if `source` is not a valid
    /// regular expression.
    pub fn new(source: impl Into<String>) -> Result<Self, SubclipError> {
        Self::with_flags(source, false, false)
    }

    /// Compile a pattern with explicit case and literal semantics.
    ///
    /// When `case_sensitive` is false the expression is compiled
    /// case-insensitively and run against lowercased entry text; the source
    /// is compiled as typed, so escapes like `\D` keep their meaning. When
    /// `literal` is true regex metacharacters are escaped.
    ///
    /// # Errors
    ///
    /// Returns [`SubclipError::InvalidPattern`] if the pattern is empty or
    /// the (non-literal) pattern does not compile.
    pub fn with_flags(
        source: impl Into<String>,
        case_sensitive: bool,
        literal: bool,
    ) -> Result<Self, SubclipError> {
        let source = source.into();
        if source.is_empty() {
            return Err(SubclipError::InvalidPattern("pattern is empty".to_string()));
        }
        let expression = if literal {
            regex::escape(&source)
        } else {
            source.clone()
        };
        let regex = RegexBuilder::new(&expression)
            .case_insensitive(!case_sensitive)
            .build()?;

        Ok(Self {
            source,
            case_sensitive,
            literal,
            regex,
        })
    }

    /// Return a copy that compares case-sensitively.
    ///
    /// # Errors
    ///
    /// See [`with_flags`](Pattern::with_flags).
    pub fn case_sensitive(self) -> Result<Self, SubclipError> {
        Self::with_flags(self.source, true, self.literal)
    }

    /// Return a copy that treats the source text literally.
    ///
    /// # Errors
    ///
    /// See [`with_flags`](Pattern::with_flags).
    pub fn literal(self) -> Result<Self, SubclipError> {
        Self::with_flags(self.source, self.case_sensitive, true)
    }

    /// The pattern text as supplied.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether comparison respects case.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Whether regex metacharacters are escaped.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// The compiled expression.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Produce the comparison copy of `text` for this pattern.
    pub fn normalize(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.source)
    }
}
