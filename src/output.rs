//! Output path templating.
//!
//! When a run can write several clips, every `*` in the output path is
//! replaced with the clip's 1-based ordinal (`clip_*.mp4` becomes
//! `clip_1.mp4`, `clip_2.mp4`, ...). A path without `*` gets `_<n>`
//! appended to its stem instead, so clips never overwrite each other.

use std::path::{Path, PathBuf};

/// An output path that may carry a `*` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    template: String,
}

impl OutputTemplate {
    /// Wrap an output path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            template: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// Whether the template contains a `*` placeholder.
    pub fn has_placeholder(&self) -> bool {
        self.template.contains('*')
    }

    /// Path for the clip numbered `ordinal` (1-based).
    ///
    /// With `multi` false the template is returned verbatim, placeholder
    /// included, matching a single-clip run.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::PathBuf;
    ///
    /// use subclip::OutputTemplate;
    ///
    /// let template = OutputTemplate::new("out/clip_*.mp4");
    /// assert_eq!(template.resolve(2, true), PathBuf::from("out/clip_2.mp4"));
    ///
    /// let plain = OutputTemplate::new("out/clip.mp4");
    /// assert_eq!(plain.resolve(2, true), PathBuf::from("out/clip_2.mp4"));
    /// assert_eq!(plain.resolve(1, false), PathBuf::from("out/clip.mp4"));
    /// ```
    pub fn resolve(&self, ordinal: usize, multi: bool) -> PathBuf {
        if !multi {
            return PathBuf::from(&self.template);
        }

        if self.has_placeholder() {
            return PathBuf::from(self.template.replace('*', &ordinal.to_string()));
        }

        let path = Path::new(&self.template);
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match path.extension() {
            Some(extension) => format!("{stem}_{ordinal}.{}", extension.to_string_lossy()),
            None => format!("{stem}_{ordinal}"),
        };
        path.with_file_name(file_name)
    }
}
