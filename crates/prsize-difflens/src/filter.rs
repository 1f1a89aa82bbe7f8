//! Exclusion policy: which files are dropped and which line classes are left
//! out of the change count.

use std::fmt;

use glob::{MatchOptions, Pattern};
use prsize_core::{ExcludeConfig, LineClass, LineExclusions, PrsizeError};
use serde::Serialize;

use crate::parser::ChangedFile;

/// `*` stays inside one path segment and dotfiles need an explicit dot.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// File patterns plus line-class exclusions.
///
/// # Examples
///
/// ```
/// use prsize_core::{ExcludeConfig, LineClass};
/// use prsize_difflens::filter::ExclusionPolicy;
///
/// let mut config = ExcludeConfig::default();
/// config.files.push("**/*.lock".into());
/// config.lines.comments = true;
///
/// let policy = ExclusionPolicy::from_config(&config).unwrap();
/// assert!(policy.matching_pattern("Cargo.lock").is_some());
/// assert!(policy.matching_pattern("src/main.rs").is_none());
/// assert!(policy.excludes_class(LineClass::Comment));
/// assert!(!policy.excludes_class(LineClass::Default));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    file_patterns: Vec<Pattern>,
    lines: LineExclusions,
}

impl ExclusionPolicy {
    /// Build a policy, compiling every pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PrsizeError::Glob`] for the first invalid pattern.
    pub fn new<S: AsRef<str>>(patterns: &[S], lines: LineExclusions) -> Result<Self, PrsizeError> {
        let file_patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|source| PrsizeError::Glob {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            file_patterns,
            lines,
        })
    }

    /// Build a policy from the `[exclude]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`PrsizeError::Glob`] for the first invalid pattern.
    pub fn from_config(config: &ExcludeConfig) -> Result<Self, PrsizeError> {
        Self::new(&config.files, config.lines)
    }

    pub fn lines(&self) -> LineExclusions {
        self.lines
    }

    /// First pattern matching `path`, if any.
    pub fn matching_pattern(&self, path: &str) -> Option<&Pattern> {
        self.file_patterns
            .iter()
            .find(|p| p.matches_with(path, MATCH_OPTIONS))
    }

    /// Whether `class` is left out of the change count. Default code always
    /// counts.
    pub fn excludes_class(&self, class: LineClass) -> bool {
        match class {
            LineClass::Default => false,
            LineClass::Blank => self.lines.blank,
            LineClass::Comment => self.lines.comments,
            LineClass::Import => self.lines.imports,
            LineClass::Delimiter => self.lines.delimiters,
        }
    }

    /// Split changed files into those to measure and those dropped by a pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsize_core::LineExclusions;
    /// use prsize_difflens::filter::ExclusionPolicy;
    /// use prsize_difflens::parser::split_unified_diff;
    ///
    /// let diff = "diff --git a/README.md b/README.md\n\
    ///             --- a/README.md\n\
    ///             +++ b/README.md\n\
    ///             @@ -1 +1 @@\n\
    ///             -a\n\
    ///             +b\n";
    /// let files = split_unified_diff(diff).unwrap();
    /// let policy = ExclusionPolicy::new(&["**/*.md"], LineExclusions::default()).unwrap();
    /// let result = policy.filter(files);
    /// assert!(result.kept.is_empty());
    /// assert_eq!(result.skipped[0].path, "README.md");
    /// ```
    pub fn filter(&self, files: Vec<ChangedFile>) -> FilterResult {
        let mut kept = Vec::new();
        let mut skipped = Vec::new();

        for file in files {
            match self.matching_pattern(&file.path) {
                Some(pattern) => {
                    tracing::debug!(path = %file.path, %pattern, "file excluded");
                    skipped.push(SkippedFile {
                        path: file.path,
                        pattern: pattern.to_string(),
                    });
                }
                None => kept.push(file),
            }
        }

        FilterResult { kept, skipped }
    }
}

/// Result of filtering changed files.
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Files that will be measured.
    pub kept: Vec<ChangedFile>,
    /// Files that were dropped.
    pub skipped: Vec<SkippedFile>,
}

/// A file dropped by an exclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub path: String,
    pub pattern: String,
}

impl fmt::Display for SkippedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (matches {})", self.path, self.pattern)
    }
}
