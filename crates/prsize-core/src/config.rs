use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PrsizeError;
use crate::types::Label;

/// Top-level configuration loaded from `.prsize.toml`.
///
/// Every field is optional. Absent exclusion fields mean "not excluded" and an
/// absent label table falls back to [`PrsizeConfig::default_labels`].
///
/// # Examples
///
/// ```
/// use prsize_core::PrsizeConfig;
///
/// let config = PrsizeConfig::default();
/// assert_eq!(config.labels.len(), 5);
/// assert!(!config.exclude.lines.blank);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrsizeConfig {
    /// Suggested upper bound of changes, mentioned in the markdown report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u64>,
    /// Files and line classes left out of the change count.
    #[serde(default)]
    pub exclude: ExcludeConfig,
    /// Line classification switches.
    #[serde(default)]
    pub classify: ClassifyConfig,
    /// Size labels, in any order.
    #[serde(default = "PrsizeConfig::default_labels")]
    pub labels: Vec<Label>,
}

impl PrsizeConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PrsizeError::Io`] if the file cannot be read, or
    /// [`PrsizeError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prsize_core::PrsizeConfig;
    /// use std::path::Path;
    ///
    /// let config = PrsizeConfig::from_file(Path::new(".prsize.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PrsizeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PrsizeError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsize_core::PrsizeConfig;
    ///
    /// let toml = r#"
    /// [exclude.lines]
    /// comments = true
    /// "#;
    /// let config = PrsizeConfig::from_toml(toml).unwrap();
    /// assert!(config.exclude.lines.comments);
    /// assert!(!config.exclude.lines.imports);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PrsizeError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// The label table used when a config file does not define one.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsize_core::PrsizeConfig;
    ///
    /// let labels = PrsizeConfig::default_labels();
    /// assert_eq!(labels[0].name, "Extra Small");
    /// assert_eq!(labels[0].max_changes, Some(16));
    /// assert!(labels[4].max_changes.is_none());
    /// ```
    pub fn default_labels() -> Vec<Label> {
        vec![
            Label::bounded("Extra Small", 16),
            Label::bounded("Small", 64),
            Label::bounded("Medium", 256),
            Label::bounded("Large", 512),
            Label::unbounded("Extra Large"),
        ]
    }
}

impl Default for PrsizeConfig {
    fn default() -> Self {
        Self {
            target: None,
            exclude: ExcludeConfig::default(),
            classify: ClassifyConfig::default(),
            labels: Self::default_labels(),
        }
    }
}

/// Exclusion settings: file globs and line classes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeConfig {
    /// Glob patterns; matching files are dropped before classification.
    #[serde(default)]
    pub files: Vec<String>,
    /// Line classes that do not count toward the change total.
    #[serde(default)]
    pub lines: LineExclusions,
}

/// Per-class exclusion flags. A `true` flag removes that class from the change
/// count; the lines are still recorded in the histograms.
///
/// # Examples
///
/// ```
/// use prsize_core::LineExclusions;
///
/// let lines = LineExclusions::default();
/// assert!(!lines.blank && !lines.comments && !lines.imports && !lines.delimiters);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineExclusions {
    #[serde(default)]
    pub blank: bool,
    #[serde(default)]
    pub comments: bool,
    #[serde(default)]
    pub imports: bool,
    #[serde(default)]
    pub delimiters: bool,
}

/// Line classification switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Give lines made only of `;`, `,`, `)`, `}` and `]` their own class.
    #[serde(default)]
    pub delimiters: bool,
}
