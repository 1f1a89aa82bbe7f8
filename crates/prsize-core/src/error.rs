/// Errors that can occur across prsize.
///
/// Library crates use this type directly; the binary turns it into a
/// `miette` report at the boundary.
///
/// Unsupported languages and missing file content are not errors: both degrade
/// to the default line class.
///
/// # Examples
///
/// ```
/// use prsize_core::PrsizeError;
///
/// let err = PrsizeError::InvalidLabelTable("no unbounded label".into());
/// assert!(err.to_string().contains("no unbounded label"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PrsizeError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(prsize::config))]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Unified diff could not be split into files.
    #[error("parse error: {0}")]
    Parse(String),

    /// A `@@ ... @@` line does not follow the hunk coordinate grammar.
    #[error("malformed hunk header: {0}")]
    #[diagnostic(
        code(prsize::hunk),
        help("hunk headers look like `@@ -a,b +c,d @@`")
    )]
    MalformedHunkHeader(String),

    /// The label threshold table is empty or has the wrong number of unbounded labels.
    #[error("invalid label table: {0}")]
    #[diagnostic(
        code(prsize::labels),
        help("exactly one label must omit `max_changes`")
    )]
    InvalidLabelTable(String),

    /// An exclusion pattern is not a valid glob.
    #[error("invalid glob pattern `{pattern}`: {source}")]
    #[diagnostic(code(prsize::glob))]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A background task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
