use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One side (old or new) of a changed file at a given revision.
///
/// `found == false` means the content could not be retrieved, e.g. the file
/// was created or deleted by the change. Such a side is never classified.
///
/// # Examples
///
/// ```
/// use prsize_core::FileSnapshot;
///
/// let snap = FileSnapshot::new("src/lib.rs", "fn main() {}");
/// assert!(snap.found);
///
/// let missing = FileSnapshot::not_found("src/gone.rs");
/// assert!(!missing.found);
/// assert!(missing.content.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSnapshot {
    /// Repository-relative path.
    pub path: String,
    /// Full file content, empty when not found.
    pub content: String,
    /// Whether the content was retrieved.
    pub found: bool,
}

impl FileSnapshot {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            found: true,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: String::new(),
            found: false,
        }
    }
}

/// Semantic class of a single changed line.
///
/// # Examples
///
/// ```
/// use prsize_core::LineClass;
///
/// assert_eq!(format!("{}", LineClass::Import), "import");
/// assert_eq!(LineClass::ALL.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineClass {
    /// Substantive code.
    Default,
    /// Empty or whitespace-only.
    Blank,
    /// Inside an import/use declaration.
    Import,
    /// Inside a comment.
    Comment,
    /// Only closing punctuation such as `});`.
    Delimiter,
}

impl LineClass {
    pub const ALL: [LineClass; 5] = [
        LineClass::Default,
        LineClass::Blank,
        LineClass::Import,
        LineClass::Comment,
        LineClass::Delimiter,
    ];
}

impl fmt::Display for LineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineClass::Default => write!(f, "default"),
            LineClass::Blank => write!(f, "blank"),
            LineClass::Import => write!(f, "import"),
            LineClass::Comment => write!(f, "comment"),
            LineClass::Delimiter => write!(f, "delimiter"),
        }
    }
}

/// Per-class line counts for one side (additions or deletions) of a change.
///
/// # Examples
///
/// ```
/// use prsize_core::{ClassHistogram, LineClass};
///
/// let mut hist = ClassHistogram::default();
/// hist.record(LineClass::Comment);
/// hist.record(LineClass::Comment);
/// hist.record(LineClass::Default);
/// assert_eq!(hist.get(LineClass::Comment), 2);
/// assert_eq!(hist.total(), 3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassHistogram {
    pub default: u64,
    pub blank: u64,
    #[serde(rename = "imports", alias = "import")]
    pub import: u64,
    #[serde(rename = "comments", alias = "comment")]
    pub comment: u64,
    #[serde(rename = "delimiters", alias = "delimiter")]
    pub delimiter: u64,
}

impl ClassHistogram {
    /// Count one more line of `class`.
    pub fn record(&mut self, class: LineClass) {
        *self.slot_mut(class) += 1;
    }

    /// Number of lines recorded for `class`.
    pub fn get(&self, class: LineClass) -> u64 {
        match class {
            LineClass::Default => self.default,
            LineClass::Blank => self.blank,
            LineClass::Import => self.import,
            LineClass::Comment => self.comment,
            LineClass::Delimiter => self.delimiter,
        }
    }

    /// Sum over every class.
    pub fn total(&self) -> u64 {
        LineClass::ALL.iter().map(|c| self.get(*c)).sum()
    }

    fn slot_mut(&mut self, class: LineClass) -> &mut u64 {
        match class {
            LineClass::Default => &mut self.default,
            LineClass::Blank => &mut self.blank,
            LineClass::Import => &mut self.import,
            LineClass::Comment => &mut self.comment,
            LineClass::Delimiter => &mut self.delimiter,
        }
    }
}

impl Add for ClassHistogram {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            default: self.default + rhs.default,
            blank: self.blank + rhs.blank,
            import: self.import + rhs.import,
            comment: self.comment + rhs.comment,
            delimiter: self.delimiter + rhs.delimiter,
        }
    }
}

impl AddAssign for ClassHistogram {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Addition and deletion histograms of one changed file, or of a whole change
/// set once summed.
///
/// [`FileStat::default`] is the zero identity, so summing an empty iterator
/// yields all zeros.
///
/// # Examples
///
/// ```
/// use prsize_core::{FileStat, LineClass};
///
/// let mut a = FileStat::default();
/// a.additions.record(LineClass::Default);
/// let mut b = FileStat::default();
/// b.deletions.record(LineClass::Blank);
///
/// let total: FileStat = [a, b].into_iter().sum();
/// assert_eq!(total.additions.default, 1);
/// assert_eq!(total.deletions.blank, 1);
///
/// let empty: FileStat = std::iter::empty::<FileStat>().sum();
/// assert_eq!(empty, FileStat::default());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub additions: ClassHistogram,
    pub deletions: ClassHistogram,
}

impl FileStat {
    /// Additions plus deletions of `class`.
    pub fn both(&self, class: LineClass) -> u64 {
        self.additions.get(class) + self.deletions.get(class)
    }
}

impl Add for FileStat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            additions: self.additions + rhs.additions,
            deletions: self.deletions + rhs.deletions,
        }
    }
}

impl Sum for FileStat {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(FileStat::default(), Add::add)
    }
}

impl<'a> Sum<&'a FileStat> for FileStat {
    fn sum<I: Iterator<Item = &'a FileStat>>(iter: I) -> Self {
        iter.fold(FileStat::default(), |acc, s| acc + *s)
    }
}

/// A size label and the largest change count it covers.
///
/// A label without `max_changes` is unbounded and catches everything above
/// the other thresholds.
///
/// # Examples
///
/// ```
/// use prsize_core::Label;
///
/// let small = Label::bounded("Small", 64);
/// assert!(small.covers(64));
/// assert!(!small.covers(65));
/// assert!(Label::unbounded("Huge").covers(u64::MAX));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub name: String,
    #[serde(default, alias = "max_changes", skip_serializing_if = "Option::is_none")]
    pub max_changes: Option<u64>,
}

impl Label {
    pub fn bounded(name: impl Into<String>, max_changes: u64) -> Self {
        Self {
            name: name.into(),
            max_changes: Some(max_changes),
        }
    }

    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_changes: None,
        }
    }

    /// Whether a change count falls under this label's bound (inclusive).
    pub fn covers(&self, changes: u64) -> bool {
        self.max_changes.map_or(true, |max| max >= changes)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_changes {
            Some(max) => write!(f, "{} (<= {max})", self.name),
            None => write!(f, "{} (unbounded)", self.name),
        }
    }
}

/// Output format for CLI results.
///
/// # Examples
///
/// ```
/// use prsize_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown comment body.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
