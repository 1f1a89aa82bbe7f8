//! Per-file addition/deletion histograms.

use prsize_core::{ClassHistogram, FileSnapshot, FileStat, LineClass, PrsizeError};

use crate::classify::{classify_line, ClassifyOptions};
use crate::hunk::{parse_hunks, LineKind};
use crate::syntax::{SyntaxProvider, SyntaxTree};

/// One version of the file, split into lines and parsed on demand.
struct Side<'a> {
    snapshot: &'a FileSnapshot,
    lines: Vec<&'a str>,
    tree: Option<SyntaxTree<'a>>,
}

impl<'a> Side<'a> {
    fn new(provider: &'a SyntaxProvider, snapshot: &'a FileSnapshot, needed: bool) -> Self {
        let parse = needed && snapshot.found;
        Self {
            snapshot,
            lines: if parse {
                snapshot.content.split('\n').collect()
            } else {
                Vec::new()
            },
            tree: if parse {
                provider.parse_snapshot(snapshot)
            } else {
                None
            },
        }
    }

    fn classify(&self, row: Option<u32>, options: ClassifyOptions) -> LineClass {
        if !self.snapshot.found {
            return LineClass::Default;
        }
        let Some(row) = row else {
            return LineClass::Default;
        };
        let text = row
            .checked_sub(1)
            .and_then(|i| self.lines.get(i as usize));
        match text {
            Some(text) => classify_line(text, self.tree.as_ref(), row, options),
            None => {
                tracing::warn!(
                    path = %self.snapshot.path,
                    row,
                    lines = self.lines.len(),
                    "changed row is outside the file snapshot, counting it as default"
                );
                LineClass::Default
            }
        }
    }
}

/// Build the addition/deletion histograms of one changed file.
///
/// Removals are classified against `old`, additions against `new`. A side
/// whose snapshot was not found counts every one of its changed lines as
/// default. Context lines are not counted. An empty patch yields an all-zero
/// stat.
///
/// # Errors
///
/// Returns [`PrsizeError::MalformedHunkHeader`] if the patch contains a hunk
/// header that does not parse.
///
/// # Examples
///
/// ```
/// use prsize_core::FileSnapshot;
/// use prsize_difflens::classify::ClassifyOptions;
/// use prsize_difflens::stats::build_file_stat;
/// use prsize_difflens::syntax::SyntaxProvider;
///
/// let provider = SyntaxProvider::new();
/// let old = FileSnapshot::new("app.ts", "foo();\nbar();");
/// let new = FileSnapshot::new("app.ts", "import x from \"y\";\n\nbar();");
/// let patch = "@@ -1,2 +1,3 @@\n-foo();\n+import x from \"y\";\n+\n bar();";
///
/// let stat = build_file_stat(&provider, patch, &old, &new, ClassifyOptions::default()).unwrap();
/// assert_eq!(stat.deletions.default, 1);
/// assert_eq!(stat.additions.import, 1);
/// assert_eq!(stat.additions.blank, 1);
/// ```
pub fn build_file_stat(
    provider: &SyntaxProvider,
    patch: &str,
    old: &FileSnapshot,
    new: &FileSnapshot,
    options: ClassifyOptions,
) -> Result<FileStat, PrsizeError> {
    let events = parse_hunks(patch)?;
    if events.is_empty() {
        return Ok(FileStat::default());
    }

    let has_removals = events.iter().any(|e| e.kind == LineKind::Removed);
    let has_additions = events.iter().any(|e| e.kind == LineKind::Added);
    let old_side = Side::new(provider, old, has_removals);
    let new_side = Side::new(provider, new, has_additions);

    let mut additions = ClassHistogram::default();
    let mut deletions = ClassHistogram::default();

    for event in &events {
        match event.kind {
            LineKind::Removed => deletions.record(old_side.classify(event.old_row, options)),
            LineKind::Added => additions.record(new_side.classify(event.new_row, options)),
            LineKind::Context => {}
        }
    }

    tracing::debug!(
        path = %new.path,
        added = additions.total(),
        removed = deletions.total(),
        "file measured"
    );

    Ok(FileStat {
        additions,
        deletions,
    })
}
