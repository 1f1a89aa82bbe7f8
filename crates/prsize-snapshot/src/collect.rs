//! Concurrent per-file measurement.

use std::sync::Arc;

use prsize_core::{FileSnapshot, FileStat, PrsizeError};
use prsize_difflens::classify::ClassifyOptions;
use prsize_difflens::parser::{ChangedFile, FileStatus};
use prsize_difflens::stats::build_file_stat;
use prsize_difflens::syntax::SyntaxProvider;
use tokio::sync::Semaphore;

use crate::source::{Revision, SnapshotSource};

/// Default number of files measured at once.
pub const DEFAULT_JOBS: usize = 8;

/// Which revisions to read and how to classify.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Revision holding the old side of every file.
    pub base: Revision,
    /// Revision holding the new side of every file.
    pub head: Revision,
    /// Upper bound on files measured concurrently. Zero is treated as one.
    pub jobs: usize,
    pub classify: ClassifyOptions,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            base: Revision::Commit("HEAD".into()),
            head: Revision::Worktree,
            jobs: DEFAULT_JOBS,
            classify: ClassifyOptions::default(),
        }
    }
}

/// Outcome of measuring one file.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: String,
    pub result: Result<FileStat, PrsizeError>,
}

/// Fetch both sides of `file` and build its stats.
///
/// Files with an empty patch (binary changes, pure renames) are not fetched.
/// The old side of an added file and the new side of a removed file are
/// not-found without asking the source. A renamed file's old side is read
/// from its previous path.
///
/// # Errors
///
/// Returns the source's error if a snapshot cannot be read, or
/// [`PrsizeError::MalformedHunkHeader`] if the patch does not parse.
///
/// # Examples
///
/// ```
/// use prsize_difflens::parser::split_unified_diff;
/// use prsize_difflens::syntax::SyntaxProvider;
/// use prsize_snapshot::collect::{measure_file, CollectOptions};
/// use prsize_snapshot::source::NoSnapshots;
///
/// let diff = "--- a/app.ts\n+++ b/app.ts\n@@ -1 +1,2 @@\n-a();\n+\n+b();\n";
/// let file = &split_unified_diff(diff).unwrap()[0];
/// let stat = measure_file(&NoSnapshots, &SyntaxProvider::new(), file, &CollectOptions::default()).unwrap();
/// assert_eq!(stat.additions.default, 2);
/// assert_eq!(stat.deletions.default, 1);
/// ```
pub fn measure_file(
    source: &dyn SnapshotSource,
    provider: &SyntaxProvider,
    file: &ChangedFile,
    options: &CollectOptions,
) -> Result<FileStat, PrsizeError> {
    if file.patch.is_empty() {
        return Ok(FileStat::default());
    }

    let old = match file.status {
        FileStatus::Added => FileSnapshot::not_found(file.old_path()),
        _ => source.fetch(file.old_path(), &options.base)?,
    };
    let new = match file.status {
        FileStatus::Removed => FileSnapshot::not_found(file.path.as_str()),
        _ => source.fetch(&file.path, &options.head)?,
    };

    build_file_stat(provider, &file.patch, &old, &new, options.classify)
}

/// Measure every file, at most `options.jobs` at a time.
///
/// Each file's fetch and build runs on the blocking pool. Outcomes come back
/// in the order of `files`; a failed file carries its error and does not stop
/// the others.
///
/// # Errors
///
/// Returns [`PrsizeError::Task`] if a measuring task panics or is cancelled.
pub async fn collect_file_stats(
    source: Arc<dyn SnapshotSource>,
    provider: Arc<SyntaxProvider>,
    files: Vec<ChangedFile>,
    options: CollectOptions,
) -> Result<Vec<FileOutcome>, PrsizeError> {
    let semaphore = Arc::new(Semaphore::new(options.jobs.max(1)));
    let options = Arc::new(options);

    let handles: Vec<_> = files
        .into_iter()
        .map(|file| {
            let semaphore = Arc::clone(&semaphore);
            let source = Arc::clone(&source);
            let provider = Arc::clone(&provider);
            let options = Arc::clone(&options);
            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| PrsizeError::Task(e.to_string()))?;
                tokio::task::spawn_blocking(move || {
                    let result = measure_file(source.as_ref(), &provider, &file, &options);
                    if let Err(e) = &result {
                        tracing::warn!(path = %file.path, error = %e, "file not measured");
                    }
                    FileOutcome {
                        path: file.path,
                        result,
                    }
                })
                .await
                .map_err(|e| PrsizeError::Task(e.to_string()))
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle
            .await
            .map_err(|e| PrsizeError::Task(e.to_string()))??;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
