//! Snapshot sources: where file contents at a revision come from.

use std::fmt;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, ObjectType, Repository};
use prsize_core::{FileSnapshot, PrsizeError};

/// Which version of the tree to read a file from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// Any revision git can resolve to a tree (`HEAD`, `main~1`, a SHA).
    Commit(String),
    /// The files currently on disk.
    Worktree,
}

impl Revision {
    /// `None` means the working tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsize_snapshot::source::Revision;
    ///
    /// assert_eq!(Revision::from_arg(None), Revision::Worktree);
    /// assert_eq!(Revision::from_arg(Some("HEAD")), Revision::Commit("HEAD".into()));
    /// ```
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some(spec) => Revision::Commit(spec.to_string()),
            None => Revision::Worktree,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Commit(spec) => write!(f, "{spec}"),
            Revision::Worktree => write!(f, "working tree"),
        }
    }
}

/// Retrieves file contents at a revision.
///
/// A file missing at the revision is a [`FileSnapshot::not_found`] value, not
/// an error. Errors are reserved for a source that cannot be read at all.
pub trait SnapshotSource: Send + Sync {
    /// Fetch `path` as it exists at `rev`.
    ///
    /// # Errors
    ///
    /// Returns an error if the revision cannot be resolved or the storage
    /// cannot be read.
    fn fetch(&self, path: &str, rev: &Revision) -> Result<FileSnapshot, PrsizeError>;
}

/// A source with no content. Every file is not found, so every changed line
/// counts as default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshots;

impl SnapshotSource for NoSnapshots {
    fn fetch(&self, path: &str, _rev: &Revision) -> Result<FileSnapshot, PrsizeError> {
        Ok(FileSnapshot::not_found(path))
    }
}

/// Reads committed files from git objects and uncommitted ones from the
/// working tree.
///
/// # Examples
///
/// ```no_run
/// use prsize_snapshot::source::{GitSnapshotSource, Revision, SnapshotSource};
/// use std::path::Path;
///
/// let source = GitSnapshotSource::discover(Path::new(".")).unwrap();
/// let old = source.fetch("src/main.rs", &Revision::Commit("HEAD".into())).unwrap();
/// let new = source.fetch("src/main.rs", &Revision::Worktree).unwrap();
/// assert_eq!(old.path, new.path);
/// ```
#[derive(Debug, Clone)]
pub struct GitSnapshotSource {
    git_dir: PathBuf,
    workdir: Option<PathBuf>,
}

impl GitSnapshotSource {
    /// Find the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PrsizeError::Git`] if no repository is found.
    pub fn discover(path: &Path) -> Result<Self, PrsizeError> {
        let repo = Repository::discover(path).map_err(|e| {
            PrsizeError::Git(format!(
                "failed to open repository at {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self {
            git_dir: repo.path().to_path_buf(),
            workdir: repo.workdir().map(Path::to_path_buf),
        })
    }

    /// Check that `rev` can be read before any file is fetched.
    ///
    /// # Errors
    ///
    /// Returns [`PrsizeError::Git`] if a commit revision does not resolve to a
    /// tree, or the working tree is requested from a bare repository.
    pub fn verify(&self, rev: &Revision) -> Result<(), PrsizeError> {
        match rev {
            Revision::Commit(spec) => {
                let repo = self.open()?;
                resolve_tree(&repo, spec).map(|_| ())
            }
            Revision::Worktree => self.workdir().map(|_| ()),
        }
    }

    fn open(&self) -> Result<Repository, PrsizeError> {
        Repository::open(&self.git_dir)
            .map_err(|e| PrsizeError::Git(format!("failed to open repository: {e}")))
    }

    fn workdir(&self) -> Result<&Path, PrsizeError> {
        self.workdir
            .as_deref()
            .ok_or_else(|| PrsizeError::Git("bare repository has no working tree".into()))
    }

    fn fetch_committed(&self, path: &str, spec: &str) -> Result<FileSnapshot, PrsizeError> {
        let repo = self.open()?;
        let tree = resolve_tree(&repo, spec)?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => {
                tracing::debug!(path, rev = spec, "file not in revision");
                return Ok(FileSnapshot::not_found(path));
            }
            Err(e) => {
                return Err(PrsizeError::Git(format!(
                    "failed to look up {path} at {spec}: {e}"
                )))
            }
        };

        if entry.kind() != Some(ObjectType::Blob) {
            tracing::debug!(path, rev = spec, "path is not a file in revision");
            return Ok(FileSnapshot::not_found(path));
        }

        let blob = repo
            .find_blob(entry.id())
            .map_err(|e| PrsizeError::Git(format!("failed to read {path} at {spec}: {e}")))?;
        let content = String::from_utf8_lossy(blob.content()).into_owned();
        Ok(FileSnapshot::new(path, content))
    }

    fn fetch_worktree(&self, path: &str) -> Result<FileSnapshot, PrsizeError> {
        let full = self.workdir()?.join(path);
        match std::fs::read(&full) {
            Ok(bytes) => Ok(FileSnapshot::new(
                path,
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path, "file not in working tree");
                Ok(FileSnapshot::not_found(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl SnapshotSource for GitSnapshotSource {
    fn fetch(&self, path: &str, rev: &Revision) -> Result<FileSnapshot, PrsizeError> {
        match rev {
            Revision::Commit(spec) => self.fetch_committed(path, spec),
            Revision::Worktree => self.fetch_worktree(path),
        }
    }
}

fn resolve_tree<'r>(repo: &'r Repository, spec: &str) -> Result<git2::Tree<'r>, PrsizeError> {
    repo.revparse_single(spec)
        .and_then(|object| object.peel_to_tree())
        .map_err(|e| PrsizeError::Git(format!("failed to resolve revision '{spec}': {e}")))
}
