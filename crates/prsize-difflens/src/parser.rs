use std::fmt;

use prsize_core::PrsizeError;
use serde::Serialize;

use crate::hunk::parse_hunk_header;

/// How a file changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Renamed => write!(f, "renamed"),
        }
    }
}

/// One file of a multi-file unified diff, with its hunk body kept verbatim.
///
/// # Examples
///
/// ```
/// use prsize_difflens::parser::split_unified_diff;
///
/// let diff = "diff --git a/hello.rs b/hello.rs\n\
///             --- a/hello.rs\n\
///             +++ b/hello.rs\n\
///             @@ -1,3 +1,4 @@\n\
///              fn main() {\n\
///             +    println!(\"hello\");\n\
///              }\n";
/// let files = split_unified_diff(diff).unwrap();
/// assert_eq!(files.len(), 1);
/// assert!(files[0].patch.starts_with("@@ -1,3 +1,4 @@"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Path in the new version (the old path for removed files).
    pub path: String,
    /// Path in the old version when the file was renamed.
    pub previous_path: Option<String>,
    pub status: FileStatus,
    /// Git reported a binary change; the patch is empty.
    pub binary: bool,
    /// Hunk headers and body lines, without file headers.
    pub patch: String,
}

impl ChangedFile {
    /// Path to read the old version from.
    pub fn old_path(&self) -> &str {
        self.previous_path.as_deref().unwrap_or(&self.path)
    }
}

impl fmt::Display for ChangedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.previous_path {
            Some(prev) => write!(f, "{prev} -> {} ({})", self.path, self.status),
            None => write!(f, "{} ({})", self.path, self.status),
        }
    }
}

#[derive(Default)]
struct Pending {
    old_path: Option<String>,
    new_path: Option<String>,
    rename_from: Option<String>,
    rename_to: Option<String>,
    is_new: bool,
    is_deleted: bool,
    binary: bool,
    patch: Vec<String>,
    /// Lines still owed to the current hunk; `None` when its header did not parse.
    remaining: Option<(u32, u32)>,
    in_body: bool,
}

impl Pending {
    fn from_git_header(line: &str) -> Self {
        let mut pending = Pending::default();
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some((old, new)) = rest.rsplit_once(" b/") {
                pending.old_path = Some(parse_path(old));
                pending.new_path = Some(new.trim_matches('"').to_string());
            }
        }
        pending
    }

    fn body_open(&self) -> bool {
        match self.remaining {
            Some((old, new)) => old > 0 || new > 0,
            None => self.in_body,
        }
    }

    fn push_body(&mut self, line: &str) {
        if let Some((old, new)) = self.remaining.as_mut() {
            match line.as_bytes().first() {
                Some(b'-') => *old = old.saturating_sub(1),
                Some(b'+') => *new = new.saturating_sub(1),
                Some(b'\\') => {}
                _ => {
                    *old = old.saturating_sub(1);
                    *new = new.saturating_sub(1);
                }
            }
        }
        self.patch.push(line.to_string());
    }

    fn finish(self) -> Option<ChangedFile> {
        let old_path = self.rename_from.or(self.old_path).filter(|p| p != "/dev/null");
        let new_path = self.rename_to.or(self.new_path).filter(|p| p != "/dev/null");

        let status = if self.is_new || old_path.is_none() {
            FileStatus::Added
        } else if self.is_deleted || new_path.is_none() {
            FileStatus::Removed
        } else if old_path != new_path {
            FileStatus::Renamed
        } else {
            FileStatus::Modified
        };

        let path = match status {
            FileStatus::Removed => old_path.clone()?,
            _ => new_path?,
        };
        let previous_path = match status {
            FileStatus::Renamed => old_path,
            _ => None,
        };

        Some(ChangedFile {
            path,
            previous_path,
            status,
            binary: self.binary,
            patch: self.patch.join("\n"),
        })
    }
}

/// Split a unified diff (as produced by `git diff`) into per-file
/// [`ChangedFile`] entries.
///
/// Each file keeps its hunk headers and body verbatim so that the hunk cursor
/// sees exactly what a code host would serve as the file's patch. Binary files
/// and pure renames are kept with an empty patch. A hunk header that does not
/// parse is kept as-is; measuring that file will report it.
///
/// # Errors
///
/// Returns [`PrsizeError::Parse`] if a file section has no usable path.
///
/// # Examples
///
/// ```
/// use prsize_difflens::parser::split_unified_diff;
///
/// let files = split_unified_diff("").unwrap();
/// assert!(files.is_empty());
/// ```
pub fn split_unified_diff(input: &str) -> Result<Vec<ChangedFile>, PrsizeError> {
    let mut files: Vec<ChangedFile> = Vec::new();
    let mut current: Option<Pending> = None;

    let mut lines = input.lines().peekable();
    while let Some(line) = lines.next() {
        if line.starts_with("diff --git ") {
            flush(&mut current, &mut files)?;
            current = Some(Pending::from_git_header(line));
            continue;
        }

        if let Some(file) = current.as_mut() {
            if line.starts_with("@@") {
                file.remaining = parse_hunk_header(line)
                    .ok()
                    .map(|h| (h.old_lines, h.new_lines));
                file.in_body = true;
                file.patch.push(line.to_string());
                continue;
            }

            let next_file = file.remaining.is_none()
                && line.starts_with("--- ")
                && lines.peek().map_or(false, |next| next.starts_with("+++ "));
            if file.in_body && !next_file && (line.starts_with('\\') || file.body_open()) {
                file.push_body(line);
                continue;
            }
        }

        // Implicitly start a file for patches that lack the "diff --git" line,
        // or when a new "---" header follows a finished hunk.
        if line.starts_with("--- ") && current.as_ref().map_or(true, |f| f.in_body) {
            flush(&mut current, &mut files)?;
            current = Some(Pending::default());
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if let Some(path) = line.strip_prefix("--- ") {
            file.old_path = Some(parse_path(path));
        } else if let Some(path) = line.strip_prefix("+++ ") {
            file.new_path = Some(parse_path(path));
        } else if line.starts_with("new file mode") {
            file.is_new = true;
        } else if line.starts_with("deleted file mode") {
            file.is_deleted = true;
        } else if let Some(from) = line.strip_prefix("rename from ") {
            file.rename_from = Some(from.trim_matches('"').to_string());
        } else if let Some(to) = line.strip_prefix("rename to ") {
            file.rename_to = Some(to.trim_matches('"').to_string());
        } else if (line.starts_with("Binary files ") && line.ends_with(" differ"))
            || line == "GIT binary patch"
        {
            file.binary = true;
        }
    }

    flush(&mut current, &mut files)?;
    Ok(files)
}

fn flush(current: &mut Option<Pending>, files: &mut Vec<ChangedFile>) -> Result<(), PrsizeError> {
    if let Some(pending) = current.take() {
        let file = pending
            .finish()
            .ok_or_else(|| PrsizeError::Parse("diff section without file path".into()))?;
        if file.binary {
            tracing::debug!(path = %file.path, "binary file, nothing to classify");
        }
        files.push(file);
    }
    Ok(())
}

fn parse_path(raw: &str) -> String {
    // Plain `diff -u` appends a tab and a timestamp.
    let raw = raw.split('\t').next().unwrap_or(raw);
    let normalized = raw.trim_matches('"');

    if normalized == "/dev/null" {
        return normalized.to_string();
    }

    normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunk::parse_hunks;

    #[test]
    fn empty_diff_returns_empty_vec() {
        assert!(split_unified_diff("").unwrap().is_empty());
    }

    #[test]
    fn single_file_keeps_hunk_body() {
        let diff = "\
diff --git a/src/main.rs b/src/main.rs
index abc1234..def5678 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@
 fn main() {
+    println!(\"hello\");
     let x = 1;
 }
";
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "src/main.rs");
        assert_eq!(files[0].status, FileStatus::Modified);
        assert_eq!(
            files[0].patch,
            "@@ -1,3 +1,4 @@\n fn main() {\n+    println!(\"hello\");\n     let x = 1;\n }"
        );
    }

    #[test]
    fn removal_of_line_starting_with_dashes_stays_in_body() {
        let diff = "\
diff --git a/notes.sql b/notes.sql
--- a/notes.sql
+++ b/notes.sql
@@ -1,2 +1,1 @@
--- a sql comment
 select 1;
";
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "notes.sql");
        let events = parse_hunks(&files[0].patch).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn multiple_files() {
        let diff = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1 +1,2 @@
 line1
+line2
diff --git a/b.rs b/b.rs
--- a/b.rs
+++ b/b.rs
@@ -1 +1,2 @@
 line1
+line2
";
        let files = split_unified_diff(diff).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b.rs"]);
        assert_eq!(files[0].patch, "@@ -1 +1,2 @@\n line1\n+line2");
    }

    #[test]
    fn new_and_deleted_files() {
        let diff = "\
diff --git a/new.rs b/new.rs
new file mode 100644
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,2 @@
+fn hello() {
+}
diff --git a/old.rs b/old.rs
deleted file mode 100644
--- a/old.rs
+++ /dev/null
@@ -1,2 +0,0 @@
-fn goodbye() {
-}
";
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files[0].path, "new.rs");
        assert_eq!(files[0].status, FileStatus::Added);
        assert_eq!(files[1].path, "old.rs");
        assert_eq!(files[1].status, FileStatus::Removed);
        assert_eq!(files[1].old_path(), "old.rs");
    }

    #[test]
    fn pure_rename_has_empty_patch() {
        let diff = "\
diff --git a/old_name.rs b/new_name.rs
similarity index 100%
rename from old_name.rs
rename to new_name.rs
";
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].status, FileStatus::Renamed);
        assert_eq!(files[0].path, "new_name.rs");
        assert_eq!(files[0].old_path(), "old_name.rs");
        assert!(files[0].patch.is_empty());
    }

    #[test]
    fn rename_with_edits() {
        let diff = "\
diff --git a/lib/old.ts b/lib/new.ts
similarity index 90%
rename from lib/old.ts
rename to lib/new.ts
--- a/lib/old.ts
+++ b/lib/new.ts
@@ -1,1 +1,1 @@
-a
+b
";
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files[0].previous_path.as_deref(), Some("lib/old.ts"));
        assert_eq!(files[0].path, "lib/new.ts");
        assert_eq!(files[0].patch, "@@ -1,1 +1,1 @@\n-a\n+b");
    }

    #[test]
    fn binary_files_have_empty_patch() {
        let diff = "\
diff --git a/image.png b/image.png
Binary files a/image.png and b/image.png differ
diff --git a/code.rs b/code.rs
--- a/code.rs
+++ b/code.rs
@@ -1 +1,2 @@
 line1
+line2
";
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].binary);
        assert!(files[0].patch.is_empty());
        assert_eq!(files[1].path, "code.rs");
    }

    #[test]
    fn no_newline_marker_is_kept() {
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ -1 +1 @@
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].patch.contains("\\ No newline"));
        assert_eq!(parse_hunks(&files[0].patch).unwrap().len(), 2);
    }

    #[test]
    fn plain_diff_without_git_header() {
        let diff = "\
--- a/one.txt\t2024-01-01 00:00:00
+++ b/one.txt\t2024-01-01 00:00:01
@@ -1 +1 @@
-x
+y
--- a/two.txt
+++ b/two.txt
@@ -1 +1 @@
-p
+q
";
        let files = split_unified_diff(diff).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["one.txt", "two.txt"]);
        assert_eq!(files[1].patch, "@@ -1 +1 @@\n-p\n+q");
    }

    #[test]
    fn bad_hunk_header_does_not_swallow_next_plain_file() {
        let diff = "\
--- a/a.ts
+++ b/a.ts
@@ -x +1 @@
+a
--- a/b.ts
+++ b/b.ts
@@ -1 +1 @@
-b
+c
";
        let files = split_unified_diff(diff).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.ts", "b.ts"]);
        assert_eq!(files[0].patch, "@@ -x +1 @@\n+a");
        assert!(parse_hunks(&files[0].patch).is_err());
        assert_eq!(files[1].patch, "@@ -1 +1 @@\n-b\n+c");
    }

    #[test]
    fn bad_hunk_header_keeps_dashed_body_lines() {
        let diff = "\
--- a/a.sql
+++ b/a.sql
@@ -one +1 @@
--- comment
-select 1;
";
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].patch, "@@ -one +1 @@\n--- comment\n-select 1;");
    }

    #[test]
    fn quoted_paths() {
        assert_eq!(parse_path("\"a/src/my file.rs\""), "src/my file.rs");
        assert_eq!(parse_path("b/src/x.rs"), "src/x.rs");
        assert_eq!(parse_path("/dev/null"), "/dev/null");
    }

    #[test]
    fn fixture_splits_into_measurable_patches() {
        let diff = include_str!("../tests/fixtures/simple.diff");
        let files = split_unified_diff(diff).unwrap();
        assert_eq!(files.len(), 3);
        for file in &files {
            parse_hunks(&file.patch).unwrap();
        }
    }
}
