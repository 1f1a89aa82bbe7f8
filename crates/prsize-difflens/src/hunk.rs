//! Hunk coordinate tracking.
//!
//! Walks the hunk body of one file's diff and tags every line as context,
//! addition or removal together with the 1-based row it occupies in the old
//! and/or new version of the file.

use prsize_core::PrsizeError;

/// Role of a hunk body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

/// One hunk body line with the rows it maps to.
///
/// Removals carry only `old_row`, additions only `new_row`, context lines both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEvent {
    pub kind: LineKind,
    pub old_row: Option<u32>,
    pub new_row: Option<u32>,
}

/// Coordinates from a `@@ -a,b +c,d @@` header.
///
/// # Examples
///
/// ```
/// use prsize_difflens::hunk::parse_hunk_header;
///
/// let header = parse_hunk_header("@@ -10,3 +12,5 @@ fn main() {").unwrap();
/// assert_eq!((header.old_start, header.old_lines), (10, 3));
/// assert_eq!((header.new_start, header.new_lines), (12, 5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
}

/// Parse a hunk header line.
///
/// A range prefixed with `-` is the old side and one prefixed with `+` the new
/// side, whichever order they come in. Without any sign the first range is
/// taken as old and the second as new. Ranges are `start` or `start,count`;
/// a bare start means a count of one.
///
/// # Errors
///
/// Returns [`PrsizeError::MalformedHunkHeader`] when the line is not
/// `@@ <range> <range> @@`, a number does not parse, or both ranges carry the
/// same sign.
///
/// # Examples
///
/// ```
/// use prsize_difflens::hunk::parse_hunk_header;
///
/// let swapped = parse_hunk_header("@@ +4,2 -7,1 @@").unwrap();
/// assert_eq!(swapped.old_start, 7);
/// assert_eq!(swapped.new_start, 4);
///
/// let unsigned = parse_hunk_header("@@ 3,1 9,2 @@").unwrap();
/// assert_eq!(unsigned.old_start, 3);
/// assert_eq!(unsigned.new_start, 9);
///
/// assert!(parse_hunk_header("@@ -1,2 @@").is_err());
/// ```
pub fn parse_hunk_header(line: &str) -> Result<HunkHeader, PrsizeError> {
    let malformed = || PrsizeError::MalformedHunkHeader(line.to_string());

    let inner = line
        .strip_prefix("@@ ")
        .and_then(|s| {
            let end = s.find(" @@")?;
            Some(&s[..end])
        })
        .ok_or_else(malformed)?;

    let parts: Vec<&str> = inner.split_whitespace().collect();
    let [first, second] = parts.as_slice() else {
        return Err(malformed());
    };

    let (first_sign, first) = split_sign(first);
    let (second_sign, second) = split_sign(second);

    // Signs decide the sides; unsigned headers read as old-then-new.
    let (old, new) = match (first_sign, second_sign) {
        (Some('+'), Some('+')) | (Some('-'), Some('-')) => return Err(malformed()),
        (Some('+'), _) | (None, Some('-')) => (second, first),
        _ => (first, second),
    };

    let (old_start, old_lines) = parse_range(old).ok_or_else(malformed)?;
    let (new_start, new_lines) = parse_range(new).ok_or_else(malformed)?;

    Ok(HunkHeader {
        old_start,
        old_lines,
        new_start,
        new_lines,
    })
}

fn split_sign(token: &str) -> (Option<char>, &str) {
    match token.chars().next() {
        Some(c @ ('+' | '-')) => (Some(c), &token[1..]),
        _ => (None, token),
    }
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Old/new row cursors fed one hunk body line at a time.
///
/// # Examples
///
/// ```
/// use prsize_difflens::hunk::{HunkCursor, LineKind};
///
/// let mut cursor = HunkCursor::new();
/// assert!(cursor.feed("@@ -5,2 +5,2 @@").unwrap().is_none());
/// let removed = cursor.feed("-old").unwrap().unwrap();
/// assert_eq!(removed.kind, LineKind::Removed);
/// assert_eq!(removed.old_row, Some(5));
/// let added = cursor.feed("+new").unwrap().unwrap();
/// assert_eq!(added.new_row, Some(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HunkCursor {
    rows: Option<(u32, u32)>,
}

impl HunkCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current `(old_row, new_row)`, or `None` before the first header.
    pub fn rows(&self) -> Option<(u32, u32)> {
        self.rows
    }

    /// Advance over one line.
    ///
    /// Headers and `\ No newline at end of file` markers yield `None`; every
    /// other line yields exactly one event.
    ///
    /// # Errors
    ///
    /// Returns [`PrsizeError::MalformedHunkHeader`] for a bad header, for a
    /// body line that appears before any header, or when a row would run past
    /// `u32::MAX`.
    pub fn feed(&mut self, line: &str) -> Result<Option<LineEvent>, PrsizeError> {
        if line.starts_with("@@") {
            let header = parse_hunk_header(line)?;
            self.rows = Some((header.old_start, header.new_start));
            return Ok(None);
        }

        if line.starts_with('\\') {
            return Ok(None);
        }

        let Some((old_row, new_row)) = self.rows.as_mut() else {
            return Err(PrsizeError::MalformedHunkHeader(format!(
                "diff line before any hunk header: {line}"
            )));
        };

        let event = if line.starts_with('-') {
            let event = LineEvent {
                kind: LineKind::Removed,
                old_row: Some(*old_row),
                new_row: None,
            };
            *old_row = advance(*old_row, line)?;
            event
        } else if line.starts_with('+') {
            let event = LineEvent {
                kind: LineKind::Added,
                old_row: None,
                new_row: Some(*new_row),
            };
            *new_row = advance(*new_row, line)?;
            event
        } else {
            let event = LineEvent {
                kind: LineKind::Context,
                old_row: Some(*old_row),
                new_row: Some(*new_row),
            };
            *old_row = advance(*old_row, line)?;
            *new_row = advance(*new_row, line)?;
            event
        };

        Ok(Some(event))
    }
}

/// Next row, failing when the hunk runs past the largest representable row.
fn advance(row: u32, line: &str) -> Result<u32, PrsizeError> {
    row.checked_add(1).ok_or_else(|| {
        PrsizeError::MalformedHunkHeader(format!("hunk runs past row {row} at line: {line}"))
    })
}

/// Run a [`HunkCursor`] over a whole hunk body.
///
/// An empty patch (binary file, pure rename) yields no events.
///
/// # Errors
///
/// Fails on the first malformed header; no partial result is returned.
///
/// # Examples
///
/// ```
/// use prsize_difflens::hunk::{parse_hunks, LineKind};
///
/// let events = parse_hunks("@@ -1,2 +1,2 @@\n-a\n+b\n c").unwrap();
/// let kinds: Vec<LineKind> = events.iter().map(|e| e.kind).collect();
/// assert_eq!(kinds, vec![LineKind::Removed, LineKind::Added, LineKind::Context]);
///
/// assert!(parse_hunks("").unwrap().is_empty());
/// ```
pub fn parse_hunks(patch: &str) -> Result<Vec<LineEvent>, PrsizeError> {
    let mut cursor = HunkCursor::new();
    let mut events = Vec::new();
    for line in patch.lines() {
        if let Some(event) = cursor.feed(line)? {
            events.push(event);
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(events: &[LineEvent], kind: LineKind) -> Vec<u32> {
        events
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| match kind {
                LineKind::Removed => e.old_row.unwrap(),
                _ => e.new_row.unwrap(),
            })
            .collect()
    }

    #[test]
    fn header_with_section_heading() {
        let h = parse_hunk_header("@@ -1,3 +1,4 @@ impl Foo {").unwrap();
        assert_eq!(
            h,
            HunkHeader {
                old_start: 1,
                old_lines: 3,
                new_start: 1,
                new_lines: 4
            }
        );
    }

    #[test]
    fn header_without_counts() {
        let h = parse_hunk_header("@@ -7 +9 @@").unwrap();
        assert_eq!((h.old_start, h.old_lines, h.new_start, h.new_lines), (7, 1, 9, 1));
    }

    #[test]
    fn header_sign_inference() {
        let h = parse_hunk_header("@@ +20,1 -10,1 @@").unwrap();
        assert_eq!((h.old_start, h.new_start), (10, 20));

        let h = parse_hunk_header("@@ 10,1 -20,1 @@").unwrap();
        assert_eq!((h.old_start, h.new_start), (20, 10));

        let h = parse_hunk_header("@@ 10,1 +20,1 @@").unwrap();
        assert_eq!((h.old_start, h.new_start), (10, 20));

        let h = parse_hunk_header("@@ -10,1 20,1 @@").unwrap();
        assert_eq!((h.old_start, h.new_start), (10, 20));
    }

    #[test]
    fn malformed_headers_fail() {
        for line in [
            "@@",
            "@@ -1,2 +1,2",
            "@@ -1,2 +1,2 +3,4 @@",
            "@@ -1,2 -1,2 @@",
            "@@ +1,2 +1,2 @@",
            "@@ -a,2 +1,2 @@",
            "@@ -1,x +1,2 @@",
            "@@@ -1,2 -1,2 +1,3 @@@",
        ] {
            let err = parse_hunk_header(line).unwrap_err();
            assert!(
                matches!(err, PrsizeError::MalformedHunkHeader(_)),
                "{line}: {err}"
            );
        }
    }

    #[test]
    fn malformed_header_fails_whole_patch() {
        let err = parse_hunks("@@ -1,1 +1,1 @@\n-a\n+b\n@@ nonsense @@\n+c").unwrap_err();
        assert!(matches!(err, PrsizeError::MalformedHunkHeader(_)));
    }

    #[test]
    fn body_before_header_fails() {
        assert!(parse_hunks("+orphan").is_err());
    }

    #[test]
    fn cursors_advance_per_side() {
        let patch = "@@ -1,4 +1,5 @@\n ctx\n-gone\n+one\n+two\n ctx\n-also gone\n+three";
        let events = parse_hunks(patch).unwrap();
        assert_eq!(rows(&events, LineKind::Removed), vec![2, 4]);
        assert_eq!(rows(&events, LineKind::Added), vec![2, 3, 5]);
    }

    #[test]
    fn second_header_resets_cursors() {
        let patch = "@@ -1,2 +1,2 @@\n-a\n+b\n@@ -40,1 +41,2 @@\n ctx\n+late";
        let events = parse_hunks(patch).unwrap();
        assert_eq!(rows(&events, LineKind::Removed), vec![1]);
        assert_eq!(rows(&events, LineKind::Added), vec![1, 42]);
    }

    #[test]
    fn rows_never_decrease_within_a_hunk() {
        let patch = "@@ -3,5 +3,5 @@\n a\n-b\n-c\n+d\n e\n+f\n g";
        let events = parse_hunks(patch).unwrap();
        let olds: Vec<u32> = events.iter().filter_map(|e| e.old_row).collect();
        let news: Vec<u32> = events.iter().filter_map(|e| e.new_row).collect();
        assert!(olds.windows(2).all(|w| w[0] < w[1]));
        assert!(news.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn every_body_line_becomes_one_event() {
        let patch = "@@ -1,3 +1,3 @@\n a\n-b\n+c\n d\n\n+e";
        let body_lines = patch.lines().filter(|l| !l.starts_with("@@")).count();
        let events = parse_hunks(patch).unwrap();
        assert_eq!(events.len(), body_lines);
        let context = events.iter().filter(|e| e.kind == LineKind::Context).count();
        let changed = events.len() - context;
        assert_eq!(context + changed, body_lines);
    }

    #[test]
    fn no_newline_marker_moves_nothing() {
        let patch = "@@ -1 +1 @@\n-old\n\\ No newline at end of file\n+new\n\\ No newline at end of file";
        let events = parse_hunks(patch).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].old_row, Some(1));
        assert_eq!(events[1].new_row, Some(1));
    }

    #[test]
    fn empty_patch_has_no_events() {
        assert!(parse_hunks("").unwrap().is_empty());
    }

    #[test]
    fn row_overflow_is_malformed() {
        for patch in [
            "@@ -4294967295,2 +1,1 @@\n-a\n-b",
            "@@ -1,1 +4294967295,2 @@\n+a\n+b",
            "@@ -4294967295,2 +1,2 @@\n a\n b",
        ] {
            let err = parse_hunks(patch).unwrap_err();
            assert!(matches!(err, PrsizeError::MalformedHunkHeader(_)), "{patch}");
        }
    }

    #[test]
    fn rows_near_the_limit_still_count() {
        let events = parse_hunks("@@ -4294967293,2 +1,0 @@\n-a\n-b").unwrap();
        assert_eq!(rows(&events, LineKind::Removed), vec![4294967293, 4294967294]);
    }
}
