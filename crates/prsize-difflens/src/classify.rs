//! Per-line semantic classification.

use prsize_core::{ClassifyConfig, LineClass};

use crate::syntax::{NodeClass, SyntaxTree};

/// Switches that change how lines are classified.
///
/// # Examples
///
/// ```
/// use prsize_core::ClassifyConfig;
/// use prsize_difflens::classify::ClassifyOptions;
///
/// let opts = ClassifyOptions::from(ClassifyConfig { delimiters: true });
/// assert!(opts.delimiters);
/// assert!(!ClassifyOptions::default().delimiters);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Put delimiter-only lines in their own class instead of classifying
    /// them like any other line.
    pub delimiters: bool,
}

impl From<ClassifyConfig> for ClassifyOptions {
    fn from(config: ClassifyConfig) -> Self {
        Self {
            delimiters: config.delimiters,
        }
    }
}

/// Whether a line is empty or whitespace only.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Whether a line holds nothing but whitespace and closing punctuation.
///
/// # Examples
///
/// ```
/// use prsize_difflens::classify::is_delimiter_only;
///
/// assert!(is_delimiter_only("  });"));
/// assert!(is_delimiter_only("],"));
/// assert!(!is_delimiter_only("{"));
/// assert!(!is_delimiter_only("x);"));
/// ```
pub fn is_delimiter_only(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_whitespace() || matches!(c, ';' | ',' | ')' | '}' | ']'))
}

/// Classify one line of a file.
///
/// `row` is the 1-based row the hunk cursor reported; it is converted to the
/// 0-based row tree-sitter expects. Blank lines are detected lexically whether
/// or not a tree is available. Without a tree every other line is default.
///
/// # Examples
///
/// ```
/// use prsize_core::LineClass;
/// use prsize_difflens::classify::{classify_line, ClassifyOptions};
/// use prsize_difflens::syntax::{Language, SyntaxProvider};
///
/// let opts = ClassifyOptions::default();
/// assert_eq!(classify_line("   ", None, 1, opts), LineClass::Blank);
/// assert_eq!(classify_line("// hi", None, 1, opts), LineClass::Default);
///
/// let provider = SyntaxProvider::new();
/// let src = "// hi\nlet x = 1;\n";
/// let tree = provider.parse(Language::TypeScript, src).unwrap();
/// assert_eq!(classify_line("// hi", Some(&tree), 1, opts), LineClass::Comment);
/// assert_eq!(classify_line("let x = 1;", Some(&tree), 2, opts), LineClass::Default);
/// ```
pub fn classify_line(
    line: &str,
    tree: Option<&SyntaxTree<'_>>,
    row: u32,
    options: ClassifyOptions,
) -> LineClass {
    if is_blank(line) {
        return LineClass::Blank;
    }

    if options.delimiters && is_delimiter_only(line) {
        return LineClass::Delimiter;
    }

    let Some(tree) = tree else {
        return LineClass::Default;
    };

    let Some(index) = row.checked_sub(1) else {
        return LineClass::Default;
    };

    match tree.class_at(index as usize) {
        Some(NodeClass::Comment) => LineClass::Comment,
        Some(NodeClass::Import) => LineClass::Import,
        None => LineClass::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Language, SyntaxProvider};

    const OPTS: ClassifyOptions = ClassifyOptions { delimiters: false };
    const WITH_DELIMITERS: ClassifyOptions = ClassifyOptions { delimiters: true };

    #[test]
    fn blank_lines_win_regardless_of_tree() {
        let provider = SyntaxProvider::new();
        let src = "/*\n\n*/\n";
        let tree = provider.parse(Language::TypeScript, src).unwrap();
        assert_eq!(classify_line("", Some(&tree), 2, OPTS), LineClass::Blank);
        assert_eq!(classify_line(" \t\r", None, 1, OPTS), LineClass::Blank);
    }

    #[test]
    fn no_tree_means_default() {
        for line in ["import x from 'y';", "// comment", "});", "fn main() {}"] {
            assert_eq!(classify_line(line, None, 1, OPTS), LineClass::Default);
        }
    }

    #[test]
    fn delimiters_only_when_enabled() {
        assert_eq!(classify_line("});", None, 1, OPTS), LineClass::Default);
        assert_eq!(
            classify_line("});", None, 1, WITH_DELIMITERS),
            LineClass::Delimiter
        );
        assert_eq!(
            classify_line("   ", None, 1, WITH_DELIMITERS),
            LineClass::Blank
        );
    }

    #[test]
    fn rows_are_one_based() {
        let provider = SyntaxProvider::new();
        let src = "import a from \"a\";\nconst b = a;\n// tail\n";
        let tree = provider.parse(Language::TypeScript, src).unwrap();
        assert_eq!(
            classify_line("import a from \"a\";", Some(&tree), 1, OPTS),
            LineClass::Import
        );
        assert_eq!(
            classify_line("const b = a;", Some(&tree), 2, OPTS),
            LineClass::Default
        );
        assert_eq!(
            classify_line("// tail", Some(&tree), 3, OPTS),
            LineClass::Comment
        );
    }

    #[test]
    fn multi_line_comment_body_is_comment() {
        let provider = SyntaxProvider::new();
        let src = "/**\n * docs\n */\nexport function f() {}\n";
        let tree = provider.parse(Language::TypeScript, src).unwrap();
        assert_eq!(classify_line(" * docs", Some(&tree), 2, OPTS), LineClass::Comment);
        assert_eq!(
            classify_line("export function f() {}", Some(&tree), 4, OPTS),
            LineClass::Default
        );
    }

    #[test]
    fn multi_line_import_continuation_is_import() {
        let provider = SyntaxProvider::new();
        let src = "import {\n  a,\n  b,\n} from \"m\";\n";
        let tree = provider.parse(Language::TypeScript, src).unwrap();
        for row in 1..=4 {
            assert_eq!(
                classify_line("x", Some(&tree), row, OPTS),
                LineClass::Import,
                "row {row}"
            );
        }
    }

    #[test]
    fn row_zero_is_default() {
        let provider = SyntaxProvider::new();
        let tree = provider.parse(Language::TypeScript, "// c\n").unwrap();
        assert_eq!(classify_line("// c", Some(&tree), 0, OPTS), LineClass::Default);
    }
}
