//! Tree-sitter backed syntax provider.
//!
//! Every supported grammar is loaded once, together with a table that maps each
//! of the grammar's node kinds to the comment or import class. Parsing is a pure
//! function of (language, content); the provider itself is immutable and can be
//! shared across threads.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use prsize_core::FileSnapshot;
use tree_sitter::{Parser, Point, Tree};

/// Programming language detected from file extension.
///
/// # Examples
///
/// ```
/// use prsize_difflens::syntax::Language;
///
/// assert_eq!(Language::from_extension("rs"), Language::Rust);
/// assert_eq!(Language::from_extension("ts"), Language::TypeScript);
/// assert_eq!(Language::from_extension("tsx"), Language::Tsx);
/// assert_eq!(Language::from_extension("kt"), Language::Kotlin);
/// assert_eq!(Language::from_extension("yml"), Language::Unknown);
/// assert_eq!(Language::from_path("web/src/App.tsx"), Language::Tsx);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    Tsx,
    JavaScript,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    Php,
    Kotlin,
    Swift,
    Unknown,
}

impl Language {
    /// Every language with a bundled grammar.
    pub const SUPPORTED: [Language; 13] = [
        Language::Rust,
        Language::Python,
        Language::TypeScript,
        Language::Tsx,
        Language::JavaScript,
        Language::Go,
        Language::Java,
        Language::C,
        Language::Cpp,
        Language::Ruby,
        Language::Php,
        Language::Kotlin,
        Language::Swift,
    ];

    /// Detect language from a file extension string (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "rs" => Language::Rust,
            "py" | "pyi" => Language::Python,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Language::Cpp,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "kt" | "kts" => Language::Kotlin,
            "swift" => Language::Swift,
            _ => Language::Unknown,
        }
    }

    /// Detect language from the extension of a repository path.
    pub fn from_path(path: &str) -> Self {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(Language::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get the tree-sitter language grammar for this language.
    ///
    /// Returns `None` for `Language::Unknown`.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
            Language::C => Some(tree_sitter_c::LANGUAGE.into()),
            Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Language::Ruby => Some(tree_sitter_ruby::LANGUAGE.into()),
            Language::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
            Language::Kotlin => Some(tree_sitter_kotlin_ng::LANGUAGE.into()),
            Language::Swift => Some(tree_sitter_swift::LANGUAGE.into()),
            Language::Unknown => None,
        }
    }

    /// Import-like node kinds whose names do not contain "import".
    fn extra_import_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["use_declaration", "extern_crate_declaration"],
            Language::C | Language::Cpp => &["preproc_include"],
            Language::Php => &["namespace_use_declaration"],
            _ => &[],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Semantic category of a syntax node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Comment,
    Import,
}

/// A loaded grammar plus its node-kind table, indexed by kind id.
struct Grammar {
    language: Language,
    ts_language: tree_sitter::Language,
    kinds: Vec<Option<NodeClass>>,
}

impl Grammar {
    fn load(language: Language) -> Option<Self> {
        let ts_language = language.tree_sitter_language()?;
        let extras = language.extra_import_kinds();
        let kinds = (0..ts_language.node_kind_count())
            .map(|id| {
                u16::try_from(id)
                    .ok()
                    .and_then(|id| ts_language.node_kind_for_id(id))
                    .and_then(|name| kind_class(name, extras))
            })
            .collect();
        Some(Self {
            language,
            ts_language,
            kinds,
        })
    }

    fn class_of(&self, kind_id: u16) -> Option<NodeClass> {
        self.kinds.get(usize::from(kind_id)).copied().flatten()
    }
}

/// Comment wins over import when a kind name mentions both.
fn kind_class(name: &str, extra_imports: &[&str]) -> Option<NodeClass> {
    if name.contains("comment") {
        Some(NodeClass::Comment)
    } else if name.contains("import") || extra_imports.contains(&name) {
        Some(NodeClass::Import)
    } else {
        None
    }
}

/// Loads every bundled grammar once and parses file content on demand.
///
/// # Examples
///
/// ```
/// use prsize_difflens::syntax::{Language, NodeClass, SyntaxProvider};
///
/// let provider = SyntaxProvider::new();
/// let tree = provider
///     .parse(Language::TypeScript, "// hello\nconst x = 1;\n")
///     .unwrap();
/// assert_eq!(tree.class_at(0), Some(NodeClass::Comment));
/// assert_eq!(tree.class_at(1), None);
///
/// assert!(provider.parse(Language::Unknown, "key: value").is_none());
/// ```
pub struct SyntaxProvider {
    grammars: HashMap<Language, Grammar>,
}

impl SyntaxProvider {
    pub fn new() -> Self {
        let grammars = Language::SUPPORTED
            .iter()
            .filter_map(|lang| Grammar::load(*lang).map(|g| (*lang, g)))
            .collect();
        Self { grammars }
    }

    /// Whether a grammar is loaded for `language`.
    pub fn supports(&self, language: Language) -> bool {
        self.grammars.contains_key(&language)
    }

    /// Parse `content` as `language`.
    ///
    /// Returns `None` when the language is unsupported or tree-sitter gives up;
    /// callers treat both as "no syntax information".
    pub fn parse(&self, language: Language, content: &str) -> Option<SyntaxTree<'_>> {
        let grammar = self.grammars.get(&language)?;
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&grammar.ts_language) {
            tracing::warn!(%language, "failed to set language: {e}");
            return None;
        }
        let tree = parser.parse(content, None)?;
        Some(SyntaxTree { tree, grammar })
    }

    /// Parse a snapshot using the language of its own path.
    ///
    /// Not-found snapshots never produce a tree.
    pub fn parse_snapshot(&self, snapshot: &FileSnapshot) -> Option<SyntaxTree<'_>> {
        if !snapshot.found {
            return None;
        }
        self.parse(Language::from_path(&snapshot.path), &snapshot.content)
    }
}

impl Default for SyntaxProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SyntaxProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut languages: Vec<String> = self.grammars.keys().map(|l| l.to_string()).collect();
        languages.sort();
        f.debug_struct("SyntaxProvider")
            .field("languages", &languages)
            .finish()
    }
}

/// A parsed file bound to the grammar that produced it.
pub struct SyntaxTree<'p> {
    tree: Tree,
    grammar: &'p Grammar,
}

impl SyntaxTree<'_> {
    pub fn language(&self) -> Language {
        self.grammar.language
    }

    /// Class of the nearest comment or import node enclosing column 0 of the
    /// 0-based `row`, walking from the smallest covering node up to the root.
    pub fn class_at(&self, row: usize) -> Option<NodeClass> {
        let point = Point::new(row, 0);
        let mut node = self
            .tree
            .root_node()
            .descendant_for_point_range(point, point);
        while let Some(current) = node {
            if let Some(class) = self.grammar.class_of(current.kind_id()) {
                return Some(class);
            }
            node = current.parent();
        }
        None
    }
}
