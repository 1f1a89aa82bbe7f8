//! Diff line classification and size labelling.
//!
//! Splits unified diffs into per-file hunk bodies, walks hunk coordinates,
//! classifies every changed line as blank, comment, import, delimiter or
//! default code (using tree-sitter where a grammar is available), and turns the
//! weighted change count into a size label.
pub mod aggregate;
pub mod classify;
pub mod filter;
pub mod hunk;
pub mod label;
pub mod parser;
pub mod report;
pub mod stats;
pub mod syntax;
