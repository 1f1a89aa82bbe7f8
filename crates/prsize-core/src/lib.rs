//! Core types, configuration, and error handling for prsize.
//!
//! This crate provides the shared foundation used by the other prsize crates:
//! - [`PrsizeError`]: unified error type using `thiserror`
//! - [`PrsizeConfig`]: configuration loaded from `.prsize.toml`
//! - Shared types: [`LineClass`], [`ClassHistogram`], [`FileStat`], [`Label`],
//!   [`FileSnapshot`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{ClassifyConfig, ExcludeConfig, LineExclusions, PrsizeConfig};
pub use error::PrsizeError;
pub use types::{ClassHistogram, FileSnapshot, FileStat, Label, LineClass, OutputFormat};

/// A convenience `Result` type for prsize operations.
pub type Result<T> = std::result::Result<T, PrsizeError>;
