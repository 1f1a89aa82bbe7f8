//! File content retrieval and concurrent per-file measurement.
//!
//! - [`source`]: where old and new file versions come from (git objects,
//!   the working tree, or nowhere)
//! - [`collect`]: bounded fan-out that fetches both versions of every
//!   changed file and builds its stats

pub mod collect;
pub mod source;
