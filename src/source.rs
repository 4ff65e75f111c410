//! Data source layer.
//!
//! A probe execution asks a [`ScalarSource`] for the single value its query
//! produces, and the [`QueryExecutor`] turns that value into a [`Sample`].
//!
//! # Components
//!
//! - [`ScalarSource`]: Pluggable connection strategy ("execute query, get scalar")
//! - [`MySqlSource`]: Opens and closes one connection per execution
//! - [`PooledMySqlSource`]: Checks connections out of a shared pool
//! - [`QueryExecutor`]: One probe execution with optional deadline and integer parsing
//!
//! [`Sample`]: crate::Sample

mod executor;
pub mod mysql;
mod traits;

pub use executor::QueryExecutor;
pub use mysql::{MySqlSource, PooledMySqlSource};
pub use traits::{ProbeError, ScalarSource};
