// src/error.rs

//! Crate-wide error types.
//!
//! Engine entry points report problems inside their result/report values;
//! this enum covers the startup and I/O paths that are genuinely fatal.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Catalog failed load-time integrity checks
    #[error(transparent)]
    Catalog(#[from] crate::catalog::CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON input: {0}")]
    Json(#[from] serde_json::Error),
}
