//! Error types for the Loam core

use thiserror::Error;

use crate::document::DocumentError;
use crate::schema::SchemaError;
use crate::value::PathError;

/// Main error type for the crate.
///
/// Library APIs return the module-level enums (`SchemaError`, `PathError`,
/// `DocumentError`); this wrapper is the aggregation point for embedding
/// applications composing schema declaration, document mutation, and
/// persistence in one fallible flow with `?`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("path error: {0}")]
    Path(#[from] PathError),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
