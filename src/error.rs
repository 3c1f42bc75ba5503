// src/error.rs
use thiserror::Error;

use crate::utils::chunked::ChunkError;

/// Errors surfaced by the duplicate detection engine.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Unknown deduplication field group: {0}")]
    UnknownFieldGroup(String),

    #[error("Invalid deduplication configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures coming from the record store, including parameter-limit
/// violations the batching could not prevent.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Query needs {required} bound parameters but the store allows {limit}")]
    ParameterLimit { required: usize, limit: usize },

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkError),
}
