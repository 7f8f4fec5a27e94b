//! Error types for the WhatsApp vector loader.

use std::path::PathBuf;

use thiserror::Error;

/// A single export line that could not be turned into a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid row: {reason}")]
pub struct RowError {
    /// The offending line, verbatim.
    pub row: String,
    /// Human-readable reason.
    pub reason: String,
}

impl RowError {
    pub fn new(row: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to Qdrant: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("local storage error at {path}: {source}")]
    LocalStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt local collection {path}: {source}")]
    LocalFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures reported by the document store (embedding + vector store).
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("{documents} documents but {payloads} payloads")]
    LengthMismatch { documents: usize, payloads: usize },
}

/// Errors raised while persisting one dataset.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("document store error: {0}")]
    Store(#[from] DocumentStoreError),
}

/// Errors raised while loading a list of export files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no parsable messages in {} ({lines} non-blank lines)", .path.display())]
    NoMessages { path: PathBuf, lines: usize },

    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

impl LoadError {
    /// Whether the error concerns one source file as a whole.
    ///
    /// Only these are skipped in non-strict mode; service failures always
    /// propagate.
    pub fn is_file_level(&self) -> bool {
        matches!(self, LoadError::Io { .. } | LoadError::NoMessages { .. })
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("config file {} not found", .0.display())]
    NotFound(PathBuf),
}
