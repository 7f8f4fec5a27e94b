//! Vector store abstraction layer.
//!
//! This module provides a trait-based abstraction over the vector store backends
//! (a Qdrant server, or on-disk collections in local mode) selected by the
//! resolved [`Connection`].

mod local;
mod qdrant;

pub use local::LocalBackend;
pub use qdrant::QdrantBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VectorStoreError;
use crate::models::{Connection, MessagePayload, SearchHit};

/// Similarity metric of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Distance::Cosine => write!(f, "cosine"),
            Distance::Dot => write!(f, "dot"),
            Distance::Euclid => write!(f, "euclid"),
        }
    }
}

/// One embedded message ready for upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: MessagePayload,
}

/// Operations every vector store backend provides.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError>;

    /// Create a collection. Fails if it already exists.
    async fn create_collection(
        &self,
        collection: &str,
        vector_size: u64,
        distance: Distance,
    ) -> Result<(), VectorStoreError>;

    /// Insert points; with `wait` the call returns once they are persisted.
    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<Point>,
        wait: bool,
    ) -> Result<(), VectorStoreError>;

    /// Nearest neighbours of `vector`, best first, optionally restricted to
    /// one sender.
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        sender: Option<&str>,
    ) -> Result<Vec<SearchHit>, VectorStoreError>;

    /// Number of points in a collection.
    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError>;
}

/// Create a vector store backend for a resolved connection.
pub fn create_backend(connection: &Connection) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    match connection {
        Connection::Local(path) => Ok(Box::new(LocalBackend::new(path))),
        Connection::Remote { api_key, .. } => {
            // Remote connections always have a URL.
            let url = connection.url().unwrap_or_default();
            let backend = QdrantBackend::new(&url, api_key.as_deref())?;
            Ok(Box::new(backend))
        }
    }
}
