pub mod documents;
pub mod embedding;
pub mod loader;
pub mod vector_store;

pub use documents::{DocumentStore, EmbeddedDocumentStore};
pub use embedding::{Embedder, EmbeddingClient, known_dimension};
pub use loader::{
    DataLoader, DatasetPersister, InMemoryPersister, LoadReport, SkippedFile,
    VectorStorePersister,
};
pub use vector_store::{Distance, LocalBackend, Point, QdrantBackend, VectorStore, create_backend};
