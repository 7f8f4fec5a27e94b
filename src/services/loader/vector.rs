use async_trait::async_trait;

use super::DatasetPersister;
use crate::error::PersistError;
use crate::models::{ChatDataset, MessagePayload};
use crate::services::documents::{DocumentStore, EmbeddedDocumentStore};
use crate::services::vector_store::Distance;

/// Persists clean messages into a vector store collection.
pub struct VectorStorePersister<S = EmbeddedDocumentStore> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> VectorStorePersister<S> {
    pub fn new(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create the collection, sized for the embedding model, if it is missing.
    async fn ensure_collection(&self) -> Result<(), PersistError> {
        if self.store.collection_exists(&self.collection).await? {
            return Ok(());
        }

        let vector_size = self.store.embedding_size().await?;
        tracing::info!(
            collection = %self.collection,
            vector_size,
            "Collection does not exist. Creating a new collection."
        );
        self.store
            .create_collection(&self.collection, vector_size, Distance::Cosine)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore> DatasetPersister for VectorStorePersister<S> {
    async fn persist(&mut self, dataset: ChatDataset) -> Result<(), PersistError> {
        self.ensure_collection().await?;

        let (documents, payloads): (Vec<String>, Vec<MessagePayload>) = dataset
            .clean_messages()
            .map(|msg| (msg.rich_content().to_string(), MessagePayload::from(msg)))
            .unzip();
        let uploaded = documents.len();

        self.store
            .upload_documents(&self.collection, documents, payloads, true)
            .await?;

        tracing::info!(
            collection = %self.collection,
            messages = dataset.total_messages(),
            uploaded,
            "Loaded messages into collection."
        );
        Ok(())
    }
}
