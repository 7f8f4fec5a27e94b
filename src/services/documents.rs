//! Document-level vector store service.
//!
//! Callers hand over text and payloads; embedding happens behind this seam.

use async_trait::async_trait;
use uuid::Uuid;

use super::embedding::Embedder;
use super::vector_store::{Distance, Point, VectorStore};
use crate::error::DocumentStoreError;
use crate::models::{MessageFilter, MessagePayload, SearchHit};

/// Extra candidates fetched when date bounds are filtered after the search.
///
/// Only this many multiples of `limit` are inspected; see [`DocumentStore::query`].
pub const DATE_FILTER_OVERFETCH: u64 = 5;

/// The operations the loader and the search command need from the store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> Result<bool, DocumentStoreError>;

    async fn create_collection(
        &self,
        collection: &str,
        vector_size: u64,
        distance: Distance,
    ) -> Result<(), DocumentStoreError>;

    /// Embed `documents` and store them with the matching payloads.
    async fn upload_documents(
        &self,
        collection: &str,
        documents: Vec<String>,
        payloads: Vec<MessagePayload>,
        wait: bool,
    ) -> Result<(), DocumentStoreError>;

    /// Ranked hits for a natural-language query.
    ///
    /// The sender filter is applied by the backend. Date bounds are applied
    /// afterwards to the best `DATE_FILTER_OVERFETCH * limit` candidates, so
    /// when most of those fall outside the bounds fewer than `limit` hits
    /// come back even if more matching messages exist further down.
    async fn query(
        &self,
        collection: &str,
        query_document: &str,
        limit: u64,
        filter: Option<&MessageFilter>,
    ) -> Result<Vec<SearchHit>, DocumentStoreError>;

    /// Vector size produced by the embedding model.
    async fn embedding_size(&self) -> Result<u64, DocumentStoreError>;
}

/// [`DocumentStore`] built from an embedder and a vector store backend.
pub struct EmbeddedDocumentStore {
    embedder: Box<dyn Embedder>,
    store: Box<dyn VectorStore>,
}

impl EmbeddedDocumentStore {
    pub fn new(embedder: Box<dyn Embedder>, store: Box<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }
}

#[async_trait]
impl DocumentStore for EmbeddedDocumentStore {
    async fn collection_exists(&self, collection: &str) -> Result<bool, DocumentStoreError> {
        Ok(self.store.collection_exists(collection).await?)
    }

    async fn create_collection(
        &self,
        collection: &str,
        vector_size: u64,
        distance: Distance,
    ) -> Result<(), DocumentStoreError> {
        Ok(self
            .store
            .create_collection(collection, vector_size, distance)
            .await?)
    }

    async fn upload_documents(
        &self,
        collection: &str,
        documents: Vec<String>,
        payloads: Vec<MessagePayload>,
        wait: bool,
    ) -> Result<(), DocumentStoreError> {
        if documents.len() != payloads.len() {
            return Err(DocumentStoreError::LengthMismatch {
                documents: documents.len(),
                payloads: payloads.len(),
            });
        }
        if documents.is_empty() {
            return Ok(());
        }

        let vectors = self.embedder.embed_documents(documents).await?;
        let points: Vec<Point> = vectors
            .into_iter()
            .zip(payloads)
            .map(|(vector, payload)| Point {
                id: Uuid::new_v4().to_string(),
                vector,
                payload,
            })
            .collect();

        Ok(self.store.upsert_points(collection, points, wait).await?)
    }

    async fn query(
        &self,
        collection: &str,
        query_document: &str,
        limit: u64,
        filter: Option<&MessageFilter>,
    ) -> Result<Vec<SearchHit>, DocumentStoreError> {
        let vector = self.embedder.embed_query(query_document).await?;
        let sender = filter.and_then(|f| f.sender_equals.as_deref());
        let dated = filter.filter(|f| f.has_date_bounds());

        let fetch = if dated.is_some() {
            limit.saturating_mul(DATE_FILTER_OVERFETCH)
        } else {
            limit
        };

        let mut hits = self.store.search(collection, vector, fetch, sender).await?;
        if let Some(filter) = dated {
            hits.retain(|hit| filter.matches_dates(&hit.payload));
        }
        hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(hits)
    }

    async fn embedding_size(&self) -> Result<u64, DocumentStoreError> {
        Ok(self.embedder.dimension().await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::models::{AppLanguage, ChatDataset};
    use crate::services::vector_store::LocalBackend;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    /// Deterministic bag-of-letters embedder.
    pub(crate) struct LetterEmbedder;

    impl LetterEmbedder {
        fn embed(text: &str) -> Vec<f32> {
            let mut v = vec![0.0; 26];
            for c in text.to_lowercase().chars() {
                if c.is_ascii_lowercase() {
                    v[(c as u8 - b'a') as usize] += 1.0;
                }
            }
            v
        }
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed_documents(
            &self,
            texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| Self::embed(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(Self::embed(text))
        }

        async fn dimension(&self) -> Result<u64, EmbeddingError> {
            Ok(26)
        }

        fn model(&self) -> &str {
            "letters"
        }
    }

    const EXPORT: &str = "\
[01/01/24, 10:00:00] Alice: zzz pizza tonight
[03/01/24, 10:00:00] Bob: pizza pizza
[05/01/24, 10:00:00] Alice: quiet walk
[07/01/24, 10:00:00] Bob: zzz pizza again
";

    async fn seeded_store(dir: &TempDir) -> EmbeddedDocumentStore {
        let store = EmbeddedDocumentStore::new(
            Box::new(LetterEmbedder),
            Box::new(LocalBackend::new(dir.path())),
        );
        store.create_collection("chats", 26, Distance::Cosine).await.unwrap();

        let data = ChatDataset::parse_text(EXPORT, AppLanguage::En);
        // Embed raw content so the letter counts are easy to reason about.
        let documents = data.iter().map(|m| m.content().to_string()).collect();
        let payloads = data.iter().map(MessagePayload::from).collect();
        store
            .upload_documents("chats", documents, payloads, true)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_upload_and_query() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir).await;
        assert_eq!(store.store().count("chats").await.unwrap(), 4);

        let hits = store.query("chats", "pizza pizza", 1, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.content, "pizza pizza");
        assert_eq!(hits[0].payload.sender, "Bob");
    }

    #[tokio::test]
    async fn test_query_sender_filter() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir).await;
        let filter = MessageFilter {
            sender_equals: Some("Alice".to_string()),
            ..Default::default()
        };
        let hits = store
            .query("chats", "pizza", 10, Some(&filter))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.payload.sender == "Alice"));
    }

    #[tokio::test]
    async fn test_query_date_filter() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir).await;
        let filter = MessageFilter {
            date_after: NaiveDate::from_ymd_opt(2024, 1, 2),
            date_before: NaiveDate::from_ymd_opt(2024, 1, 7),
            ..Default::default()
        };
        let hits = store
            .query("chats", "zzz pizza", 10, Some(&filter))
            .await
            .unwrap();
        let contents: Vec<&str> = hits.iter().map(|h| h.payload.content.as_str()).collect();
        assert_eq!(contents.len(), 2);
        assert!(contents.contains(&"pizza pizza"));
        assert!(contents.contains(&"quiet walk"));
    }

    #[tokio::test]
    async fn test_date_filter_may_return_fewer_than_limit() {
        let dir = TempDir::new().unwrap();
        let store = EmbeddedDocumentStore::new(
            Box::new(LetterEmbedder),
            Box::new(LocalBackend::new(dir.path())),
        );
        store.create_collection("chats", 26, Distance::Cosine).await.unwrap();

        // Six close matches from January, then one weak match from March.
        let mut export = String::new();
        for day in 1..=6 {
            export.push_str(&format!("[{day:02}/01/24, 10:00:00] Alice: pizza pizza\n"));
        }
        export.push_str("[01/03/24, 10:00:00] Alice: pizza and a long walk home\n");
        let data = ChatDataset::parse_text(&export, AppLanguage::En);
        let documents = data.iter().map(|m| m.content().to_string()).collect();
        let payloads = data.iter().map(MessagePayload::from).collect();
        store
            .upload_documents("chats", documents, payloads, true)
            .await
            .unwrap();

        let filter = MessageFilter {
            date_after: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..Default::default()
        };
        // limit 1 inspects the top 5 candidates, all from January.
        let hits = store
            .query("chats", "pizza pizza", 1, Some(&filter))
            .await
            .unwrap();
        assert!(hits.is_empty());

        // limit 2 inspects 10 and reaches the March message.
        let hits = store
            .query("chats", "pizza pizza", 2, Some(&filter))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.when, "Friday, 01 March 2024");
    }

    #[tokio::test]
    async fn test_upload_length_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = EmbeddedDocumentStore::new(
            Box::new(LetterEmbedder),
            Box::new(LocalBackend::new(dir.path())),
        );
        let result = store
            .upload_documents("chats", vec!["a".to_string()], vec![], true)
            .await;
        assert!(matches!(
            result,
            Err(DocumentStoreError::LengthMismatch {
                documents: 1,
                payloads: 0
            })
        ));
    }

    #[tokio::test]
    async fn test_embedding_size() {
        let dir = TempDir::new().unwrap();
        let store = EmbeddedDocumentStore::new(
            Box::new(LetterEmbedder),
            Box::new(LocalBackend::new(dir.path())),
        );
        assert_eq!(store.embedding_size().await.unwrap(), 26);
    }
}
