//! Embedding client for generating text embeddings.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::error::EmbeddingError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_BATCH_SIZE: usize = 32;

const DIMENSION_PROBE: &str = "dimension probe";

/// Native output size of models we know about.
pub fn known_dimension(model: &str) -> Option<u64> {
    let dim = match model {
        "jinaai/jina-embeddings-v3" => 1024,
        "BAAI/bge-m3" => 1024,
        "intfloat/multilingual-e5-large" => 1024,
        "intfloat/multilingual-e5-base" => 768,
        "intfloat/multilingual-e5-small" => 384,
        "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2" => 384,
        "sentence-transformers/paraphrase-multilingual-mpnet-base-v2" => 768,
        _ => return None,
    };
    Some(dim)
}

/// Turns text into dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed documents for indexing, preserving input order.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output vector size of the model.
    async fn dimension(&self) -> Result<u64, EmbeddingError>;

    /// Model identifier.
    fn model(&self) -> &str;
}

/// Request body for the /embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest {
    inputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
}

/// Response from the /embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Client for an embedding server serving `model`.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    batch_size: usize,
    dimension: OnceCell<u64>,
}

impl EmbeddingClient {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        let model = model.into();
        let dimension = match known_dimension(&model) {
            Some(dim) => OnceCell::new_with(Some(dim)),
            None => OnceCell::new(),
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            batch_size: DEFAULT_BATCH_SIZE,
            dimension,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Get the base URL of the embedding server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Internal method to embed a single batch.
    async fn embed_single_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embed", self.base_url);
        let expected = texts.len();
        let request = EmbedRequest {
            inputs: texts,
            truncate: Some(true),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if embed_response.0.len() != expected {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                expected,
                embed_response.0.len()
            )));
        }

        Ok(embed_response.0)
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.embed_single_batch(chunk.to_vec()).await?;
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_single_batch(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    async fn dimension(&self) -> Result<u64, EmbeddingError> {
        self.dimension
            .get_or_try_init(|| async {
                let probe = self.embed_query(DIMENSION_PROBE).await?;
                tracing::debug!(model = %self.model, dimension = probe.len(), "probed embedding size");
                Ok::<u64, EmbeddingError>(probe.len() as u64)
            })
            .await
            .copied()
    }

    fn model(&self) -> &str {
        &self.model
    }
}
