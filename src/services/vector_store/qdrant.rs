//! Qdrant vector store backend implementation.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use std::collections::HashMap;

use super::{Distance, Point, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{MessagePayload, SearchHit};

type Payload = HashMap<String, qdrant_client::qdrant::Value>;

/// Points per upsert request. Keeps requests well under the server's
/// 32 MiB gRPC message limit at 1024 dimensions.
pub const UPSERT_BATCH_SIZE: usize = 64;

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
}

impl QdrantBackend {
    /// Connect to the gRPC endpoint at `url`.
    pub fn new(url: &str, api_key: Option<&str>) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(url);

        if let Some(api_key) = api_key {
            builder = builder.api_key(api_key.to_string());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self { client })
    }

    fn to_qdrant_distance(distance: Distance) -> qdrant_client::qdrant::Distance {
        match distance {
            Distance::Cosine => qdrant_client::qdrant::Distance::Cosine,
            Distance::Dot => qdrant_client::qdrant::Distance::Dot,
            Distance::Euclid => qdrant_client::qdrant::Distance::Euclid,
        }
    }

    fn to_payload(payload: MessagePayload) -> Payload {
        let mut map = Payload::new();
        map.insert("sender".to_string(), payload.sender.into());
        map.insert("when".to_string(), payload.when.into());
        map.insert("content".to_string(), payload.content.into());
        map.insert("document".to_string(), payload.document.into());
        map
    }

    fn string_field(payload: &Payload, key: &str) -> String {
        payload
            .get(key)
            .and_then(|v| match &v.kind {
                Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn from_payload(payload: &Payload) -> MessagePayload {
        MessagePayload {
            sender: Self::string_field(payload, "sender"),
            when: Self::string_field(payload, "when"),
            content: Self::string_field(payload, "content"),
            document: Self::string_field(payload, "document"),
        }
    }

    /// Convert points in order, split into request-sized batches.
    fn upsert_batches(points: Vec<Point>, batch_size: usize) -> Vec<Vec<PointStruct>> {
        let batch_size = batch_size.max(1);
        let mut batches = Vec::with_capacity(points.len().div_ceil(batch_size));
        let mut current = Vec::with_capacity(batch_size.min(points.len()));
        for point in points {
            current.push(PointStruct::new(
                point.id,
                point.vector,
                Self::to_payload(point.payload),
            ));
            if current.len() == batch_size {
                batches.push(std::mem::replace(&mut current, Vec::with_capacity(batch_size)));
            }
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    fn point_id(id: Option<&qdrant_client::qdrant::PointId>) -> String {
        match id.and_then(|id| id.point_id_options.as_ref()) {
            Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)) => uuid.clone(),
            Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)) => num.to_string(),
            None => String::new(),
        }
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn create_collection(
        &self,
        collection: &str,
        vector_size: u64,
        distance: Distance,
    ) -> Result<(), VectorStoreError> {
        let create_collection = CreateCollectionBuilder::new(collection).vectors_config(
            VectorParamsBuilder::new(vector_size, Self::to_qdrant_distance(distance)),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<Point>,
        wait: bool,
    ) -> Result<(), VectorStoreError> {
        let total = points.len();
        for (i, batch) in Self::upsert_batches(points, UPSERT_BATCH_SIZE)
            .into_iter()
            .enumerate()
        {
            let size = batch.len();
            let upsert = UpsertPointsBuilder::new(collection, batch).wait(wait);
            self.client.upsert_points(upsert).await.map_err(|e| {
                VectorStoreError::UpsertError(format!(
                    "batch {} ({size} of {total} points): {e}",
                    i + 1
                ))
            })?;
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        sender: Option<&str>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let mut search_builder =
            SearchPointsBuilder::new(collection, vector, limit).with_payload(true);

        if let Some(sender) = sender {
            search_builder =
                search_builder.filter(Filter::must([Condition::matches("sender", sender.to_string())]));
        }

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: Self::point_id(point.id.as_ref()),
                score: point.score,
                payload: Self::from_payload(&point.payload),
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(response.result.map_or(0, |r| r.count))
    }
}
