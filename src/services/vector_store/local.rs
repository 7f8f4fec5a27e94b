//! On-disk vector store used in local-instance mode.
//!
//! Each collection is one JSON file under `<root>/collection/`. Search is a
//! brute-force scan, which is fine for the size of a chat history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{Distance, Point, VectorStore};
use crate::error::VectorStoreError;
use crate::models::SearchHit;

#[derive(Debug, Serialize, Deserialize)]
struct LocalCollection {
    vector_size: u64,
    distance: Distance,
    points: Vec<Point>,
}

/// Local vector store backend.
pub struct LocalBackend {
    root: PathBuf,
    // Serializes read-modify-write cycles on collection files.
    write_lock: Mutex<()>,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, VectorStoreError> {
        if collection.is_empty()
            || collection == "."
            || collection == ".."
            || collection.contains(['/', '\\'])
        {
            return Err(VectorStoreError::CollectionError(format!(
                "invalid collection name: {collection:?}"
            )));
        }
        Ok(self
            .root
            .join("collection")
            .join(format!("{collection}.json")))
    }

    async fn read(&self, collection: &str) -> Result<LocalCollection, VectorStoreError> {
        let path = self.collection_path(collection)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VectorStoreError::CollectionError(format!(
                    "collection {collection} not found"
                )));
            }
            Err(source) => return Err(VectorStoreError::LocalStorage { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| VectorStoreError::LocalFormat { path, source })
    }

    async fn write(
        &self,
        collection: &str,
        data: &LocalCollection,
    ) -> Result<(), VectorStoreError> {
        let path = self.collection_path(collection)?;
        let storage_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| VectorStoreError::LocalStorage { path, source }
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(storage_err(parent))?;
        }

        let bytes = serde_json::to_vec(data).map_err(|source| VectorStoreError::LocalFormat {
            path: path.clone(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(storage_err(&tmp))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(storage_err(&path))?;
        Ok(())
    }
}

fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match distance {
        Distance::Dot => dot,
        Distance::Cosine => {
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        // Higher is better, so report the negated distance.
        Distance::Euclid => {
            -a.iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt()
        }
    }
}

#[async_trait]
impl VectorStore for LocalBackend {
    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError> {
        let path = self.collection_path(collection)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| VectorStoreError::LocalStorage { path, source })
    }

    async fn create_collection(
        &self,
        collection: &str,
        vector_size: u64,
        distance: Distance,
    ) -> Result<(), VectorStoreError> {
        let _guard = self.write_lock.lock().await;
        if self.collection_exists(collection).await? {
            return Err(VectorStoreError::CollectionError(format!(
                "collection {collection} already exists"
            )));
        }
        let data = LocalCollection {
            vector_size,
            distance,
            points: Vec::new(),
        };
        self.write(collection, &data).await
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<Point>,
        _wait: bool,
    ) -> Result<(), VectorStoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let mut data = self.read(collection).await?;

        if let Some(bad) = points
            .iter()
            .find(|p| p.vector.len() as u64 != data.vector_size)
        {
            return Err(VectorStoreError::UpsertError(format!(
                "point {} has {} dimensions, collection expects {}",
                bad.id,
                bad.vector.len(),
                data.vector_size
            )));
        }

        let mut index: HashMap<String, usize> = data
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        for point in points {
            match index.get(&point.id) {
                Some(&i) => data.points[i] = point,
                None => {
                    index.insert(point.id.clone(), data.points.len());
                    data.points.push(point);
                }
            }
        }

        // Writes are synchronous, so every upsert is already waited on.
        self.write(collection, &data).await
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        sender: Option<&str>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let data = self.read(collection).await?;
        if vector.len() as u64 != data.vector_size {
            return Err(VectorStoreError::SearchError(format!(
                "query has {} dimensions, collection expects {}",
                vector.len(),
                data.vector_size
            )));
        }

        let mut hits: Vec<SearchHit> = data
            .points
            .into_iter()
            .filter(|p| sender.is_none_or(|s| p.payload.sender == s))
            .map(|p| SearchHit {
                score: score(data.distance, &vector, &p.vector),
                id: p.id,
                payload: p.payload,
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        Ok(self.read(collection).await?.points.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessagePayload;
    use tempfile::TempDir;

    fn point(id: &str, sender: &str, vector: Vec<f32>) -> Point {
        Point {
            id: id.to_string(),
            vector,
            payload: MessagePayload {
                sender: sender.to_string(),
                when: "Monday, 01 January 2024".to_string(),
                content: format!("message {id}"),
                document: format!("Sender: {sender}"),
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_exists() {
        let dir = TempDir::new().unwrap();
        let store = LocalBackend::new(dir.path());
        assert!(!store.collection_exists("chats").await.unwrap());

        store.create_collection("chats", 2, Distance::Cosine).await.unwrap();
        assert!(store.collection_exists("chats").await.unwrap());
        assert!(dir.path().join("collection/chats.json").exists());
        assert_eq!(store.count("chats").await.unwrap(), 0);

        let again = store.create_collection("chats", 2, Distance::Cosine).await;
        assert!(matches!(again, Err(VectorStoreError::CollectionError(_))));
    }

    #[tokio::test]
    async fn test_search_ranks_by_cosine() {
        let dir = TempDir::new().unwrap();
        let store = LocalBackend::new(dir.path());
        store.create_collection("chats", 2, Distance::Cosine).await.unwrap();
        store
            .upsert_points(
                "chats",
                vec![
                    point("a", "Alice", vec![1.0, 0.0]),
                    point("b", "Bob", vec![0.7, 0.7]),
                    point("c", "Alice", vec![0.0, 1.0]),
                ],
                true,
            )
            .await
            .unwrap();

        let hits = store.search("chats", vec![1.0, 0.1], 2, None).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(hits[0].score > hits[1].score);

        let hits = store
            .search("chats", vec![1.0, 0.1], 10, Some("Alice"))
            .await
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_upsert_appends_new_ids() {
        let dir = TempDir::new().unwrap();
        let store = LocalBackend::new(dir.path());
        store.create_collection("chats", 2, Distance::Dot).await.unwrap();
        store
            .upsert_points("chats", vec![point("a", "Alice", vec![1.0, 0.0])], true)
            .await
            .unwrap();
        store
            .upsert_points("chats", vec![point("b", "Alice", vec![1.0, 0.0])], true)
            .await
            .unwrap();
        assert_eq!(store.count("chats").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_ids_in_place() {
        let dir = TempDir::new().unwrap();
        let store = LocalBackend::new(dir.path());
        store.create_collection("chats", 2, Distance::Dot).await.unwrap();

        let first: Vec<Point> = (0..20_000)
            .map(|i| point(&i.to_string(), "Alice", vec![1.0, 0.0]))
            .collect();
        store.upsert_points("chats", first, true).await.unwrap();

        // Replaces "5" twice in one call, the last write wins.
        let second = vec![
            point("5", "Bob", vec![0.0, 1.0]),
            point("new", "Carol", vec![1.0, 1.0]),
            point("5", "Dave", vec![0.0, 2.0]),
        ];
        store.upsert_points("chats", second, true).await.unwrap();
        assert_eq!(store.count("chats").await.unwrap(), 20_001);

        let data = store.read("chats").await.unwrap();
        assert_eq!(data.points[5].id, "5");
        assert_eq!(data.points[5].payload.sender, "Dave");
        assert_eq!(data.points[20_000].id, "new");
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = LocalBackend::new(dir.path());
        store.create_collection("chats", 3, Distance::Cosine).await.unwrap();
        let result = store
            .upsert_points("chats", vec![point("a", "Alice", vec![1.0])], true)
            .await;
        assert!(matches!(result, Err(VectorStoreError::UpsertError(_))));
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let dir = TempDir::new().unwrap();
        let store = LocalBackend::new(dir.path());
        let result = store.search("nope", vec![1.0], 1, None).await;
        assert!(matches!(result, Err(VectorStoreError::CollectionError(_))));
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let store = LocalBackend::new(dir.path());
        assert!(store.collection_exists("../escape").await.is_err());
        assert!(store.collection_exists("").await.is_err());
    }

    #[test]
    fn test_score_functions() {
        assert!((score(Distance::Cosine, &[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(score(Distance::Cosine, &[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(score(Distance::Dot, &[1.0, 2.0], &[3.0, 4.0]), 11.0);
        assert!((score(Distance::Euclid, &[0.0, 0.0], &[3.0, 4.0]) + 5.0).abs() < 1e-6);
    }
}
