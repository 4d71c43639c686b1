use std::collections::HashMap;
use std::sync::RwLock;

use crate::vector_store::{
    BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct InMemoryCollection {
    vector_size: usize,
    points: HashMap<String, StoredPoint>,
}

/// Process-local cosine-similarity index. Writes are visible to the next search.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of points stored in `collection`, or zero if it does not exist.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .ok()
            .and_then(|cols| cols.get(collection).map(|c| c.points.len()))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .finish_non_exhaustive()
    }
}

/// Cosine similarity, clamped to `[0, 1]` to match the score range of a cosine
/// collection. Zero vectors score 0.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let vector_size = usize::try_from(vector_size)
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection)
                .or_insert_with(|| InMemoryCollection {
                    vector_size,
                    points: HashMap::new(),
                });
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.contains_key(&collection))
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.remove(&collection);
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            // Validate the whole batch before touching the collection.
            if let Some(bad) = points.iter().find(|p| p.vector.len() != col.vector_size) {
                return Err(VectorStoreError::Dimension {
                    expected: col.vector_size,
                    actual: bad.vector.len(),
                });
            }
            for p in points {
                col.points.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                    },
                );
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: Option<f32>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;
            if vector.len() != col.vector_size {
                return Err(VectorStoreError::Dimension {
                    expected: col.vector_size,
                    actual: vector.len(),
                });
            }

            let threshold = score_threshold.unwrap_or(f32::MIN);
            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .map(|(id, sp)| ScoredVectorPoint {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .filter(|p| p.score >= threshold)
                .collect();

            scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
            scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, vector: Vec<f32>) -> VectorPoint {
        VectorPoint {
            id: id.into(),
            vector,
            payload: HashMap::from([("name".into(), serde_json::json!(id))]),
        }
    }

    #[tokio::test]
    async fn ensure_collection_and_exists() {
        let store = InMemoryVectorStore::new();
        assert!(!store.collection_exists("test").await.unwrap());
        store.ensure_collection("test", 3).await.unwrap();
        store.ensure_collection("test", 3).await.unwrap();
        assert!(store.collection_exists("test").await.unwrap());
    }

    #[tokio::test]
    async fn delete_collection_removes() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", 3).await.unwrap();
        store.delete_collection("test").await.unwrap();
        assert!(!store.collection_exists("test").await.unwrap());
    }

    #[tokio::test]
    async fn upsert_and_search_ranks_by_similarity() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", 3).await.unwrap();
        store
            .upsert(
                "test",
                vec![
                    point("a", vec![1.0, 0.0, 0.0]),
                    point("b", vec![0.0, 1.0, 0.0]),
                    point("c", vec![0.8, 0.6, 0.0]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(store.len("test"), 3);

        let results = store
            .search("test", vec![1.0, 0.0, 0.0], 10, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "c");
        assert!((results[0].score - 1.0).abs() < f32::EPSILON);
        assert_eq!(results[0].payload["name"], "a");
    }

    #[tokio::test]
    async fn search_applies_threshold_and_limit() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", 2).await.unwrap();
        store
            .upsert(
                "test",
                vec![
                    point("hit1", vec![1.0, 0.0]),
                    point("hit2", vec![0.9, 0.1]),
                    point("miss", vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let results = store
            .search("test", vec![1.0, 0.0], 10, Some(0.6))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score >= 0.6));

        let limited = store
            .search("test", vec![1.0, 0.0], 1, Some(0.6))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, "hit1");
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimension_atomically() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", 3).await.unwrap();
        let err = store
            .upsert(
                "test",
                vec![point("ok", vec![1.0, 0.0, 0.0]), point("bad", vec![1.0])],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::Dimension {
                expected: 3,
                actual: 1
            }
        ));
        assert!(store.is_empty("test"));
    }

    #[tokio::test]
    async fn search_missing_collection_errors() {
        let store = InMemoryVectorStore::new();
        let err = store.search("nope", vec![1.0], 5, None).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::Search(_)));
    }

    #[tokio::test]
    async fn upsert_same_id_overwrites() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", 2).await.unwrap();
        store
            .upsert("test", vec![point("a", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert("test", vec![point("a", vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(store.len("test"), 1);
        let results = store
            .search("test", vec![0.0, 1.0], 1, None)
            .await
            .unwrap();
        assert!((results[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_similarity_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn debug_format() {
        let dbg = format!("{:?}", InMemoryVectorStore::new());
        assert!(dbg.contains("InMemoryVectorStore"));
    }
}
