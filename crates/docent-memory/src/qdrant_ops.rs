//! Qdrant-backed [`VectorStore`].

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, value::Kind,
};

use crate::vector_store::{
    BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

type QdrantResult<T> = Result<T, Box<qdrant_client::QdrantError>>;

/// Thin wrapper over [`Qdrant`] client encapsulating the collection operations
/// the retrieval pipeline needs.
#[derive(Clone)]
pub struct QdrantOps {
    client: Qdrant,
}

impl std::fmt::Debug for QdrantOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantOps").finish_non_exhaustive()
    }
}

impl QdrantOps {
    /// Create a new `QdrantOps` connected to the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn new(url: &str) -> QdrantResult<Self> {
        let client = Qdrant::from_url(url).build().map_err(Box::new)?;
        Ok(Self { client })
    }

    /// Create a collection with cosine distance vectors unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if Qdrant cannot be reached or collection creation fails.
    pub async fn ensure_collection(&self, collection: &str, vector_size: u64) -> QdrantResult<()> {
        if self
            .client
            .collection_exists(collection)
            .await
            .map_err(Box::new)?
        {
            return Ok(());
        }
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .map_err(Box::new)?;
        tracing::info!(collection, vector_size, "created Qdrant collection");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if Qdrant cannot be reached.
    pub async fn collection_exists(&self, collection: &str) -> QdrantResult<bool> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(Box::new)
    }

    /// # Errors
    ///
    /// Returns an error if the collection cannot be deleted.
    pub async fn delete_collection(&self, collection: &str) -> QdrantResult<()> {
        self.client
            .delete_collection(collection)
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    /// Upsert points and wait until Qdrant has applied the write.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> QdrantResult<()> {
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Box::new)?;
        Ok(())
    }

    /// Search for similar vectors, returning scored points with payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    pub async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: Option<f32>,
    ) -> QdrantResult<Vec<ScoredPoint>> {
        let mut builder = SearchPointsBuilder::new(collection, vector, limit).with_payload(true);
        if let Some(threshold) = score_threshold {
            builder = builder.score_threshold(threshold);
        }
        let results = self.client.search_points(builder).await.map_err(Box::new)?;
        Ok(results.result)
    }

    /// Convert a JSON object map to a Qdrant payload map.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the value cannot be represented as a payload.
    pub fn json_to_payload(
        payload: HashMap<String, serde_json::Value>,
    ) -> Result<HashMap<String, qdrant_client::qdrant::Value>, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(payload.into_iter().collect()))
    }
}

impl VectorStore for QdrantOps {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.ensure_collection(&collection, vector_size)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.collection_exists(&collection)
                .await
                .map_err(|e| VectorStoreError::Connection(e.to_string()))
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.delete_collection(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let qdrant_points = points
                .into_iter()
                .map(|p| {
                    let payload = Self::json_to_payload(p.payload)
                        .map_err(|e| VectorStoreError::Serialization(e.to_string()))?;
                    Ok(PointStruct::new(p.id, p.vector, payload))
                })
                .collect::<Result<Vec<_>, VectorStoreError>>()?;
            self.upsert(&collection, qdrant_points)
                .await
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))
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
            let results = self
                .search(&collection, vector, limit, score_threshold)
                .await
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            Ok(results.into_iter().map(scored_point_to_vector).collect())
        })
    }
}

fn qdrant_value_to_json(value: qdrant_client::qdrant::Value) -> Option<serde_json::Value> {
    let json = match value.kind? {
        Kind::StringValue(s) => serde_json::Value::String(s),
        Kind::IntegerValue(i) => serde_json::Value::Number(i.into()),
        Kind::DoubleValue(d) => serde_json::Number::from_f64(d).map(serde_json::Value::Number)?,
        Kind::BoolValue(b) => serde_json::Value::Bool(b),
        Kind::NullValue(_) => serde_json::Value::Null,
        Kind::ListValue(list) => serde_json::Value::Array(
            list.values
                .into_iter()
                .filter_map(qdrant_value_to_json)
                .collect(),
        ),
        Kind::StructValue(s) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .filter_map(|(k, v)| Some((k, qdrant_value_to_json(v)?)))
                .collect(),
        ),
    };
    Some(json)
}

fn scored_point_to_vector(point: ScoredPoint) -> ScoredVectorPoint {
    let payload: HashMap<String, serde_json::Value> = point
        .payload
        .into_iter()
        .filter_map(|(k, v)| Some((k, qdrant_value_to_json(v)?)))
        .collect();

    let id = match point.id.and_then(|pid| pid.point_id_options) {
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u,
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    };

    ScoredVectorPoint {
        id,
        score: point.score,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_valid_url() {
        assert!(QdrantOps::new("http://localhost:6334").is_ok());
    }

    #[test]
    fn new_invalid_url() {
        assert!(QdrantOps::new("not a valid url").is_err());
    }

    #[test]
    fn debug_format() {
        let ops = QdrantOps::new("http://localhost:6334").unwrap();
        assert!(format!("{ops:?}").contains("QdrantOps"));
    }

    #[test]
    fn json_to_payload_keeps_fields() {
        let payload = HashMap::from([
            ("document_name".to_owned(), serde_json::json!("guide.txt")),
            ("chunk_index".to_owned(), serde_json::json!(2)),
        ]);
        let converted = QdrantOps::json_to_payload(payload).unwrap();
        assert_eq!(converted.len(), 2);
        assert!(matches!(
            converted["document_name"].kind,
            Some(Kind::StringValue(ref s)) if s == "guide.txt"
        ));
        assert!(matches!(
            converted["chunk_index"].kind,
            Some(Kind::IntegerValue(2))
        ));
    }

    #[test]
    fn payload_values_round_trip_through_json() {
        let payload = HashMap::from([
            ("content".to_owned(), serde_json::json!("text")),
            ("start_char".to_owned(), serde_json::json!(10)),
        ]);
        let converted = QdrantOps::json_to_payload(payload).unwrap();
        let back: HashMap<String, serde_json::Value> = converted
            .into_iter()
            .filter_map(|(k, v)| Some((k, qdrant_value_to_json(v)?)))
            .collect();
        assert_eq!(back["content"], "text");
        assert_eq!(back["start_char"], 10);
    }

    #[test]
    fn scored_point_uuid_id() {
        let point = ScoredPoint {
            id: Some(qdrant_client::qdrant::PointId::from(
                "6f1c1d2e-0000-4000-8000-000000000001".to_owned(),
            )),
            score: 0.8,
            ..Default::default()
        };
        let converted = scored_point_to_vector(point);
        assert_eq!(converted.id, "6f1c1d2e-0000-4000-8000-000000000001");
        assert!((converted.score - 0.8).abs() < f32::EPSILON);
        assert!(converted.payload.is_empty());
    }
}
