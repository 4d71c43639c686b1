//! Document chunking, embedding, and vector similarity retrieval.

pub mod document;
pub mod embedder;
pub mod in_memory_store;
pub mod qdrant_ops;
pub mod vector_store;

pub use embedder::Embedder;
pub use in_memory_store::InMemoryVectorStore;
pub use qdrant_ops::QdrantOps;
pub use vector_store::{ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
