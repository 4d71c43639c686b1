use docent_llm::LlmError;
use docent_memory::document::DocumentError;
use serde::{Deserialize, Serialize};

/// Failure surfaced to callers of the document service.
///
/// `Validation` is returned before any collaborator is called and should not be
/// retried. `Provider` wraps embedding, generation and vector index failures.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Provider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Provider,
}

impl ServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Provider(_) => ErrorKind::Provider,
        }
    }
}

impl From<DocumentError> for ServiceError {
    fn from(e: DocumentError) -> Self {
        Self::Provider(e.to_string())
    }
}

impl From<LlmError> for ServiceError {
    fn from(e: LlmError) -> Self {
        Self::Provider(e.to_string())
    }
}
