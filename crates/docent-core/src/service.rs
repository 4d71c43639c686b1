//! Request/response boundary over the retrieval pipeline and answer composer.
//!
//! Every operation validates its input before touching a collaborator and
//! folds failures into the response instead of returning `Err`.

use std::sync::Arc;

use docent_llm::LlmProvider;
use docent_memory::document::{
    Document, DocumentError, DocumentSource, RetrievalPipeline, SearchResult,
};
use serde::{Deserialize, Serialize};

use crate::answer::AnswerComposer;
use crate::error::{ErrorKind, ServiceError};

/// Characters of chunk text kept in a cited-source preview.
pub const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddDocumentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    /// Where the document came from, such as a canonical file path.
    #[serde(default, rename = "sourceId", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDocumentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSnippet {
    pub document_name: String,
    pub content_snippet: String,
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceSnippet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub document_name: String,
    pub content: String,
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SearchHit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Shared shape of failed responses.
pub trait FailureResponse: Default {
    fn failure(err: &ServiceError) -> Self;
}

macro_rules! impl_failure {
    ($($ty:ty),+) => {
        $(impl FailureResponse for $ty {
            fn failure(err: &ServiceError) -> Self {
                Self {
                    success: false,
                    error: Some(err.to_string()),
                    error_kind: Some(err.kind()),
                    ..Self::default()
                }
            }
        })+
    };
}

impl_failure!(AddDocumentResponse, AskResponse, SearchResponse);

fn fold<T: FailureResponse>(operation: &str, result: Result<T, ServiceError>) -> T {
    result.unwrap_or_else(|e| {
        match &e {
            ServiceError::Validation(msg) => tracing::debug!(operation, "rejected request: {msg}"),
            ServiceError::Provider(msg) => tracing::error!(operation, "request failed: {msg}"),
        }
        T::failure(&e)
    })
}

/// First [`SNIPPET_CHARS`] characters, with `...` appended when cut.
#[must_use]
pub fn snippet(content: &str) -> String {
    match content.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_owned(),
    }
}

fn require(value: &str, message: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        Err(ServiceError::Validation(message.to_owned()))
    } else {
        Ok(())
    }
}

pub struct DocumentService<P> {
    pipeline: Arc<RetrievalPipeline<P>>,
    composer: AnswerComposer<P>,
    search_limit: usize,
}

impl<P: LlmProvider> DocumentService<P> {
    #[must_use]
    pub fn new(
        pipeline: Arc<RetrievalPipeline<P>>,
        composer: AnswerComposer<P>,
        search_limit: usize,
    ) -> Self {
        Self {
            pipeline,
            composer,
            search_limit,
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<RetrievalPipeline<P>> {
        &self.pipeline
    }

    /// # Errors
    ///
    /// Returns an error if the vector store cannot create the collection.
    pub async fn ensure_collection(&self) -> Result<(), DocumentError> {
        self.pipeline.ensure_collection().await
    }

    pub async fn add_document(&self, request: AddDocumentRequest) -> AddDocumentResponse {
        fold("add_document", self.try_add_document(request).await)
    }

    pub async fn ask_question(&self, request: AskRequest) -> AskResponse {
        fold("ask_question", self.try_ask_question(request).await)
    }

    pub async fn search_documents(&self, request: SearchRequest) -> SearchResponse {
        fold("search_documents", self.try_search_documents(request).await)
    }

    async fn try_add_document(
        &self,
        request: AddDocumentRequest,
    ) -> Result<AddDocumentResponse, ServiceError> {
        require(&request.name, "Name and content are required")?;
        require(&request.content, "Name and content are required")?;

        let mut document = Document::new(request.name, request.content, DocumentSource::Upload);
        if let Some(source_id) = request.source_id.filter(|s| !s.trim().is_empty()) {
            document = document.with_source_id(source_id);
        }
        let chunks = self.pipeline.index_document(&document).await?;

        Ok(AddDocumentResponse {
            success: true,
            document_id: Some(document.id.to_string()),
            chunks: Some(chunks),
            ..AddDocumentResponse::default()
        })
    }

    async fn try_ask_question(&self, request: AskRequest) -> Result<AskResponse, ServiceError> {
        require(&request.question, "Question is required")?;

        let answer = self.composer.answer_question(request.question.trim()).await?;
        let sources = answer
            .sources
            .iter()
            .map(|s| SourceSnippet {
                document_name: s.document.name.clone(),
                content_snippet: snippet(&s.chunk.content),
                score: s.score,
            })
            .collect();

        Ok(AskResponse {
            success: true,
            answer: Some(answer.text),
            confidence: Some(answer.confidence),
            sources: Some(sources),
            ..AskResponse::default()
        })
    }

    async fn try_search_documents(
        &self,
        request: SearchRequest,
    ) -> Result<SearchResponse, ServiceError> {
        require(&request.query, "Query is required")?;
        let limit = match request.limit {
            Some(0) => {
                return Err(ServiceError::Validation(
                    "Limit must be greater than zero".into(),
                ));
            }
            Some(n) => n,
            None => self.search_limit,
        };

        let results: Vec<SearchHit> = self
            .pipeline
            .search_similar(request.query.trim(), limit)
            .await?
            .into_iter()
            .map(|r: SearchResult| SearchHit {
                document_name: r.document.name,
                content: r.chunk.content,
                score: r.score,
            })
            .collect();

        Ok(SearchResponse {
            success: true,
            total_results: Some(results.len()),
            results: Some(results),
            ..SearchResponse::default()
        })
    }
}
