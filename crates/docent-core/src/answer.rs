use std::fmt::Write as _;
use std::sync::Arc;

use docent_llm::{GenerationParams, LlmProvider, Message, RetryPolicy};
use docent_memory::document::{RetrievalPipeline, SearchResult};

use crate::error::ServiceError;

pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant information in the documents to answer your question.";

const MAX_CONFIDENCE: f32 = 95.0;
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Retrieved passages in ranking order.
    pub sources: Vec<SearchResult>,
    /// Percentage in `[0, 95]`.
    pub confidence: f32,
}

impl Answer {
    fn no_context() -> Self {
        Self {
            text: NO_CONTEXT_ANSWER.to_owned(),
            sources: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// `min(mean(scores) * 100, 95)`, never negative. Zero for no scores.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn confidence(scores: &[f32]) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f32>() / scores.len() as f32;
    (mean * 100.0).clamp(0.0, MAX_CONFIDENCE)
}

/// Number each passage and name its document, separated by horizontal rules.
#[must_use]
pub fn build_context(results: &[SearchResult]) -> String {
    let mut context = String::new();
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            context.push_str(CONTEXT_SEPARATOR);
        }
        let _ = write!(
            context,
            "Source {} (from {}):\n{}",
            i + 1,
            result.document.name,
            result.chunk.content
        );
    }
    context
}

#[must_use]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the following context from documents, please answer the question. \
         If the context doesn't contain enough information, say so clearly.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Please provide a helpful answer based only on the information provided in the \
         context above. If you reference specific information, mention which source it \
         came from.\n\n\
         Answer:"
    )
}

/// Retrieves the best passages for a question and asks the generation
/// provider to answer from them alone.
pub struct AnswerComposer<P> {
    pipeline: Arc<RetrievalPipeline<P>>,
    provider: Arc<P>,
    retry: RetryPolicy,
    answer_limit: usize,
    params: GenerationParams,
}

impl<P: LlmProvider> AnswerComposer<P> {
    #[must_use]
    pub fn new(pipeline: Arc<RetrievalPipeline<P>>, provider: Arc<P>) -> Self {
        Self {
            pipeline,
            provider,
            retry: RetryPolicy::default(),
            answer_limit: 3,
            params: GenerationParams::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_answer_limit(mut self, limit: usize) -> Self {
        self.answer_limit = limit;
        self
    }

    #[must_use]
    pub fn with_generation_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::Provider`] if retrieval or generation fails.
    pub async fn answer_question(&self, question: &str) -> Result<Answer, ServiceError> {
        let sources = self
            .pipeline
            .search_similar(question, self.answer_limit)
            .await?;
        if sources.is_empty() {
            tracing::info!("no passages above threshold, returning canned answer");
            return Ok(Answer::no_context());
        }

        let prompt = build_prompt(&build_context(&sources), question);
        let messages = [Message::user(prompt)];
        let provider = &self.provider;
        let messages = &messages[..];
        let params = self.params;
        let text = self
            .retry
            .run("generate", move || async move {
                provider.generate(messages, params).await
            })
            .await?;

        let scores: Vec<f32> = sources.iter().map(|s| s.score).collect();
        let confidence = confidence(&scores);
        tracing::info!(sources = sources.len(), confidence, "answered question");

        Ok(Answer {
            text,
            sources,
            confidence,
        })
    }
}
