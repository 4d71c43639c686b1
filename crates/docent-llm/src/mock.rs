//! Test-only mock provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{GenerationParams, LlmProvider, Message};

type EmbedFn = Arc<dyn Fn(&str) -> Vec<f32> + Send + Sync>;

/// Deterministic provider for tests.
///
/// Embeddings come from `embed_fn` (a constant vector by default). Generation
/// returns queued responses first, then `default_response`. Every prompt and
/// parameter set passed to `generate` is recorded.
#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    embed_fn: EmbedFn,
    pub supports_embeddings: bool,
    pub fail_chat: bool,
    /// Zero-based embed call index at which `embed` starts failing.
    pub fail_embed_after: Option<usize>,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
    embed_calls: Arc<AtomicUsize>,
    generate_calls: Arc<Mutex<Vec<(Vec<Message>, GenerationParams)>>>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("default_response", &self.default_response)
            .field("supports_embeddings", &self.supports_embeddings)
            .field("fail_chat", &self.fail_chat)
            .field("fail_embed_after", &self.fail_embed_after)
            .finish_non_exhaustive()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embed_fn: Arc::new(|_| vec![0.0; 384]),
            supports_embeddings: true,
            fail_chat: false,
            fail_embed_after: None,
            delay_ms: 0,
            embed_calls: Arc::new(AtomicUsize::new(0)),
            generate_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embed_fn = Arc::new(move |_| embedding.clone());
        self
    }

    #[must_use]
    pub fn with_embed_fn(mut self, f: impl Fn(&str) -> Vec<f32> + Send + Sync + 'static) -> Self {
        self.embed_fn = Arc::new(f);
        self
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fail_embed_after(mut self, calls: usize) -> Self {
        self.fail_embed_after = Some(calls);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    #[must_use]
    pub fn embed_call_count(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Prompts and parameters received by `generate`, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn generate_calls(&self) -> Vec<(Vec<Message>, GenerationParams)> {
        self.generate_calls.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    async fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<String, LlmError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.generate_calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), params));
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if !self.supports_embeddings {
            return Err(LlmError::EmbedUnsupported {
                provider: "mock".into(),
            });
        }
        let call = self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed_after.is_some_and(|n| call >= n) {
            return Err(LlmError::Other("mock embed error".into()));
        }
        Ok((self.embed_fn)(text))
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_responses_then_default() {
        let p = MockProvider::with_responses(vec!["first".into()]);
        let params = GenerationParams::default();
        assert_eq!(p.generate(&[], params).await.unwrap(), "first");
        assert_eq!(p.generate(&[], params).await.unwrap(), "mock response");
        assert_eq!(p.generate_calls().len(), 2);
    }

    #[tokio::test]
    async fn embed_failure_threshold() {
        let p = MockProvider::default()
            .with_embedding(vec![1.0, 0.0])
            .fail_embed_after(1);
        assert_eq!(p.embed("a").await.unwrap(), vec![1.0, 0.0]);
        assert!(p.embed("b").await.is_err());
        assert_eq!(p.embed_call_count(), 2);
    }
}
