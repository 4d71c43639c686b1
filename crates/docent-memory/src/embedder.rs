use std::sync::Arc;
use std::time::Duration;

use docent_llm::{LlmError, LlmProvider, RateLimiter, RetryPolicy};

/// One embedding call per 100 ms unless configured otherwise.
pub const DEFAULT_EMBED_INTERVAL: Duration = Duration::from_millis(100);

/// Rate-limited, retried access to a provider's embedding endpoint.
///
/// Every call acquires a permit from the shared [`RateLimiter`] before reaching
/// the provider, and runs under the [`RetryPolicy`]. Cloning shares the limiter.
pub struct Embedder<P> {
    provider: Arc<P>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl<P> Clone for Embedder<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            limiter: Arc::clone(&self.limiter),
            retry: self.retry.clone(),
        }
    }
}

impl<P> std::fmt::Debug for Embedder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("retry", &self.retry)
            .field("rate_limited", &!self.limiter.is_unlimited())
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> Embedder<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            limiter: Arc::new(RateLimiter::new(1, DEFAULT_EMBED_INTERVAL)),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// # Errors
    ///
    /// Returns the provider error once retries are exhausted, or
    /// [`LlmError::Timeout`] if the last attempt missed its deadline.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let provider = &self.provider;
        let limiter = &self.limiter;
        self.retry
            .run("embed", move || async move {
                limiter.acquire().await;
                provider.embed(text).await
            })
            .await
    }

    /// Embed `texts` one at a time, in order. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by [`Embedder::embed`].
    pub async fn embed_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let vector = self.embed(text.as_ref()).await.inspect_err(|e| {
                tracing::error!(index = i, total = texts.len(), "embedding failed: {e}");
            })?;
            embeddings.push(vector);
        }
        Ok(embeddings)
    }
}
