mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.splitter.chunk_size == 0 {
            bail!("splitter.chunk_size must be greater than zero");
        }
        if self.vector_store.vector_size == 0 {
            bail!("vector_store.vector_size must be greater than zero");
        }
        if self.vector_store.collection.trim().is_empty() {
            bail!("vector_store.collection must not be empty");
        }
        let threshold = self.retrieval.score_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            bail!("retrieval.score_threshold must be within [0, 1], got {threshold}");
        }
        if self.retrieval.search_limit == 0 {
            bail!("retrieval.search_limit must be greater than zero");
        }
        if self.retrieval.answer_limit == 0 {
            bail!("retrieval.answer_limit must be greater than zero");
        }
        if self.retrieval.max_answer_tokens == 0 {
            bail!("retrieval.max_answer_tokens must be greater than zero");
        }
        let temperature = self.retrieval.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            bail!("retrieval.temperature must be within [0, 2], got {temperature}");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be greater than zero");
        }
        if self.retry.timeout_secs == 0 {
            bail!("retry.timeout_secs must be greater than zero");
        }
        if self.gateway.max_body_size == 0 {
            bail!("gateway.max_body_size must be greater than zero");
        }
        if self.splitter.chunk_overlap >= self.splitter.chunk_size {
            bail!(
                "splitter.chunk_overlap ({}) must be smaller than splitter.chunk_size ({})",
                self.splitter.chunk_overlap,
                self.splitter.chunk_size
            );
        }
        Ok(())
    }
}
