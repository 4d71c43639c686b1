use std::fmt;
use std::time::Duration;

use docent_llm::RetryPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub splitter: SplitterSettings,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            llm: LlmConfig::default(),
            vector_store: VectorStoreConfig::default(),
            splitter: SplitterSettings::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            retry: RetryConfig::default(),
            gateway: GatewayConfig::default(),
            secrets: ResolvedSecrets::default(),
        }
    }
}

/// LLM provider backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Qdrant,
    Memory,
}

impl VectorBackend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qdrant => "qdrant",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_backend")]
    pub backend: VectorBackend,
    /// Qdrant gRPC endpoint.
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_vector_size")]
    pub vector_size: u64,
}

fn default_backend() -> VectorBackend {
    VectorBackend::Qdrant
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection() -> String {
    "documents".into()
}

fn default_vector_size() -> u64 {
    1536
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_qdrant_url(),
            collection: default_collection(),
            vector_size: default_vector_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitterSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// Result count for plain searches.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Result count fed into answer generation.
    #[serde(default = "default_answer_limit")]
    pub answer_limit: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_answer_tokens")]
    pub max_answer_tokens: u32,
}

fn default_score_threshold() -> f32 {
    0.6
}

fn default_search_limit() -> usize {
    5
}

fn default_answer_limit() -> usize {
    3
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_answer_tokens() -> u32 {
    500
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            search_limit: default_search_limit(),
            answer_limit: default_answer_limit(),
            temperature: default_temperature(),
            max_answer_tokens: default_max_answer_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Milliseconds per refilled token. Zero disables rate limiting.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_rate_limit_ms() -> u64 {
    100
}

fn default_burst() -> u32 {
    1
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit_ms(),
            burst: default_burst(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    #[serde(default = "default_gateway_max_body")]
    pub max_body_size: usize,
}

fn default_gateway_bind() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_max_body() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            max_body_size: default_gateway_max_body(),
        }
    }
}

/// A credential that never appears in `Debug` or `Display` output.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Credentials read from the environment only.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}
