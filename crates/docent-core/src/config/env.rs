use std::str::FromStr;

use super::{Config, Secret};

/// Read and parse an env var. Unparseable values are logged and ignored.
fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {raw}");
            None
        }
    }
}

/// Parse a serde enum (`"openai"`, `"qdrant"`, ...) from an env var.
fn parse_kind<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    if let Ok(kind) = serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase())) {
        Some(kind)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_store();
        self.apply_env_overrides_retrieval();
        self.apply_env_overrides_runtime();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Some(kind) = parse_kind("DOCENT_LLM_PROVIDER") {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_OPENAI_API_KEY")
            && !v.trim().is_empty()
        {
            self.secrets.openai_api_key = Some(Secret::new(v.trim()));
        }
    }

    fn apply_env_overrides_store(&mut self) {
        if let Some(kind) = parse_kind("DOCENT_VECTOR_STORE_BACKEND") {
            self.vector_store.backend = kind;
        }
        if let Ok(v) = std::env::var("DOCENT_QDRANT_URL") {
            self.vector_store.url = v;
        }
        if let Ok(v) = std::env::var("DOCENT_QDRANT_COLLECTION") {
            self.vector_store.collection = v;
        }
        if let Some(size) = parse_var("DOCENT_VECTOR_SIZE") {
            self.vector_store.vector_size = size;
        }
        if let Some(size) = parse_var("DOCENT_CHUNK_SIZE") {
            self.splitter.chunk_size = size;
        }
        if let Some(overlap) = parse_var("DOCENT_CHUNK_OVERLAP") {
            self.splitter.chunk_overlap = overlap;
        }
    }

    fn apply_env_overrides_retrieval(&mut self) {
        if let Some(t) = parse_var::<f32>("DOCENT_SCORE_THRESHOLD") {
            self.retrieval.score_threshold = t;
        }
        if let Some(n) = parse_var("DOCENT_SEARCH_LIMIT") {
            self.retrieval.search_limit = n;
        }
        if let Some(n) = parse_var("DOCENT_ANSWER_LIMIT") {
            self.retrieval.answer_limit = n;
        }
        if let Some(t) = parse_var("DOCENT_TEMPERATURE") {
            self.retrieval.temperature = t;
        }
        if let Some(n) = parse_var("DOCENT_MAX_ANSWER_TOKENS") {
            self.retrieval.max_answer_tokens = n;
        }
    }

    fn apply_env_overrides_runtime(&mut self) {
        if let Some(ms) = parse_var("DOCENT_EMBED_RATE_LIMIT_MS") {
            self.embedding.rate_limit_ms = ms;
        }
        if let Some(burst) = parse_var("DOCENT_EMBED_BURST") {
            self.embedding.burst = burst;
        }
        if let Some(n) = parse_var("DOCENT_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = n;
        }
        if let Some(secs) = parse_var("DOCENT_RETRY_TIMEOUT_SECS") {
            self.retry.timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("DOCENT_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Some(port) = parse_var("DOCENT_GATEWAY_PORT") {
            self.gateway.port = port;
        }
        if let Some(size) = parse_var("DOCENT_GATEWAY_MAX_BODY_SIZE") {
            self.gateway.max_body_size = size;
        }
        if let Ok(v) = std::env::var("DOCENT_LOG_LEVEL") {
            self.log_level = v;
        }
    }
}
