//! Wiring from a loaded [`Config`] to a ready [`DocumentService`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use docent_llm::any::AnyProvider;
use docent_llm::ollama::OllamaProvider;
use docent_llm::openai::OpenAiProvider;
use docent_llm::{GenerationParams, LlmProvider, RateLimiter};
use docent_memory::document::{PipelineConfig, RetrievalPipeline, SplitterConfig, TextSplitter};
use docent_memory::{Embedder, InMemoryVectorStore, QdrantOps, VectorStore};

use crate::answer::AnswerComposer;
use crate::config::{Config, ProviderKind, VectorBackend};
use crate::service::DocumentService;

/// # Errors
///
/// Returns an error if the OpenAI backend is selected without `DOCENT_OPENAI_API_KEY`.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    match config.llm.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &config.llm.base_url,
            config.llm.model.clone(),
            config.llm.embedding_model.clone(),
        ))),
        ProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .context("DOCENT_OPENAI_API_KEY not found in environment")?;
            Ok(AnyProvider::OpenAi(OpenAiProvider::new(
                api_key.expose().to_owned(),
                config.llm.base_url.clone(),
                config.llm.model.clone(),
                Some(config.llm.embedding_model.clone()),
            )))
        }
    }
}

/// # Errors
///
/// Returns an error if the Qdrant client cannot be built from the configured URL.
pub fn create_vector_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.vector_store.backend {
        VectorBackend::Qdrant => {
            let ops = QdrantOps::new(&config.vector_store.url).with_context(|| {
                format!("failed to create Qdrant client for {}", config.vector_store.url)
            })?;
            Ok(Arc::new(ops))
        }
        VectorBackend::Memory => {
            tracing::warn!("using in-memory vector store, documents are lost on exit");
            Ok(Arc::new(InMemoryVectorStore::new()))
        }
    }
}

/// Refuse providers that cannot embed, since ingestion and retrieval both need vectors.
///
/// # Errors
///
/// Returns an error if `provider` reports no embedding support.
pub fn ensure_embeddings<P: LlmProvider>(provider: &P) -> anyhow::Result<()> {
    if !provider.supports_embeddings() {
        bail!("{} provider does not support embeddings", provider.name());
    }
    Ok(())
}

/// Startup reachability check. Only warns: Ollama may come up after the gateway.
pub async fn check_provider_health(provider: &AnyProvider) {
    let AnyProvider::Ollama(ollama) = provider else {
        return;
    };
    match ollama.health_check().await {
        Ok(()) => tracing::debug!("ollama is reachable"),
        Err(e) => tracing::warn!("ollama health check failed, requests will retry: {e}"),
    }
}

/// Assemble the service from explicit collaborators. Does not touch the store.
pub fn build_service_with<P: LlmProvider>(
    config: &Config,
    provider: Arc<P>,
    store: Arc<dyn VectorStore>,
) -> DocumentService<P> {
    let limiter = RateLimiter::new(
        config.embedding.burst,
        Duration::from_millis(config.embedding.rate_limit_ms),
    );
    let retry = config.retry.policy();
    let embedder = Embedder::new(Arc::clone(&provider))
        .with_rate_limiter(Arc::new(limiter))
        .with_retry_policy(retry.clone());

    let splitter = TextSplitter::new(SplitterConfig {
        chunk_size: config.splitter.chunk_size,
        chunk_overlap: config.splitter.chunk_overlap,
    });
    let pipeline = Arc::new(RetrievalPipeline::new(
        splitter,
        embedder,
        store,
        PipelineConfig {
            collection: config.vector_store.collection.clone(),
            vector_size: config.vector_store.vector_size,
            score_threshold: config.retrieval.score_threshold,
        },
    ));

    let composer = AnswerComposer::new(Arc::clone(&pipeline), provider)
        .with_retry_policy(retry)
        .with_answer_limit(config.retrieval.answer_limit)
        .with_generation_params(GenerationParams {
            temperature: config.retrieval.temperature,
            max_tokens: config.retrieval.max_answer_tokens,
        });

    DocumentService::new(pipeline, composer, config.retrieval.search_limit)
}

/// Validate the config, build the configured backends and make sure the
/// collection exists.
///
/// # Errors
///
/// Returns an error if the config is invalid, a backend cannot be created, or
/// the collection cannot be ensured.
pub async fn build_service(config: &Config) -> anyhow::Result<DocumentService<AnyProvider>> {
    config.validate()?;
    let provider = create_provider(config)?;
    ensure_embeddings(&provider)?;
    check_provider_health(&provider).await;
    tracing::info!(
        provider = provider.name(),
        model = %config.llm.model,
        backend = config.vector_store.backend.as_str(),
        collection = %config.vector_store.collection,
        "bootstrapping document service"
    );
    let store = create_vector_store(config)?;
    let service = build_service_with(config, Arc::new(provider), store);
    service
        .ensure_collection()
        .await
        .context("failed to initialize vector collection")?;
    Ok(service)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use docent_llm::mock::MockProvider;

    use super::*;
    use crate::config::Secret;
    use crate::service::{AddDocumentRequest, AskRequest, SearchRequest};

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.vector_store.backend = VectorBackend::Memory;
        config.vector_store.vector_size = 3;
        config.splitter.chunk_overlap = 0;
        config.embedding.rate_limit_ms = 0;
        config
    }

    #[test]
    fn create_provider_ollama() {
        let mut config = Config::load(Path::new("/nonexistent")).unwrap();
        config.llm.provider = ProviderKind::Ollama;
        let provider = create_provider(&config).unwrap();
        assert!(matches!(provider, AnyProvider::Ollama(_)));
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn create_provider_openai_without_api_key_errors() {
        let mut config = Config::default();
        config.llm.provider = ProviderKind::OpenAi;
        config.secrets.openai_api_key = None;
        let err = create_provider(&config).unwrap_err();
        assert!(err.to_string().contains("DOCENT_OPENAI_API_KEY not found"));
    }

    #[test]
    fn create_provider_openai_with_api_key() {
        let mut config = Config::default();
        config.secrets.openai_api_key = Some(Secret::new("sk-test"));
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert!(provider.supports_embeddings());
    }

    #[test]
    fn create_vector_store_memory() {
        let config = memory_config();
        assert!(create_vector_store(&config).is_ok());
    }

    #[tokio::test]
    async fn create_vector_store_qdrant_client_is_lazy() {
        let config = Config::default();
        assert!(create_vector_store(&config).is_ok());
    }

    #[test]
    fn provider_without_embeddings_is_rejected() {
        let mut provider = MockProvider::default();
        provider.supports_embeddings = false;
        let err = ensure_embeddings(&provider).unwrap_err();
        assert!(err.to_string().contains("mock provider does not support embeddings"));
        assert!(ensure_embeddings(&MockProvider::default()).is_ok());
    }

    #[tokio::test]
    async fn unreachable_ollama_only_warns() {
        let mut config = memory_config();
        config.llm.provider = ProviderKind::Ollama;
        config.llm.base_url = "http://127.0.0.1:1".into();
        let provider = create_provider(&config).unwrap();
        check_provider_health(&provider).await;
        let service = build_service(&config).await;
        assert!(service.is_ok());
    }

    #[tokio::test]
    async fn build_service_rejects_invalid_config() {
        let mut config = memory_config();
        config.retrieval.score_threshold = 2.0;
        assert!(build_service(&config).await.is_err());
    }

    #[tokio::test]
    async fn wired_service_answers_from_indexed_document() {
        let config = memory_config();
        let provider =
            Arc::new(MockProvider::with_responses(vec!["Paris.".into()]).with_embed_fn(|t| {
                if t.contains("Paris") {
                    vec![1.0, 0.0, 0.0]
                } else {
                    vec![0.0, 1.0, 0.0]
                }
            }));
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
        let service = build_service_with(&config, Arc::clone(&provider), store);
        service.ensure_collection().await.unwrap();

        let added = service
            .add_document(AddDocumentRequest {
                name: "Paris Facts".into(),
                content: "Paris is the capital of France.".into(),
                ..AddDocumentRequest::default()
            })
            .await;
        assert!(added.success, "{added:?}");

        let asked = service
            .ask_question(AskRequest {
                question: "Where is Paris?".into(),
            })
            .await;
        assert_eq!(asked.answer.as_deref(), Some("Paris."));

        let (_, params) = provider.generate_calls().remove(0);
        assert_eq!(params.max_tokens, config.retrieval.max_answer_tokens);

        let found = service
            .search_documents(SearchRequest {
                query: "Bread".into(),
                limit: None,
            })
            .await;
        assert_eq!(found.total_results, Some(0));
    }
}
