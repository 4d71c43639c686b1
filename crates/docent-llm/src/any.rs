#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;

use crate::error::LlmError;
use crate::provider::{GenerationParams, LlmProvider, Message};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            AnyProvider::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

/// Runtime-selected provider backend.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl LlmProvider for AnyProvider {
    async fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.generate(messages, params).await)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    fn supports_embeddings(&self) -> bool {
        delegate_provider!(self, |p| p.supports_embeddings())
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_name() {
        let p = AnyProvider::Ollama(OllamaProvider::new(
            "http://localhost:11434",
            "llama3".into(),
            "nomic-embed-text".into(),
        ));
        assert_eq!(p.name(), "ollama");

        let p = AnyProvider::OpenAi(OpenAiProvider::new(
            "k".into(),
            "https://api.openai.com/v1".into(),
            "gpt-3.5-turbo".into(),
            None,
        ));
        assert_eq!(p.name(), "openai");
        assert!(!p.supports_embeddings());
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn delegates_to_mock() {
        let p = AnyProvider::Mock(MockProvider::default().with_embedding(vec![0.5; 3]));
        assert_eq!(p.embed("x").await.unwrap(), vec![0.5; 3]);
        let out = p
            .generate(&[Message::user("q")], GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(out, "mock response");
    }
}
