use ollama_rs::Ollama;
use ollama_rs::error::OllamaError;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::models::ModelOptions;

use crate::error::LlmError;
use crate::provider::{GenerationParams, LlmProvider, Message, Role};

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    model: String,
    embedding_model: String,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, model: String, embedding_model: String) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
            embedding_model,
        }
    }

    /// Check if Ollama is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection to Ollama fails.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        self.client.list_local_models().await.map_err(|e| {
            tracing::debug!("ollama health check error: {e}");
            LlmError::Unavailable
        })?;
        Ok(())
    }
}

impl LlmProvider for OllamaProvider {
    async fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<String, LlmError> {
        let ollama_messages: Vec<ChatMessage> = messages.iter().map(convert_message).collect();
        let options = ModelOptions::default()
            .temperature(params.temperature)
            .num_predict(i32::try_from(params.max_tokens).unwrap_or(i32::MAX));

        let request =
            ChatMessageRequest::new(self.model.clone(), ollama_messages).options(options);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| map_ollama_error("chat", e))?;

        Ok(response.message.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::from(text),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| map_ollama_error("embedding", e))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse {
                provider: "ollama".into(),
            })
    }

    fn supports_embeddings(&self) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

/// ollama-rs drops the HTTP status of failed replies, so classification goes by
/// error kind: transport failures and server replies are retryable, a missing
/// model or an unparseable body is not.
fn map_ollama_error(operation: &str, err: OllamaError) -> LlmError {
    let server = |message: String| LlmError::Server {
        provider: "ollama".into(),
        message: format!("{operation}: {message}"),
    };
    match err {
        OllamaError::ReqwestError(e) => {
            tracing::error!("ollama {operation} transport error: {e}");
            server(e.to_string())
        }
        OllamaError::Other(body) if body.contains("not found") => {
            LlmError::Other(format!("Ollama {operation} request failed: {body}"))
        }
        OllamaError::Other(body) => {
            tracing::error!("ollama {operation} request failed: {body}");
            server(body)
        }
        OllamaError::InternalError(e) => server(e.message),
        OllamaError::JsonError(e) => LlmError::Json(e),
        OllamaError::ToolCallError(e) => LlmError::Other(format!("Ollama {operation}: {e}")),
    }
}

fn convert_message(msg: &Message) -> ChatMessage {
    let text = msg.content.clone();
    match msg.role {
        Role::System => ChatMessage::system(text),
        Role::Assistant => ChatMessage::assistant(text),
        Role::User => ChatMessage::user(text),
    }
}

fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            let host = url[..colon_pos].to_string();
            return (host, port);
        }
    }
    (url.to_string(), 11434)
}
