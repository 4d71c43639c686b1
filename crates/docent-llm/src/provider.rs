use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a single completion request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

pub trait LlmProvider: Send + Sync {
    /// Produce a completion for `messages` under the given sampling parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Map `text` to a fixed-dimension embedding vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider does not support embeddings or the call fails.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    fn supports_embeddings(&self) -> bool;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn message_constructors() {
        let m = Message::user("hi");
        assert_eq!(m.role, Role::User);
        assert_eq!(m.content, "hi");
        assert_eq!(Message::system("rules").role, Role::System);
    }

    #[test]
    fn default_generation_params() {
        let p = GenerationParams::default();
        assert!((p.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(p.max_tokens, 500);
    }
}
