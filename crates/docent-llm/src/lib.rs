//! Embedding and generation provider abstraction and backend implementations.

pub mod any;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod rate_limit;
pub mod retry;

pub use error::LlmError;
pub use provider::{GenerationParams, LlmProvider, Message, Role};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
