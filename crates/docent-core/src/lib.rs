//! Configuration, grounded answer composition, and the document service.

pub mod answer;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod service;

pub use answer::{Answer, AnswerComposer};
pub use config::Config;
pub use error::ServiceError;
pub use service::DocumentService;
