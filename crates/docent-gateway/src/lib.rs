//! HTTP gateway for document ingestion, semantic search and grounded answers.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use router::build_router;
pub use server::GatewayServer;
