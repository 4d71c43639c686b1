use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use docent_core::DocumentService;
use docent_llm::LlmProvider;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{add_document_handler, ask_handler, health_handler, search_handler};
use super::server::AppState;

/// Routes under `/api`, with request bodies capped at `max_body_size` bytes.
pub fn build_router<P: LlmProvider + 'static>(
    service: Arc<DocumentService<P>>,
    max_body_size: usize,
) -> Router {
    let state = AppState {
        service,
        started_at: Instant::now(),
    };

    let chat = Router::new()
        .route("/documents", post(add_document_handler::<P>))
        .route("/ask", post(ask_handler::<P>))
        .route("/search", post(search_handler::<P>))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/api/health", get(health_handler::<P>))
        .nest("/api/chat", chat)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
