use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use docent_core::DocumentService;
use docent_llm::LlmProvider;
use tokio::sync::watch;

use crate::error::GatewayError;
use crate::router::build_router;

pub(crate) struct AppState<P> {
    pub service: Arc<DocumentService<P>>,
    pub started_at: Instant,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            started_at: self.started_at,
        }
    }
}

pub struct GatewayServer<P> {
    addr: SocketAddr,
    max_body_size: usize,
    service: Arc<DocumentService<P>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<P: LlmProvider + 'static> GatewayServer<P> {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        service: Arc<DocumentService<P>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0, the API has no authentication");
        }

        Self {
            addr,
            max_body_size: 10 * 1024 * 1024,
            service,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Start the HTTP gateway server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let router = build_router(self.service, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use docent_core::Config;
    use docent_core::bootstrap::build_service_with;
    use docent_llm::mock::MockProvider;
    use docent_memory::{InMemoryVectorStore, VectorStore};

    use super::*;

    fn service() -> Arc<DocumentService<MockProvider>> {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
        Arc::new(build_service_with(
            &Config::default(),
            Arc::new(MockProvider::default()),
            store,
        ))
    }

    #[test]
    fn server_builder_chain() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 8090, service(), srx).with_max_body_size(512);
        assert_eq!(server.max_body_size, 512);
        assert_eq!(server.addr.port(), 8090);
    }

    #[test]
    fn server_invalid_bind_fallback() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("not_an_ip", 9999, service(), srx);
        assert_eq!(server.addr.port(), 9999);
        assert!(server.addr.ip().is_loopback());
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let (stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 0, service(), srx);
        let handle = tokio::spawn(server.serve());
        stx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }
}
