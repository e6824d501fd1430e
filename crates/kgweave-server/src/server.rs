//! Main kgweave server implementation

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use kgweave_content_store::{DocumentVersionManager, VersionedBlobStore};
use kgweave_core::GraphBuilder;

use crate::completion::CompletionSource;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::session::GraphSession;

/// Main server implementation
#[derive(Debug, Clone)]
pub struct KgweaveServer {
    /// Configuration
    pub config: ServerConfig,

    /// The single editing session
    session: Arc<GraphSession>,

    /// Document store, shared with the session's document manager
    document_store: Arc<dyn VersionedBlobStore>,
}

impl KgweaveServer {
    /// Create a new KgweaveServer
    pub fn new(
        config: ServerConfig,
        document_store: Arc<dyn VersionedBlobStore>,
        completion: Arc<dyn CompletionSource>,
    ) -> ServerResult<Self> {
        let builder = GraphBuilder::new(config.color_rule()?);
        let session = GraphSession::new(builder, completion, DocumentVersionManager::new(document_store.clone()));
        Ok(Self {
            config,
            session: Arc::new(session),
            document_store,
        })
    }

    pub fn session(&self) -> &GraphSession {
        &self.session
    }

    /// Run the server until ctrl-c
    pub async fn run(self) -> ServerResult<()> {
        info!("Starting kgweave server");

        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| ServerError::ConfigError(format!("Invalid bind address: {}", e)))?;

        // Build the API router
        let app = crate::api::build_router(Arc::new(self));

        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }

    /// Check document store health
    pub async fn check_document_store_health(&self) -> ServerResult<bool> {
        match self.document_store.health_check().await {
            Ok(()) => Ok(true),
            Err(err) => {
                error!(?err, "Document store health check failed");
                Ok(false)
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(?err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
