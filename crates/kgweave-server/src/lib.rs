//!
//! kgweave server - generates, merges and versions knowledge graphs over HTTP
//!
//! This module exports all the components of the server.

use std::sync::Arc;

use kgweave_content_store::{DriveBlobStore, InMemoryBlobStore, VersionedBlobStore};

/// API module
pub mod api;

/// Completion source module
pub mod completion;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

/// Server module
pub mod server;

/// Graph session module
pub mod session;

// Re-export key types
pub use completion::{CompletionSource, OpenRouterClient};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::KgweaveServer;
pub use session::GraphSession;

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    // Initialize logging
    init_logging(&config);

    // Create dependencies
    let document_store = create_document_store(&config)?;
    let completion: Arc<dyn CompletionSource> = Arc::new(OpenRouterClient::new(&config)?);

    // Create and run server
    let server = KgweaveServer::new(config, document_store, completion)?;
    server.run().await
}

/// Initialize logging
fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    // Create filter based on config
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Initialize subscriber
    let builder = fmt().with_env_filter(filter).with_target(true);
    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the document store selected by `document_store_url`
pub fn create_document_store(config: &ServerConfig) -> ServerResult<Arc<dyn VersionedBlobStore>> {
    if config.document_store_url.starts_with("memory://") {
        // Use in-memory store for development and testing
        tracing::info!("Using in-memory document store");
        Ok(Arc::new(InMemoryBlobStore::new()))
    } else if config.document_store_url.starts_with("drive://") {
        let token = config.drive_access_token.clone().ok_or_else(|| {
            ServerError::ConfigError("Missing DRIVE_ACCESS_TOKEN for drive:// document store".to_string())
        })?;
        tracing::info!("Using Google Drive document store at {}", config.drive_api_base_url);
        let store = DriveBlobStore::new(token, config.request_timeout())?.with_base_url(config.drive_api_base_url.clone());
        Ok(Arc::new(store))
    } else {
        Err(ServerError::ConfigError(format!(
            "Unsupported document store URL: {}",
            config.document_store_url
        )))
    }
}
