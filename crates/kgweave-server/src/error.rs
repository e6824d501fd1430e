//! Error types for the kgweave server
//!
//! This module contains the error types used throughout the server.

use chrono::{DateTime, Utc};
use kgweave_content_store::DocumentStoreError;
use kgweave_core::GraphError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// The document store refused the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Restore-to-time found nothing old enough
    #[error("No revision of document {document_id} exists at or before {timestamp}")]
    NoRevisionFound {
        document_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Import payload has neither accepted shape
    #[error("Malformed import: {0}")]
    MalformedImport(String),

    /// The completion provider failed or answered with an error
    #[error("Completion error: {0}")]
    CompletionError(String),

    /// An outgoing request never got a response
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Document store error
    #[error("Document store error: {0}")]
    DocumentStoreError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

// Implement conversions from other error types
impl From<DocumentStoreError> for ServerError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::NotFound(id) => ServerError::NotFound(format!("Document {}", id)),
            DocumentStoreError::PermissionDenied(msg) => ServerError::PermissionDenied(msg),
            DocumentStoreError::NoRevisionFound { document_id, timestamp } => {
                ServerError::NoRevisionFound { document_id, timestamp }
            }
            DocumentStoreError::Network(msg) => ServerError::NetworkError(msg),
            DocumentStoreError::ConfigurationError(msg) => ServerError::ConfigError(msg),
            _ => ServerError::DocumentStoreError(format!("{}", err)),
        }
    }
}

impl From<GraphError> for ServerError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::MalformedImport(msg) => ServerError::MalformedImport(msg),
            GraphError::MalformedInput { .. } => ServerError::ValidationError(format!("{}", err)),
            GraphError::Serialization(e) => ServerError::InternalError(format!("JSON error: {}", e)),
        }
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        ServerError::NetworkError(format!("HTTP request error: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(format!("Error: {}", err))
    }
}
