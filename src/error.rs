//! Error types for the storage, inference, catalog, and gateway layers.

use std::path::PathBuf;

/// Errors from the durable key-value backend behind the analysis history.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Backing medium cannot be opened at all.
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },

    /// A write was rejected (quota, disk full, permissions).
    #[error("storage write failed for key '{key}': {reason}")]
    WriteFailed { key: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the external detection service client.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// Endpoint answered with a non-success status.
    #[error("{url} returned status {status}")]
    Endpoint { url: String, status: u16 },

    /// Endpoint answered with a body we cannot use.
    #[error("unexpected response from {url}: {reason}")]
    Response { url: String, reason: String },

    /// The input image could not be read.
    #[error("failed to read image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Transport-level HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from the model catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Requested path escapes the models root.
    #[error("invalid folder path: {0}")]
    InvalidPath(String),

    /// Requested folder does not exist.
    #[error("folder not found: {0}")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the HTTP gateway.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listener.
    #[error("failed to bind to {addr}: {reason}")]
    StartupFailed { addr: String, reason: String },

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
