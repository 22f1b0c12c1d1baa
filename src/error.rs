//! Error types for shardrop

use thiserror::Error;

/// Result type alias for shardrop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, fetching or proving
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("No allocation for {address} in shard {shard}")]
    UnknownAddress { address: String, shard: String },

    #[error("Shard not found: {0}")]
    ShardNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to open sharded tree: {0}")]
    Construction(String),

    /// The entry exists in the manifest but not in the tree built from it.
    /// Only a broken publisher or a leaf encoding mismatch can cause this.
    #[error("Leaf {0} missing from shard tree")]
    LeafNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Transient failures the caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}
