//! Manifest sources
//!
//! The orchestrator only sees the [`ShardFetcher`] trait, so it runs the
//! same against HTTP, a local directory, or memory.

mod dir;
#[cfg(feature = "http")]
mod http;
mod memory;

use async_trait::async_trait;

use crate::model::{GlobalRoot, Shard, ShardId};
use crate::Result;

pub use dir::DirShardFetcher;
#[cfg(feature = "http")]
pub use http::HttpShardFetcher;
pub use memory::MemoryShardFetcher;

/// Retrieves published manifests.
///
/// `fetch_shard` fails with `ShardNotFound` when no shard exists for the
/// prefix and with `Network` for anything transient.
#[async_trait]
pub trait ShardFetcher: Send + Sync {
    /// The root manifest (`root.json`)
    async fn fetch_root(&self) -> Result<GlobalRoot>;

    /// One shard manifest (`<shard>.json`)
    async fn fetch_shard(&self, id: &ShardId) -> Result<Shard>;
}

#[async_trait]
impl<F: ShardFetcher + ?Sized> ShardFetcher for std::sync::Arc<F> {
    async fn fetch_root(&self) -> Result<GlobalRoot> {
        (**self).fetch_root().await
    }

    async fn fetch_shard(&self, id: &ShardId) -> Result<Shard> {
        (**self).fetch_shard(id).await
    }
}

#[async_trait]
impl<F: ShardFetcher + ?Sized> ShardFetcher for Box<F> {
    async fn fetch_root(&self) -> Result<GlobalRoot> {
        (**self).fetch_root().await
    }

    async fn fetch_shard(&self, id: &ShardId) -> Result<Shard> {
        (**self).fetch_shard(id).await
    }
}
