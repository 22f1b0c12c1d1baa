//! In-memory manifests, for tests and embedding

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::ShardFetcher;
use crate::builder::Distribution;
use crate::model::{GlobalRoot, Shard, ShardId};
use crate::{Error, Result};

/// Serves a [`Distribution`] from memory and counts shard fetches.
///
/// Latency and outages can be simulated to exercise the orchestrator's
/// caching under concurrency and failure.
pub struct MemoryShardFetcher {
    root: GlobalRoot,
    shards: BTreeMap<ShardId, Shard>,
    latency: Option<Duration>,
    offline: AtomicBool,
    fetches: Mutex<HashMap<ShardId, usize>>,
}

impl MemoryShardFetcher {
    pub fn new(distribution: Distribution) -> Self {
        MemoryShardFetcher {
            root: distribution.root,
            shards: distribution.shards,
            latency: None,
            offline: AtomicBool::new(false),
            fetches: Mutex::new(HashMap::new()),
        }
    }

    /// Sleep this long before answering each request
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// While offline every request fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// How many times `id` was requested, including failed attempts
    pub fn fetch_count(&self, id: &ShardId) -> usize {
        self.fetches.lock().get(id).copied().unwrap_or(0)
    }

    /// Shard requests across all ids
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }

    async fn simulate_network(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("simulated outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ShardFetcher for MemoryShardFetcher {
    async fn fetch_root(&self) -> Result<GlobalRoot> {
        self.simulate_network().await?;
        Ok(self.root.clone())
    }

    async fn fetch_shard(&self, id: &ShardId) -> Result<Shard> {
        *self.fetches.lock().entry(id.clone()).or_insert(0) += 1;
        self.simulate_network().await?;
        self.shards
            .get(id)
            .cloned()
            .ok_or_else(|| Error::ShardNotFound(id.to_string()))
    }
}

impl From<Distribution> for MemoryShardFetcher {
    fn from(distribution: Distribution) -> Self {
        MemoryShardFetcher::new(distribution)
    }
}
