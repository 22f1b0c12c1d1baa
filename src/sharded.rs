//! Runtime proof service over a published sharded distribution
//!
//! Lifecycle is two-phase: configure a [`TreeLoader`] synchronously, then
//! `open().await` it to resolve the root manifest. Shards are fetched on
//! first use and kept for the life of the tree.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::model::{shard_id_for, Address, Balance, Entry, GlobalRoot, Hash32, Proof, Shard, ShardId};
use crate::remote::ShardFetcher;
use crate::tree::{hash_leaf, verify_proof, ShardMerkleTree};
use crate::{Error, Result};

/// A fetched shard together with the tree built from its entries
#[derive(Debug)]
struct LoadedShard {
    shard: Shard,
    tree: ShardMerkleTree,
}

/// One slot per shard id. The cell stays empty until a fetch succeeds, so
/// failed or cancelled loads are retried by the next request.
type ShardSlot = Arc<OnceCell<Arc<LoadedShard>>>;

/// Configuration phase of a [`ShardedMerkleTree`]
pub struct TreeLoader<F> {
    fetcher: F,
    fetch_timeout: Duration,
}

impl<F: ShardFetcher> TreeLoader<F> {
    pub fn new(fetcher: F) -> Self {
        TreeLoader {
            fetcher,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Bound each manifest fetch; expiry surfaces as a network error
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Resolve the root manifest. Any failure is a construction error.
    pub async fn open(self) -> Result<ShardedMerkleTree<F>> {
        let root = with_timeout(self.fetch_timeout, self.fetcher.fetch_root())
            .await
            .and_then(|root| root.validate().map(|_| root))
            .map_err(|e| {
                warn!(error = %e, "failed to resolve root manifest");
                match e {
                    Error::Construction(msg) => Error::Construction(msg),
                    other => Error::Construction(other.to_string()),
                }
            })?;

        info!(
            root = %root.root,
            shard_nybbles = root.shard_nybbles,
            total = %root.total,
            "resolved root manifest"
        );
        Ok(ShardedMerkleTree::assemble(self.fetcher, root, self.fetch_timeout))
    }
}

/// Answers proof requests against a published global root
pub struct ShardedMerkleTree<F> {
    fetcher: F,
    root: GlobalRoot,
    fetch_timeout: Duration,
    shards: Mutex<HashMap<ShardId, ShardSlot>>,
}

impl<F: ShardFetcher> ShardedMerkleTree<F> {
    /// Start configuring a tree backed by `fetcher`
    pub fn loader(fetcher: F) -> TreeLoader<F> {
        TreeLoader::new(fetcher)
    }

    /// Skip root resolution when the root manifest is already known
    pub fn with_root(fetcher: F, root: GlobalRoot) -> Result<Self> {
        root.validate()
            .map_err(|e| Error::Construction(e.to_string()))?;
        Ok(Self::assemble(
            fetcher,
            root,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        ))
    }

    /// Bound each shard fetch; expiry surfaces as a network error
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    fn assemble(fetcher: F, root: GlobalRoot, fetch_timeout: Duration) -> Self {
        ShardedMerkleTree {
            fetcher,
            root,
            fetch_timeout,
            shards: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> Hash32 {
        self.root.root
    }

    pub fn shard_nybbles(&self) -> u8 {
        self.root.shard_nybbles
    }

    pub fn total(&self) -> Balance {
        self.root.total
    }

    pub fn global_root(&self) -> &GlobalRoot {
        &self.root
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Shards currently loaded, in no particular order
    pub fn cached_shards(&self) -> Vec<ShardId> {
        self.shards
            .lock()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// The entry for `address` and its full proof: the shard-local path
    /// followed by the shard's link to the global root.
    pub async fn get_proof(&self, address: &str) -> Result<(Entry, Proof)> {
        let id = shard_id_for(address, self.root.shard_nybbles)?;
        let parsed = Address::parse(address)?;

        let loaded = match self.load_shard(&id).await {
            Ok(loaded) => loaded,
            Err(Error::ShardNotFound(_)) => {
                debug!(address = %parsed, shard = %id, "no shard for address");
                return Err(Error::UnknownAddress {
                    address: parsed.to_hex(),
                    shard: id.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let entry = *loaded
            .shard
            .entries
            .get(&parsed)
            .ok_or_else(|| Error::UnknownAddress {
                address: parsed.to_hex(),
                shard: id.to_string(),
            })?;

        let leaf = hash_leaf(&parsed, &entry);
        let mut proof = loaded.tree.proof(&leaf).map_err(|e| {
            error!(address = %parsed, shard = %id, leaf = %leaf, "entry missing from its shard tree");
            e
        })?;
        proof.extend_from(&loaded.shard.proof);

        debug!(address = %parsed, shard = %id, proof_len = proof.len(), "generated proof");
        Ok((entry, proof))
    }

    /// Recombine `entry` with `proof` and compare against the global root
    pub fn verify(&self, address: &Address, entry: &Entry, proof: &Proof) -> bool {
        verify_proof(hash_leaf(address, entry), proof, &self.root.root)
    }

    /// Fetch and build a shard at most once, even under concurrent requests
    async fn load_shard(&self, id: &ShardId) -> Result<Arc<LoadedShard>> {
        let slot: ShardSlot = self.shards.lock().entry(id.clone()).or_default().clone();

        let result = slot
            .get_or_try_init(move || async move {
                let shard = with_timeout(self.fetch_timeout, self.fetcher.fetch_shard(id))
                    .await
                    .map_err(|e| {
                        warn!(shard = %id, error = %e, "shard fetch failed");
                        e
                    })?;
                let tree = ShardMerkleTree::from_leaves(
                    shard.entries.iter().map(|(a, e)| hash_leaf(a, e)),
                );
                debug!(shard = %id, entries = shard.len(), root = %tree.root(), "fetched shard");
                Ok::<_, Error>(Arc::new(LoadedShard { shard, tree }))
            })
            .await;

        match result {
            Ok(loaded) => Ok(Arc::clone(loaded)),
            Err(e) => {
                self.release_slot(id, &slot);
                Err(e)
            }
        }
    }

    /// Drop an empty slot after a failed load unless another request holds it
    fn release_slot(&self, id: &ShardId, slot: &ShardSlot) {
        let mut shards = self.shards.lock();
        let unused = shards
            .get(id)
            .map_or(false, |held| Arc::ptr_eq(held, slot) && Arc::strong_count(slot) == 2);
        if unused && !slot.initialized() {
            shards.remove(id);
        }
    }
}

async fn with_timeout<T>(limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Network(format!("fetch timed out after {:?}", limit)))?
}
