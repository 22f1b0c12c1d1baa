//! Publisher-side construction of the sharded commitment
//!
//! Buckets entries by shard, builds one tree per shard, links the shard
//! roots under a top-level tree and records each shard's linking path. The
//! result can be written out as the `root.json` + `<shard>.json` layout that
//! [`ShardedMerkleTree`](crate::ShardedMerkleTree) consumes.

use std::collections::{btree_map, BTreeMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::model::{validate_shard_nybbles, Address, Balance, Entry, GlobalRoot, Shard, ShardId};
use crate::tree::{hash_leaf, ShardMerkleTree};
use crate::{Error, Result};

/// File name of the root manifest
pub const ROOT_FILE: &str = "root.json";

/// Collects entries and produces a [`Distribution`]
#[derive(Debug)]
pub struct TreeBuilder {
    shard_nybbles: u8,
    entries: BTreeMap<Address, Entry>,
}

impl TreeBuilder {
    pub fn new(shard_nybbles: u8) -> Result<Self> {
        validate_shard_nybbles(shard_nybbles)?;
        Ok(TreeBuilder {
            shard_nybbles,
            entries: BTreeMap::new(),
        })
    }

    /// Add one allocation. An address may only appear once.
    pub fn insert(&mut self, address: Address, entry: Entry) -> Result<()> {
        match self.entries.entry(address) {
            btree_map::Entry::Occupied(_) => Err(Error::InvalidInput(format!(
                "duplicate allocation for {}",
                address
            ))),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (Address, Entry)>) -> Result<()> {
        for (address, entry) in entries {
            self.insert(address, entry)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build every shard tree and the linking tree above them
    pub fn build(self) -> Result<Distribution> {
        let mut buckets: BTreeMap<ShardId, Shard> = BTreeMap::new();
        let mut total = Balance::zero();

        for (address, entry) in self.entries {
            total = total.checked_add(entry.balance).ok_or_else(|| {
                Error::InvalidInput("total balance overflows 256 bits".into())
            })?;
            let id = address.shard_id(self.shard_nybbles)?;
            buckets.entry(id).or_default().entries.insert(address, entry);
        }

        let shard_roots: BTreeMap<ShardId, _> = buckets
            .iter()
            .map(|(id, shard)| {
                let tree = ShardMerkleTree::from_leaves(
                    shard.entries.iter().map(|(a, e)| hash_leaf(a, e)),
                );
                debug!(shard = %id, entries = shard.len(), root = %tree.root(), "built shard tree");
                (id.clone(), tree.root())
            })
            .collect();

        let top = ShardMerkleTree::from_leaves(shard_roots.values().copied());
        for (id, shard) in buckets.iter_mut() {
            shard.proof = top.proof(&shard_roots[id])?;
        }

        let root = GlobalRoot {
            root: top.root(),
            shard_nybbles: self.shard_nybbles,
            total,
        };
        info!(
            root = %root.root,
            shards = buckets.len(),
            total = %root.total,
            "built sharded distribution"
        );

        Ok(Distribution {
            root,
            shards: buckets,
        })
    }
}

/// Everything a publisher distributes: the root manifest and one manifest
/// per shard, each carrying its linking proof.
#[derive(Clone, Debug)]
pub struct Distribution {
    pub root: GlobalRoot,
    pub shards: BTreeMap<ShardId, Shard>,
}

impl Distribution {
    pub fn shard(&self, id: &ShardId) -> Option<&Shard> {
        self.shards.get(id)
    }

    /// Number of entries across all shards
    pub fn entry_count(&self) -> usize {
        self.shards.values().map(Shard::len).sum()
    }

    /// Write `root.json` and `<shard>.json` files into `dir`
    pub fn write_to_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        write_file_atomic(&dir.join(ROOT_FILE), &serde_json::to_string_pretty(&self.root)?)?;
        for (id, shard) in &self.shards {
            write_file_atomic(&dir.join(id.file_name()), &serde_json::to_string(shard)?)?;
        }
        info!(dir = %dir.display(), shards = self.shards.len(), "wrote manifests");
        Ok(())
    }
}

/// Write through a temp file and rename so readers never see partial JSON
fn write_file_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
