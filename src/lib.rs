//! # shardrop
//!
//! Sharded Merkle commitments for large token distributions.
//!
//! A publisher splits allocations into shards by address prefix, builds a
//! sorted-pair Merkle tree per shard and links the shard roots under one
//! global root. Clients fetch only the shard that holds their address and
//! get back a proof any sorted-pair verifier (such as an on-chain
//! distributor contract) can check against the published root.
//!
//! ## Core Concepts
//!
//! - **Entry**: an address's allocated balance
//! - **Leaf**: `keccak256(address ++ uint256 balance)`
//! - **Shard**: entries sharing an address prefix, plus a linking proof
//! - **Global root**: the commitment over all shard roots
//!
//! ## Example
//!
//! ```ignore
//! use shardrop::{DirShardFetcher, ShardedMerkleTree};
//!
//! let tree = ShardedMerkleTree::loader(DirShardFetcher::new("./out"))
//!     .open()
//!     .await?;
//! let (entry, proof) = tree
//!     .get_proof("0xaa01000000000000000000000000000000000001")
//!     .await?;
//! ```

pub mod builder;
pub mod config;
pub mod model;
pub mod remote;
pub mod tree;

mod error;
mod sharded;

pub use builder::{Distribution, TreeBuilder, ROOT_FILE};
pub use config::Config;
pub use error::{Error, Result};
pub use model::{shard_id_for, Address, Balance, Entry, GlobalRoot, Hash32, Proof, Shard, ShardId};
#[cfg(feature = "http")]
pub use remote::HttpShardFetcher;
pub use remote::{DirShardFetcher, MemoryShardFetcher, ShardFetcher};
pub use sharded::{ShardedMerkleTree, TreeLoader};
pub use tree::{get_entry_proof_index, hash_leaf, hash_pair, verify_proof, ShardMerkleTree};
