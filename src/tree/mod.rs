//! Sorted-pair Merkle trees
//!
//! Every internal node hashes its two children in ascending order, so:
//! - the root depends only on the set of leaves, not their order
//! - proofs are plain sibling lists with no left/right flags
//!
//! The same rule links shard roots into the global root, so a full proof is
//! just a shard-local path followed by the shard's linking path.

mod hasher;
mod proof;
mod shard_tree;

pub use hasher::{hash_leaf, hash_pair, process_proof, verify_proof};
pub use proof::get_entry_proof_index;
pub use shard_tree::ShardMerkleTree;
