//! Leaf encoding and the sorted-pair node rule
//!
//! Both must match the on-chain verifier byte for byte.

use crate::model::{Address, Entry, Hash32};

/// `keccak256(abi.encodePacked(address, uint256 balance))`
pub fn hash_leaf(address: &Address, entry: &Entry) -> Hash32 {
    Hash32::keccak_many(&[address.as_bytes(), &entry.balance_bytes()])
}

/// Parent of two nodes: the smaller value goes first
pub fn hash_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    if a <= b {
        Hash32::keccak_many(&[a.as_bytes(), b.as_bytes()])
    } else {
        Hash32::keccak_many(&[b.as_bytes(), a.as_bytes()])
    }
}

/// Fold a proof onto a leaf, returning the implied root
pub fn process_proof(leaf: Hash32, proof: &[Hash32]) -> Hash32 {
    proof.iter().fold(leaf, |acc, sibling| hash_pair(&acc, sibling))
}

/// True if `proof` links `leaf` to `root`
pub fn verify_proof(leaf: Hash32, proof: &[Hash32], root: &Hash32) -> bool {
    process_proof(leaf, proof) == *root
}
