//! Binary Merkle tree over one shard's leaves

use super::hasher::hash_pair;
use crate::model::{Hash32, Proof};
use crate::{Error, Result};

/// A layered Merkle tree using sorted-pair hashing.
///
/// Leaves are sorted before the tree is built, so any permutation of the
/// same leaf set yields the same root. Pairs are hashed low-first. When a
/// layer has an odd count, the trailing node is promoted unchanged and
/// contributes no sibling to proofs at that layer.
///
/// Layer 0 holds the sorted leaves; the last layer holds the root.
#[derive(Clone, Debug)]
pub struct ShardMerkleTree {
    layers: Vec<Vec<Hash32>>,
}

impl ShardMerkleTree {
    /// Build a tree from a set of leaves in any order
    pub fn from_leaves(leaves: impl IntoIterator<Item = Hash32>) -> Self {
        let mut base: Vec<Hash32> = leaves.into_iter().collect();
        base.sort_unstable();

        let mut layers = vec![base];
        while layers.last().map_or(false, |layer| layer.len() > 1) {
            let current = &layers[layers.len() - 1];
            let next: Vec<Hash32> = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    [odd] => *odd,
                    _ => unreachable!("chunks(2) yields one or two items"),
                })
                .collect();
            layers.push(next);
        }

        ShardMerkleTree { layers }
    }

    /// Root hash; `Hash32::ZERO` for an empty tree
    pub fn root(&self) -> Hash32 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or(Hash32::ZERO)
    }

    /// Sibling path from `leaf` to the root
    pub fn proof(&self, leaf: &Hash32) -> Result<Proof> {
        let leaves = &self.layers[0];
        let mut index = leaves.partition_point(|h| h < leaf);
        if leaves.get(index) != Some(leaf) {
            return Err(Error::LeafNotFound(leaf.to_hex()));
        }

        let mut path = Vec::with_capacity(self.depth());
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = index ^ 1;
            if sibling < layer.len() {
                path.push(layer[sibling]);
            }
            index /= 2;
        }
        Ok(Proof::new(path))
    }

    pub fn contains(&self, leaf: &Hash32) -> bool {
        self.layers[0].binary_search(leaf).is_ok()
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// Number of hashing layers above the leaves
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Leaves in tree order (ascending)
    pub fn leaves(&self) -> &[Hash32] {
        &self.layers[0]
    }
}
