//! Ordered sibling paths

use serde::{Deserialize, Serialize};
use std::ops::Deref;

use super::Hash32;

/// Sibling hashes from a leaf up to a root, nearest sibling first.
///
/// No left/right markers are stored; the sorted-pair rule makes them
/// unnecessary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proof(Vec<Hash32>);

impl Proof {
    pub fn new(path: Vec<Hash32>) -> Self {
        Proof(path)
    }

    /// Append another path, e.g. a shard's link to the global root
    pub fn extend_from(&mut self, tail: &Proof) {
        self.0.extend_from_slice(&tail.0);
    }

    /// Hex strings, the format external verifiers consume
    pub fn to_hex(&self) -> Vec<String> {
        self.0.iter().map(Hash32::to_hex).collect()
    }

    pub fn from_hex<S: AsRef<str>>(items: &[S]) -> crate::Result<Self> {
        items
            .iter()
            .map(|s| Hash32::from_hex(s.as_ref()))
            .collect::<crate::Result<Vec<_>>>()
            .map(Proof)
    }
}

impl Deref for Proof {
    type Target = [Hash32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Hash32>> for Proof {
    fn from(path: Vec<Hash32>) -> Self {
        Proof(path)
    }
}
