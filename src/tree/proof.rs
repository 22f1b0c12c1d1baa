//! Recover a leaf's position from its proof

use super::hasher::hash_leaf;
use crate::model::{Address, Entry, Hash32};
use crate::{Error, Result};

/// Replays the sorted-pair rule across `proof` and returns the index it
/// implies for the entry's leaf.
///
/// At each step the running hash takes bit 0 if it sorts first (it is the
/// left child) and bit 1 otherwise. Bits are accumulated as
/// `index = index * 2 + bit`, the first proof element giving the most
/// significant bit.
///
/// This does not check the final hash against any root; pair it with
/// [`verify_proof`](super::verify_proof) for that.
pub fn get_entry_proof_index(address: &Address, entry: &Entry, proof: &[Hash32]) -> Result<u64> {
    if proof.len() > u64::BITS as usize {
        return Err(Error::InvalidInput(format!(
            "proof of {} elements does not fit a 64-bit index",
            proof.len()
        )));
    }

    let mut index = 0u64;
    let mut computed = hash_leaf(address, entry);
    for element in proof {
        index <<= 1;
        if computed <= *element {
            computed = Hash32::keccak_many(&[computed.as_bytes(), element.as_bytes()]);
        } else {
            computed = Hash32::keccak_many(&[element.as_bytes(), computed.as_bytes()]);
            index += 1;
        }
    }
    Ok(index)
}
