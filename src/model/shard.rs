//! Shard manifests and the published root manifest

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{btree_map, BTreeMap};
use std::fmt;

use super::entry::{decimal, Balance};
use super::{Address, Entry, Hash32, Proof};
use crate::Error;

/// Largest usable prefix: every hex character of a 20-byte address
pub const MAX_SHARD_NYBBLES: u8 = 40;

/// Check a shard prefix length against the address width
pub fn validate_shard_nybbles(shard_nybbles: u8) -> crate::Result<()> {
    if shard_nybbles == 0 || shard_nybbles > MAX_SHARD_NYBBLES {
        return Err(Error::InvalidInput(format!(
            "shard nybbles must be in 1..={}, got {}",
            MAX_SHARD_NYBBLES, shard_nybbles
        )));
    }
    Ok(())
}

/// Lowercase hex address prefix naming a shard. Not a hash.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardId(String);

impl ShardId {
    /// Caller guarantees `id` is lowercase hex
    pub(crate) fn new_unchecked(id: String) -> Self {
        ShardId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this shard's manifest
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShardId({})", self.0)
    }
}

/// One shard manifest: its allocations plus the path from the shard's local
/// root up to the global root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    #[serde(deserialize_with = "unique_entries")]
    pub entries: BTreeMap<Address, Entry>,
    /// Trusted as published; not recomputed on load
    pub proof: Proof,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reject manifests naming the same address twice, including keys that
/// differ only in hex case.
fn unique_entries<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<Address, Entry>, D::Error> {
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = BTreeMap<Address, Entry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of address to entry")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = BTreeMap::new();
            while let Some((address, entry)) = map.next_entry::<Address, Entry>()? {
                match entries.entry(address) {
                    btree_map::Entry::Occupied(_) => {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate entry for {}",
                            address
                        )));
                    }
                    btree_map::Entry::Vacant(slot) => {
                        slot.insert(entry);
                    }
                }
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}

/// The published commitment (`root.json`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRoot {
    pub root: Hash32,
    pub shard_nybbles: u8,
    /// Sum of all balances. Informational, never hashed.
    #[serde(with = "decimal")]
    pub total: Balance,
}

impl GlobalRoot {
    pub fn validate(&self) -> crate::Result<()> {
        validate_shard_nybbles(self.shard_nybbles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_manifest_wire_format() {
        let json = r#"{
            "root": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "shardNybbles": 2,
            "total": "350"
        }"#;
        let root: GlobalRoot = serde_json::from_str(json).unwrap();
        assert_eq!(root.shard_nybbles, 2);
        assert_eq!(root.total, Balance::from(350u64));
        assert!(root.validate().is_ok());
    }

    #[test]
    fn test_shard_manifest_wire_format() {
        let json = r#"{
            "entries": {
                "0xAA01000000000000000000000000000000000001": { "balance": "100" }
            },
            "proof": ["0x2222222222222222222222222222222222222222222222222222222222222222"]
        }"#;
        let shard: Shard = serde_json::from_str(json).unwrap();
        let addr = Address::parse("0xaa01000000000000000000000000000000000001").unwrap();
        assert_eq!(shard.entries.get(&addr), Some(&Entry::new(100u64)));
        assert_eq!(shard.proof.len(), 1);
    }

    #[test]
    fn test_shard_manifest_rejects_case_duplicates() {
        let json = r#"{
            "entries": {
                "0xAA01000000000000000000000000000000000001": { "balance": "100" },
                "0xaa01000000000000000000000000000000000001": { "balance": "7" }
            },
            "proof": []
        }"#;
        let err = serde_json::from_str::<Shard>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate entry"), "{}", err);
    }

    #[test]
    fn test_nybble_bounds() {
        assert!(validate_shard_nybbles(0).is_err());
        assert!(validate_shard_nybbles(1).is_ok());
        assert!(validate_shard_nybbles(40).is_ok());
        assert!(validate_shard_nybbles(41).is_err());
    }
}
