//! Claimant addresses and shard key derivation

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::model::ShardId;
use crate::Error;

/// Number of hex characters in an address (without the `0x` marker)
pub const ADDRESS_HEX_LEN: usize = 40;

/// A 20-byte account address.
///
/// The canonical text form is `0x` followed by 40 lowercase hex characters.
/// Parsing accepts mixed case (e.g. checksummed input), so two spellings of
/// the same account always compare equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Parses an address from a hex string.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the string is not 40 hex chars after an
    /// optional `0x` prefix.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let cleaned = strip_marker(s.trim());
        if cleaned.len() != ADDRESS_HEX_LEN {
            return Err(Error::InvalidAddress(format!(
                "expected {} hex chars, got {} in '{}'",
                ADDRESS_HEX_LEN,
                cleaned.len(),
                s
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(cleaned, &mut bytes)
            .map_err(|e| Error::InvalidAddress(format!("'{}': {}", s, e)))?;
        Ok(Address(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Canonical lowercase `0x`-prefixed form
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// The shard this address belongs to
    pub fn shard_id(&self, shard_nybbles: u8) -> crate::Result<ShardId> {
        shard_id_for(&self.to_hex(), shard_nybbles)
    }
}

/// Maps an address to its shard: the first `shard_nybbles` hex characters
/// after the `0x` marker, lowercased.
///
/// Works on the textual form so callers can route a request before the
/// address is fully validated.
pub fn shard_id_for(address: &str, shard_nybbles: u8) -> crate::Result<ShardId> {
    let cleaned = strip_marker(address.trim());
    let n = shard_nybbles as usize;
    let prefix = cleaned.get(..n).ok_or_else(|| {
        Error::InvalidAddress(format!(
            "'{}' is shorter than the {} nybble shard prefix",
            address, shard_nybbles
        ))
    })?;
    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidAddress(format!(
            "'{}' has a non-hex shard prefix",
            address
        )));
    }
    Ok(ShardId::new_unchecked(prefix.to_ascii_lowercase()))
}

fn strip_marker(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xAa01000000000000000000000000000000000001";

    #[test]
    fn test_parse_with_and_without_prefix() {
        let a = Address::parse(ADDR).unwrap();
        let b = Address::parse(&ADDR[2..]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), ADDR.to_lowercase());
    }

    #[test]
    fn test_parse_invalid_length() {
        assert!(matches!(
            Address::parse("0x1234"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_invalid_hex() {
        let bad = "0xzz01000000000000000000000000000000000001";
        assert!(matches!(Address::parse(bad), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_shard_id_lowercases_and_truncates() {
        let id = shard_id_for(ADDR, 2).unwrap();
        assert_eq!(id.as_str(), "aa");
        let id = shard_id_for(ADDR, 4).unwrap();
        assert_eq!(id.as_str(), "aa01");
    }

    #[test]
    fn test_shard_id_is_pure_and_fixed_length() {
        for n in 1..=40u8 {
            let a = shard_id_for(ADDR, n).unwrap();
            let b = shard_id_for(ADDR, n).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.as_str().len(), n as usize);
        }
    }

    #[test]
    fn test_shard_id_too_short() {
        assert!(matches!(
            shard_id_for("0xab", 3),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_typed_and_textual_shard_ids_agree() {
        let addr = Address::parse(ADDR).unwrap();
        assert_eq!(addr.shard_id(3).unwrap(), shard_id_for(ADDR, 3).unwrap());
    }
}
