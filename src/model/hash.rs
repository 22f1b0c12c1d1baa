//! 32-byte Keccak-256 digest used for leaves, nodes and roots

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A 32-byte Keccak-256 hash.
///
/// Ordering is byte-wise, which is the same as comparing the values as
/// big-endian unsigned integers. The sorted-pair rule depends on this.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash32([u8; 32]);

impl Hash32 {
    /// Root of a tree with no leaves
    pub const ZERO: Hash32 = Hash32([0u8; 32]);

    /// Create a hash from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash32(bytes)
    }

    /// Hash arbitrary data
    pub fn keccak(data: &[u8]) -> Self {
        Hash32(Keccak256::digest(data).into())
    }

    /// Hash the concatenation of several byte slices
    pub fn keccak_many(parts: &[&[u8]]) -> Self {
        let mut hasher = Keccak256::new();
        for part in parts {
            hasher.update(part);
        }
        Hash32(hasher.finalize().into())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if cleaned.len() != 64 {
            return Err(Error::InvalidInput(format!(
                "hash must be 64 hex chars, got {}",
                cleaned.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(cleaned, &mut bytes)
            .map_err(|e| Error::InvalidInput(format!("invalid hash hex '{}': {}", s, e)))?;
        Ok(Hash32(bytes))
    }

    /// Short prefix for log output
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self.short())
    }
}

impl Default for Hash32 {
    fn default() -> Self {
        Hash32::ZERO
    }
}

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash32 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash32::from_hex(s)
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash32::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_known_vector() {
        // keccak256("") from the Ethereum yellow paper
        assert_eq!(
            Hash32::keccak(b"").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak_many_matches_concat() {
        let joined = Hash32::keccak(b"helloworld");
        let parts = Hash32::keccak_many(&[b"hello", b"world"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_hex_accepts_prefix_and_case() {
        let h = Hash32::keccak(b"test data");
        let upper = h.to_hex()[2..].to_uppercase();
        assert_eq!(Hash32::from_hex(&upper).unwrap(), h);
        assert_eq!(Hash32::from_hex(&h.to_hex()).unwrap(), h);
    }

    #[test]
    fn test_hex_rejects_bad_length() {
        assert!(matches!(
            Hash32::from_hex("0x1234"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ordering_is_numeric() {
        let mut low = [0u8; 32];
        low[31] = 0xff;
        let mut high = [0u8; 32];
        high[0] = 0x01;
        assert!(Hash32::from_bytes(low) < Hash32::from_bytes(high));
    }

    #[test]
    fn test_json_is_hex_string() {
        let h = Hash32::keccak(b"x");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: Hash32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
