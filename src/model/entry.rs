//! Allocations: an address's balance in the distribution

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Token amount. Hashed as a 32-byte big-endian `uint256`.
pub type Balance = U256;

/// One allocation, as stored in a shard manifest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(with = "decimal")]
    pub balance: Balance,
}

impl Entry {
    pub fn new(balance: impl Into<Balance>) -> Self {
        Entry {
            balance: balance.into(),
        }
    }

    /// Build an entry from a decimal balance string
    pub fn from_decimal(balance: &str) -> crate::Result<Self> {
        Ok(Entry {
            balance: parse_balance(balance)?,
        })
    }

    /// Balance as 32 big-endian bytes
    pub fn balance_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.balance.to_big_endian(&mut out);
        out
    }
}

/// Parse a base-10 balance that must fit in 256 bits
pub fn parse_balance(s: &str) -> crate::Result<Balance> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!(
            "balance '{}' is not a decimal integer",
            s
        )));
    }
    U256::from_dec_str(trimmed)
        .map_err(|e| Error::InvalidInput(format!("balance '{}': {:?}", s, e)))
}

/// Serde adapter: balances travel as decimal strings in JSON
pub mod decimal {
    use super::{parse_balance, Balance};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Balance, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Balance, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_balance(&s).map_err(serde::de::Error::custom)
    }
}
