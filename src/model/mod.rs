//! Core value types

mod address;
mod entry;
mod hash;
mod proof;
mod shard;

pub use address::{shard_id_for, Address, ADDRESS_HEX_LEN};
pub use entry::{decimal, parse_balance, Balance, Entry};
pub use hash::Hash32;
pub use proof::Proof;
pub use shard::{validate_shard_nybbles, GlobalRoot, Shard, ShardId, MAX_SHARD_NYBBLES};
