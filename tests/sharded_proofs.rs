//! End-to-end proof retrieval against in-memory and on-disk manifests
//!
//! Run with:
//! ```bash
//! cargo test --test sharded_proofs
//! ```

use std::sync::Arc;
use std::time::Duration;

use shardrop::{
    get_entry_proof_index, hash_leaf, shard_id_for, verify_proof, Address, DirShardFetcher,
    Distribution, Entry, Error, MemoryShardFetcher, ShardedMerkleTree, TreeBuilder,
};
use tempfile::tempdir;

const AA01: &str = "0xaa01000000000000000000000000000000000001";
const AA02: &str = "0xaa02000000000000000000000000000000000002";
const BB03: &str = "0xbb03000000000000000000000000000000000003";

fn scenario() -> Distribution {
    let mut builder = TreeBuilder::new(2).unwrap();
    builder
        .insert(Address::parse(AA01).unwrap(), Entry::new(100u64))
        .unwrap();
    builder
        .insert(Address::parse(AA02).unwrap(), Entry::new(200u64))
        .unwrap();
    builder
        .insert(Address::parse(BB03).unwrap(), Entry::new(50u64))
        .unwrap();
    builder.build().unwrap()
}

/// A larger distribution spread over many shards
fn wide(count: u32, nybbles: u8) -> Distribution {
    let mut builder = TreeBuilder::new(nybbles).unwrap();
    for i in 0..count {
        let digest = shardrop::Hash32::keccak(&i.to_be_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        builder
            .insert(Address::from_bytes(bytes), Entry::new(u64::from(i) + 1))
            .unwrap();
    }
    builder.build().unwrap()
}

async fn open(dist: Distribution) -> ShardedMerkleTree<MemoryShardFetcher> {
    ShardedMerkleTree::loader(MemoryShardFetcher::from(dist))
        .open()
        .await
        .unwrap()
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_single_entry_shard_proof_is_link_only() {
    let dist = scenario();
    let bb = shard_id_for(BB03, 2).unwrap();
    let link = dist.shard(&bb).unwrap().proof.clone();
    let tree = open(dist).await;

    let (entry, proof) = tree.get_proof(BB03).await.unwrap();
    assert_eq!(entry, Entry::new(50u64));
    // Local path is empty, so the whole proof is the shard's link
    assert_eq!(proof, link);

    let address = Address::parse(BB03).unwrap();
    assert!(verify_proof(hash_leaf(&address, &entry), &proof, &tree.root()));
    assert!(tree.verify(&address, &entry, &proof));
}

#[tokio::test]
async fn test_every_entry_verifies_against_global_root() {
    let dist = wide(300, 2);
    let addresses: Vec<Address> = dist
        .shards
        .values()
        .flat_map(|s| s.entries.keys().copied())
        .collect();
    let tree = open(dist).await;

    for address in addresses {
        let (entry, proof) = tree.get_proof(&address.to_hex()).await.unwrap();
        assert!(tree.verify(&address, &entry, &proof), "{}", address);
        // The recovered index is bounded by the proof length
        let index = get_entry_proof_index(&address, &entry, &proof).unwrap();
        assert!(index < 1u64 << proof.len());
    }
}

#[tokio::test]
async fn test_mixed_case_address_is_found() {
    let tree = open(scenario()).await;
    let (entry, _) = tree.get_proof(&AA01.to_uppercase().replace("0X", "0x")).await.unwrap();
    assert_eq!(entry, Entry::new(100u64));
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_same_shard_fetched_once() {
    let tree = open(scenario()).await;
    let aa = shard_id_for(AA01, 2).unwrap();

    tree.get_proof(AA01).await.unwrap();
    tree.get_proof(AA02).await.unwrap();

    assert_eq!(tree.fetcher().fetch_count(&aa), 1);
    assert_eq!(tree.cached_shards(), vec![aa]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_share_one_fetch() {
    let fetcher = MemoryShardFetcher::new(scenario()).with_latency(Duration::from_millis(50));
    let tree = Arc::new(ShardedMerkleTree::loader(fetcher).open().await.unwrap());

    let (a, b, c) = tokio::join!(tree.get_proof(AA01), tree.get_proof(AA02), tree.get_proof(BB03));
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let aa = shard_id_for(AA01, 2).unwrap();
    let bb = shard_id_for(BB03, 2).unwrap();
    assert_eq!(tree.fetcher().fetch_count(&aa), 1);
    assert_eq!(tree.fetcher().fetch_count(&bb), 1);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_tasks_share_one_fetch() {
    let fetcher = MemoryShardFetcher::new(wide(64, 1)).with_latency(Duration::from_millis(20));
    let tree = Arc::new(ShardedMerkleTree::loader(fetcher).open().await.unwrap());

    let dist = wide(64, 1);
    let mut handles = Vec::new();
    for address in dist.shards.values().flat_map(|s| s.entries.keys().copied()) {
        let tree = Arc::clone(&tree);
        handles.push(tokio::spawn(async move {
            tree.get_proof(&address.to_hex()).await.map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for id in dist.shards.keys() {
        assert_eq!(tree.fetcher().fetch_count(id), 1, "shard {}", id);
    }
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let tree = open(scenario()).await;
    let aa = shard_id_for(AA01, 2).unwrap();

    tree.fetcher().set_offline(true);
    let err = tree.get_proof(AA01).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
    assert!(err.is_retryable());
    assert!(tree.cached_shards().is_empty());

    tree.fetcher().set_offline(false);
    let (entry, _) = tree.get_proof(AA01).await.unwrap();
    assert_eq!(entry, Entry::new(100u64));
    assert_eq!(tree.fetcher().fetch_count(&aa), 2);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unknown_address_in_existing_shard() {
    let tree = open(scenario()).await;
    let err = tree
        .get_proof("0xaa09000000000000000000000000000000000009")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownAddress { .. }));
}

#[tokio::test]
async fn test_address_in_no_shard() {
    let tree = open(scenario()).await;
    let err = tree
        .get_proof("0xcc00000000000000000000000000000000000001")
        .await
        .unwrap_err();
    match err {
        Error::UnknownAddress { shard, .. } => assert_eq!(shard, "cc"),
        other => panic!("expected UnknownAddress, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tampered_proof_fails_verification() {
    let tree = open(scenario()).await;
    let (entry, proof) = tree.get_proof(AA01).await.unwrap();
    let address = Address::parse(AA01).unwrap();

    let inflated = Entry::new(1_000_000u64);
    assert!(!tree.verify(&address, &inflated, &proof));
    assert!(tree.verify(&address, &entry, &proof));
}

// ============================================================================
// On-disk manifests
// ============================================================================

#[tokio::test]
async fn test_directory_roundtrip() {
    let dir = tempdir().unwrap();
    let dist = scenario();
    dist.write_to_dir(dir.path()).unwrap();

    let tree = ShardedMerkleTree::loader(DirShardFetcher::new(dir.path()))
        .with_fetch_timeout(Duration::from_secs(5))
        .open()
        .await
        .unwrap();
    assert_eq!(tree.root(), dist.root.root);
    assert_eq!(tree.total(), dist.root.total);
    assert_eq!(tree.shard_nybbles(), 2);

    let (entry, proof) = tree.get_proof(AA02).await.unwrap();
    assert!(tree.verify(&Address::parse(AA02).unwrap(), &entry, &proof));
}

#[tokio::test]
async fn test_open_without_root_manifest() {
    let dir = tempdir().unwrap();
    let result = ShardedMerkleTree::loader(DirShardFetcher::new(dir.path()))
        .open()
        .await;
    assert!(matches!(result, Err(Error::Construction(_))));
}

#[tokio::test]
async fn test_open_with_malformed_root_manifest() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("root.json"), r#"{"root": "0x12"}"#).unwrap();
    let result = ShardedMerkleTree::loader(DirShardFetcher::new(dir.path()))
        .open()
        .await;
    assert!(matches!(result, Err(Error::Construction(_))));
}
