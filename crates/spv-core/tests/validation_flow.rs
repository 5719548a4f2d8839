//! End-to-end validation through the public service API.

use spv_core::{
    build_partial_merkle, compute_merkle_root, AncestorLookup, FixedClock, Hash,
    HeaderRecord, HeaderValidationApi, HeaderValidationService, InMemoryAncestors, MerkleBlock,
    SpvConfig, SpvError, StoredHeader, REGTEST_MAX_PROOF_OF_WORK,
};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

const GENESIS_TIME: u32 = 1231006505;
const NOW: u64 = 1_700_000_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn genesis() -> HeaderRecord {
    let mut merkle_root = [0u8; 32];
    merkle_root.copy_from_slice(
        &hex::decode("3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a").unwrap(),
    );
    HeaderRecord::new(1, [0u8; 32], merkle_root, GENESIS_TIME, 0x1d00ffff, 2083236893)
}

fn mine(prev: Hash, merkle_root: Hash, timestamp: u32) -> HeaderRecord {
    (0..u32::MAX)
        .map(|nonce| {
            HeaderRecord::new(1, prev, merkle_root, timestamp, REGTEST_MAX_PROOF_OF_WORK, nonce)
        })
        .find(|h| spv_core::check_proof_of_work(h, REGTEST_MAX_PROOF_OF_WORK).is_ok())
        .unwrap()
}

/// Chain of mined regtest headers ending 60 seconds before `NOW`.
fn regtest_chain(len: usize) -> Vec<HeaderRecord> {
    let mut headers: Vec<HeaderRecord> = Vec::new();
    for i in 0..len {
        let prev = headers.last().map(|h| *h.block_hash()).unwrap_or([0u8; 32]);
        let mut header = mine(prev, [i as u8; 32], NOW as u32 - 60 * (len - i) as u32);
        header.set_height(i as u32).unwrap();
        headers.push(header);
    }
    headers
}

#[test]
fn test_genesis_message_validates_on_mainnet() {
    init_tracing();
    let service = HeaderValidationService::new(
        SpvConfig::default(),
        InMemoryAncestors::new(),
        FixedClock(GENESIS_TIME as u64),
    )
    .unwrap();

    let header = genesis();
    // The genesis block holds only its coinbase, whose hash is the merkle root.
    let coinbase = *header.merkle_root();
    let block = MerkleBlock::new(header.clone(), build_partial_merkle(&[coinbase], &[true]));
    let bytes = block.to_bytes();

    let validated = service.validate_message(&bytes).unwrap();
    assert_eq!(validated.header, header);
    assert_eq!(validated.matched_tx_hashes, vec![coinbase]);
    assert_eq!(MerkleBlock::from_bytes(&bytes).unwrap().to_bytes(), bytes);
}

#[test]
fn test_genesis_rejected_before_its_time() {
    init_tracing();
    let clock = FixedClock(GENESIS_TIME as u64 - 7201);
    let service =
        HeaderValidationService::new(SpvConfig::default(), InMemoryAncestors::new(), clock).unwrap();

    let bytes = genesis().encode_header();
    assert!(matches!(
        service.validate_message(&bytes),
        Err(SpvError::TimestampTooFarInFuture { .. })
    ));
}

#[test]
fn test_chain_extension_with_hash_map_storage() {
    init_tracing();
    let chain = regtest_chain(30);
    let tip = chain.last().unwrap().clone();
    let storage: HashMap<Hash, HeaderRecord> =
        chain.into_iter().map(|h| (*h.block_hash(), h)).collect();

    let service =
        HeaderValidationService::new(SpvConfig::for_testing(), &storage, FixedClock(NOW)).unwrap();

    let txs: Vec<Hash> = (1..=9u8).map(|n| [n; 32]).collect();
    let matches: Vec<bool> = (0..9).map(|i| i % 4 == 0).collect();
    let header = mine(*tip.block_hash(), compute_merkle_root(&txs), NOW as u32);
    let bytes = MerkleBlock::new(header, build_partial_merkle(&txs, &matches)).to_bytes();

    let validated = service.validate_in_chain(&bytes).unwrap();
    assert_eq!(validated.height(), Some(30));
    assert_eq!(validated.matched_tx_hashes, vec![txs[0], txs[4], txs[8]]);
    assert!(service.verify_difficulty(&validated.header).is_ok());
}

#[test]
fn test_restored_headers_serve_as_ancestors() {
    init_tracing();
    let chain = regtest_chain(24);
    let stored: Vec<StoredHeader> = chain.iter().map(HeaderRecord::to_stored).collect();
    let json = serde_json::to_string(&stored).unwrap();

    let restored: Vec<StoredHeader> = serde_json::from_str(&json).unwrap();
    let ancestors: InMemoryAncestors = restored.into_iter().map(HeaderRecord::restore).collect();
    let tip = chain.last().unwrap();
    assert_eq!(ancestors.header_by_hash(tip.block_hash()).as_ref(), Some(tip));

    let service =
        HeaderValidationService::new(SpvConfig::for_testing(), ancestors, FixedClock(NOW)).unwrap();
    let bytes = mine(*tip.block_hash(), [0x42; 32], NOW as u32).encode_header();
    let validated = service.validate_in_chain(&bytes).unwrap();
    assert_eq!(validated.height(), Some(24));
}

#[test]
fn test_batch_validation_in_parallel() {
    init_tracing();
    let service = HeaderValidationService::new(
        SpvConfig::for_testing(),
        InMemoryAncestors::new(),
        FixedClock(NOW),
    )
    .unwrap();

    let messages: Vec<Vec<u8>> = (0..16u8)
        .map(|i| {
            let txs = [[i; 32], [i.wrapping_add(100); 32]];
            let header = mine([i; 32], compute_merkle_root(&txs), NOW as u32);
            let mut bytes =
                MerkleBlock::new(header, build_partial_merkle(&txs, &[false, true])).to_bytes();
            if i % 5 == 0 {
                bytes.push(0);
            }
            bytes
        })
        .collect();
    let refs: Vec<&[u8]> = messages.iter().map(Vec::as_slice).collect();

    let results = service.validate_batch(&refs);
    for (i, result) in results.iter().enumerate() {
        if i % 5 == 0 {
            assert!(matches!(result, Err(SpvError::MalformedMessage(_))));
        } else {
            let expected = [(i as u8).wrapping_add(100); 32];
            assert_eq!(result.as_ref().unwrap().matched_tx_hashes, vec![expected]);
        }
    }
}
