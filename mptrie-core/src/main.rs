//! # Merkle Patricia Trie Demo
//!
//! Walks through the trie's structural cases and writes a proof into an
//! in-memory store. Set `RUST_LOG=mptrie=trace` to follow every split.

use mptrie::{build_proof, keccak, InMemoryStorage, KvReader, Node, Trie, TrieError};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), TrieError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Merkle Patricia Trie Demo\n");

    // =========================================
    // Test 1: Empty Trie
    // =========================================
    println!("=== Test 1: Empty Trie ===");
    let trie = Trie::new();

    println!("Is empty: {}", trie.is_empty());
    println!("Root hash: {}", trie.hash());
    println!();

    // =========================================
    // Test 2: Single Insert
    // =========================================
    println!("=== Test 2: Single Insert ===");
    let mut trie = Trie::new();
    trie.put(b"account.address", b"XYZABCDEF".to_vec())?;

    describe(&trie);
    println!(
        "Get 'account.address': {:?}",
        trie.get(b"account.address").map(String::from_utf8_lossy)
    );
    println!();

    // =========================================
    // Test 3: Shared Prefix
    // =========================================
    println!("=== Test 3: Shared Prefix ===");
    let mut trie = Trie::new();
    trie.put(b"accounts.address", b"A".to_vec())?;
    trie.put(b"accounts.value", b"B".to_vec())?;

    describe(&trie);
    println!();

    // =========================================
    // Test 4: No Shared Prefix
    // =========================================
    println!("=== Test 4: No Shared Prefix ===");
    let mut trie = Trie::new();
    trie.put(b"accounts.balance", b"X".to_vec())?;
    trie.put(b"system.version", b"Y".to_vec())?;

    describe(&trie);
    println!();

    // =========================================
    // Test 5: Key Ending at a Branch
    // =========================================
    println!("=== Test 5: Key Ending at a Branch ===");
    let mut trie = Trie::new();
    trie.put(b"transfer.input", b"A".to_vec())?;
    trie.put(b"transfer.input.value", b"B".to_vec())?;

    describe(&trie);
    for key in ["transfer.input", "transfer.input.value", "transfer"] {
        match trie.get(key.as_bytes()) {
            Some(v) => println!("  '{}' -> '{}'", key, String::from_utf8_lossy(v)),
            None => println!("  '{}' -> NOT FOUND", key),
        }
    }
    println!();

    // =========================================
    // Test 6: Deterministic Roots
    // =========================================
    println!("=== Test 6: Deterministic Roots ===");
    let pairs: [(&[u8], &[u8]); 4] = [
        (b"do", b"verb"),
        (b"dog", b"puppy"),
        (b"doge", b"coin"),
        (b"horse", b"stallion"),
    ];

    let mut forward = Trie::new();
    for (key, value) in pairs {
        forward.put(key, value)?;
    }
    let mut reverse = Trie::new();
    for (key, value) in pairs.iter().rev() {
        reverse.put(key, *value)?;
    }

    println!("Forward: {}", forward.hash());
    println!("Reverse: {}", reverse.hash());
    println!("Same content = same root: {}", forward.hash() == reverse.hash());
    println!();

    // =========================================
    // Test 7: Snapshots
    // =========================================
    println!("=== Test 7: Snapshots ===");
    let snapshot = forward.clone();
    forward.put(b"dog", b"hound".to_vec())?;

    println!("Snapshot 'dog': {:?}", snapshot.get(b"dog").map(String::from_utf8_lossy));
    println!("Current  'dog': {:?}", forward.get(b"dog").map(String::from_utf8_lossy));
    println!("Roots different: {}", snapshot.hash() != forward.hash());
    println!();

    // =========================================
    // Test 8: Proofs
    // =========================================
    println!("=== Test 8: Proofs ===");
    let mut state = Trie::new();
    let alice = keccak(b"alice_address");
    let bob = keccak(b"bob_address");
    state.put(alice.as_slice(), b"nonce:1,balance:1000".to_vec())?;
    state.put(bob.as_slice(), b"nonce:0,balance:500".to_vec())?;

    let store = InMemoryStorage::new();
    let proof = build_proof(alice.as_slice(), &state, &store)?;

    info!(root = %state.hash(), nodes = proof.len(), "proof for alice");
    for node in &proof.nodes {
        println!("  {} ({} bytes)", node.hash, node.encoded.len());
    }
    println!(
        "Root stored: {}",
        store.has(state.hash().as_slice())?
    );

    match build_proof(b"carol", &state, &store) {
        Ok(_) => println!("Unexpected proof for 'carol'"),
        Err(e) => println!("Proof for 'carol': {}", e),
    }

    println!();
    println!("All MPT demos completed!");
    Ok(())
}

fn describe(trie: &Trie) {
    let kind = trie.root().map(Node::kind);
    println!("Root node: {:?}", kind);
    println!("Root hash: {}", trie.hash());

    if let Some(Node::Extension { path, next }) = trie.root() {
        println!("  extension path: {}", path);
        println!("  next: {:?}", next.kind());
    }
}
