//! In-memory item store contract tests.
//!
//! Run with: cargo test --test store_memory
//!
//! No external dependencies required.

mod store;

use forgestore::storage::MemoryItemStore;

#[tokio::test]
async fn test_memory_item_store() {
    println!("=== Memory ItemStore Tests ===");

    let store = MemoryItemStore::new();
    run_item_store_tests!(&store);

    println!("=== All Memory ItemStore tests PASSED ===");
}
