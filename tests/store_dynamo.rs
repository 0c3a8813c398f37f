//! DynamoDB item store contract tests.
//!
//! Run with: cargo test --test store_dynamo --features dynamo -- --ignored
//!
//! Requires DynamoDB Local or LocalStack:
//!   docker run -p 8000:8000 amazon/dynamodb-local
//!
//! Set DYNAMODB_ENDPOINT to override the default endpoint. The table is
//! created on first run; each test works in its own partition.

mod store;

use forgestore::config::DynamoConfig;
use forgestore::storage::dynamo;
use forgestore::storage::item;
use forgestore::storage::{DynamoItemStore, ItemStore, PrimaryKey, PutRequest};
use uuid::Uuid;

fn dynamo_endpoint() -> String {
    std::env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

async fn connect() -> DynamoItemStore {
    connect_to("forgestore-contract").await
}

async fn connect_to(table_name: &str) -> DynamoItemStore {
    let config = DynamoConfig {
        table_name: table_name.to_string(),
        endpoint: Some(dynamo_endpoint()),
        region: Some("us-east-1".to_string()),
        timeout_ms: Some(5_000),
        create_table: true,
    };

    let store = DynamoItemStore::connect(&config)
        .await
        .expect("Failed to connect to DynamoDB");
    dynamo::create_table(&store, |index| index.default_name().to_string())
        .await
        .expect("Failed to create table");
    store
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_dynamo_item_store() {
    println!("=== DynamoDB ItemStore Tests ===");
    println!("Connecting to: {}", dynamo_endpoint());

    let store = connect().await;
    run_item_store_tests!(&store);

    println!("=== All DynamoDB ItemStore tests PASSED ===");
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_dynamo_new_table_accepts_writes_immediately() {
    let table = format!("forgestore-fresh-{}", Uuid::new_v4());
    let store = connect_to(&table).await;

    // second call sees an existing table and still returns once it is usable
    dynamo::create_table(&store, |index| index.default_name().to_string())
        .await
        .expect("create_table should accept an existing table");

    let key = PrimaryKey::new("TEST#fresh", "A");
    store
        .put_item(PutRequest {
            item: item::key_item(&key),
            condition: None,
        })
        .await
        .expect("first write after create_table should succeed");
    assert!(store.get_item(&key).await.unwrap().is_some());
}
