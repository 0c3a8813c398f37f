//! ItemStore interface tests.
//!
//! These tests verify the contract of the ItemStore trait: conditional
//! writes, atomic add, ordered transactions with per-position cancellation
//! reasons, and ordered range queries over the table and its indexes.
//! Every test works in its own partition so a shared table can be reused.

use forgestore::storage::item::{self, Item};
use forgestore::storage::schema::{ATTR_GSI1_PK, ATTR_GSI1_SK};
use forgestore::storage::{
    AttributeValue, CancellationReason, Condition, IndexSpec, ItemStore, PrimaryKey, PutRequest,
    QueryRequest, SecondaryIndex, SortCondition, StoreError, TransactOp, UpdateRequest,
};
use uuid::Uuid;

fn partition(label: &str) -> String {
    format!("TEST#{label}#{}", Uuid::new_v4())
}

fn item_at(key: &PrimaryKey, title: &str) -> Item {
    let mut item = item::key_item(key);
    item.insert("title".to_string(), AttributeValue::from(title));
    item
}

fn account_repositories_index() -> IndexSpec {
    let index = SecondaryIndex::AccountRepositories;
    IndexSpec {
        name: index.default_name().to_string(),
        partition_attr: index.partition_attr(),
        sort_attr: index.sort_attr(),
    }
}

fn sort_keys(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(|i| item::required_string(i, "SK").expect("SK present"))
        .collect()
}

// =============================================================================
// Point operations
// =============================================================================

pub async fn test_get_nonexistent<S: ItemStore>(store: &S) {
    let key = PrimaryKey::new(partition("get_missing"), "nothing");

    let result = store.get_item(&key).await.expect("get should succeed");

    assert!(result.is_none(), "missing item should be None");
}

pub async fn test_put_and_get<S: ItemStore>(store: &S) {
    let key = PrimaryKey::new(partition("put_get"), "A");

    store
        .put_item(PutRequest {
            item: item_at(&key, "first"),
            condition: None,
        })
        .await
        .expect("put should succeed");

    let stored = store
        .get_item(&key)
        .await
        .expect("get should succeed")
        .expect("item should exist");
    assert_eq!(stored.get("title"), Some(&AttributeValue::from("first")));
}

pub async fn test_put_not_exists_rejects_second_write<S: ItemStore>(store: &S) {
    let key = PrimaryKey::new(partition("put_unique"), "A");
    let put = |title: &str| PutRequest {
        item: item_at(&key, title),
        condition: Some(Condition::NotExists),
    };

    store.put_item(put("first")).await.unwrap();
    let second = store.put_item(put("second")).await;

    assert!(
        matches!(second, Err(StoreError::ConditionalCheckFailed)),
        "second conditional put should fail, got {second:?}"
    );
    let stored = store.get_item(&key).await.unwrap().unwrap();
    assert_eq!(stored.get("title"), Some(&AttributeValue::from("first")));
}

pub async fn test_delete_is_idempotent<S: ItemStore>(store: &S) {
    let key = PrimaryKey::new(partition("delete"), "A");
    store
        .put_item(PutRequest {
            item: item_at(&key, "doomed"),
            condition: None,
        })
        .await
        .unwrap();

    store.delete_item(&key).await.expect("first delete");
    store.delete_item(&key).await.expect("second delete");

    assert!(store.get_item(&key).await.unwrap().is_none());
}

// =============================================================================
// Update
// =============================================================================

pub async fn test_update_add_creates_and_increments<S: ItemStore>(store: &S) {
    let key = PrimaryKey::new(partition("counter"), "METADATA");
    let bump = || {
        let mut request = UpdateRequest::new(key.clone());
        request.add.insert("current_value".to_string(), 1);
        request
    };

    let first = store.update_item(bump()).await.unwrap();
    let second = store.update_item(bump()).await.unwrap();

    assert_eq!(item::required_number::<u64>(&first, "current_value").unwrap(), 1);
    assert_eq!(item::required_number::<u64>(&second, "current_value").unwrap(), 2);
}

pub async fn test_update_requires_existence<S: ItemStore>(store: &S) {
    let key = PrimaryKey::new(partition("update_missing"), "A");
    let mut request = UpdateRequest::new(key.clone());
    request.set.insert("title".to_string(), AttributeValue::from("x"));
    request.condition = Some(Condition::Exists);

    let result = store.update_item(request).await;

    assert!(matches!(result, Err(StoreError::ConditionalCheckFailed)));
    assert!(store.get_item(&key).await.unwrap().is_none());
}

pub async fn test_update_set_if_absent_and_remove<S: ItemStore>(store: &S) {
    let key = PrimaryKey::new(partition("update_fields"), "A");
    let mut original = item_at(&key, "old");
    original.insert("created".to_string(), AttributeValue::from("t0"));
    original.insert("body".to_string(), AttributeValue::from("text"));
    store
        .put_item(PutRequest {
            item: original,
            condition: None,
        })
        .await
        .unwrap();

    let mut request = UpdateRequest::new(key.clone());
    request.set.insert("title".to_string(), AttributeValue::from("new"));
    request
        .set_if_absent
        .insert("created".to_string(), AttributeValue::from("t1"));
    request.remove.push("body".to_string());
    request.condition = Some(Condition::Exists);

    let after = store.update_item(request).await.unwrap();

    assert_eq!(after.get("title"), Some(&AttributeValue::from("new")));
    assert_eq!(after.get("created"), Some(&AttributeValue::from("t0")));
    assert!(!after.contains_key("body"));
}

// =============================================================================
// Transactions
// =============================================================================

pub async fn test_transaction_applies_all<S: ItemStore>(store: &S) {
    let pk = partition("tx_ok");
    let parent = PrimaryKey::new(&pk, "PARENT");
    let child = PrimaryKey::new(&pk, "CHILD");
    store
        .put_item(PutRequest {
            item: item_at(&parent, "parent"),
            condition: None,
        })
        .await
        .unwrap();

    store
        .transact_write(vec![
            TransactOp::Put {
                item: item_at(&child, "child"),
                condition: Some(Condition::NotExists),
            },
            TransactOp::ConditionCheck {
                key: parent,
                condition: Condition::Exists,
            },
        ])
        .await
        .expect("transaction should commit");

    assert!(store.get_item(&child).await.unwrap().is_some());
}

pub async fn test_transaction_reports_failed_position<S: ItemStore>(store: &S) {
    let pk = partition("tx_fail");
    let child = PrimaryKey::new(&pk, "CHILD");
    let missing = PrimaryKey::new(&pk, "MISSING");

    let result = store
        .transact_write(vec![
            TransactOp::Put {
                item: item_at(&child, "child"),
                condition: Some(Condition::NotExists),
            },
            TransactOp::ConditionCheck {
                key: missing,
                condition: Condition::Exists,
            },
        ])
        .await;

    match result {
        Err(StoreError::TransactionCanceled { reasons }) => {
            assert_eq!(reasons.len(), 2);
            assert_eq!(reasons[0], CancellationReason::None);
            assert_eq!(reasons[1], CancellationReason::ConditionalCheckFailed);
        }
        other => panic!("expected TransactionCanceled, got {other:?}"),
    }
    assert!(
        store.get_item(&child).await.unwrap().is_none(),
        "no operation of a canceled transaction may apply"
    );
}

pub async fn test_transaction_attribute_check<S: ItemStore>(store: &S) {
    let pk = partition("tx_attr");
    let account = PrimaryKey::new(&pk, "ACCOUNT");
    let star = PrimaryKey::new(&pk, "STAR");
    let mut org = item::key_item(&account);
    org.insert("kind".to_string(), AttributeValue::from("organization"));
    store
        .put_item(PutRequest {
            item: org,
            condition: None,
        })
        .await
        .unwrap();

    let result = store
        .transact_write(vec![
            TransactOp::Put {
                item: item_at(&star, "star"),
                condition: Some(Condition::NotExists),
            },
            TransactOp::ConditionCheck {
                key: account,
                condition: Condition::AttributeEquals {
                    name: "kind".to_string(),
                    value: AttributeValue::from("user"),
                },
            },
        ])
        .await;

    match result {
        Err(StoreError::TransactionCanceled { reasons }) => {
            assert_eq!(reasons[1], CancellationReason::ConditionalCheckFailed);
        }
        other => panic!("expected TransactionCanceled, got {other:?}"),
    }
}

// =============================================================================
// Queries
// =============================================================================

pub async fn test_query_orders_and_filters<S: ItemStore>(store: &S) {
    let pk = partition("query");
    for sk in ["ISSUE#000002", "ISSUE#000001", "PR#000003", "ISSUE#000003"] {
        store
            .put_item(PutRequest {
                item: item_at(&PrimaryKey::new(&pk, sk), sk),
                condition: None,
            })
            .await
            .unwrap();
    }

    let ascending = store
        .query(
            QueryRequest::table(&pk).with_sort(SortCondition::BeginsWith("ISSUE#".to_string())),
        )
        .await
        .unwrap();
    let descending = store
        .query(
            QueryRequest::table(&pk)
                .with_sort(SortCondition::BeginsWith("ISSUE#".to_string()))
                .descending(),
        )
        .await
        .unwrap();

    assert_eq!(
        sort_keys(&ascending.items),
        vec!["ISSUE#000001", "ISSUE#000002", "ISSUE#000003"]
    );
    assert_eq!(
        sort_keys(&descending.items),
        vec!["ISSUE#000003", "ISSUE#000002", "ISSUE#000001"]
    );
    assert!(ascending.last_evaluated_key.is_none());
}

pub async fn test_query_limit_and_resume<S: ItemStore>(store: &S) {
    let pk = partition("query_page");
    for n in 1..=5 {
        let sk = format!("ITEM#{n}");
        store
            .put_item(PutRequest {
                item: item_at(&PrimaryKey::new(&pk, &sk), &sk),
                condition: None,
            })
            .await
            .unwrap();
    }

    let mut request = QueryRequest::table(&pk);
    request.limit = Some(2);
    let first = store.query(request.clone()).await.unwrap();
    assert_eq!(sort_keys(&first.items), vec!["ITEM#1", "ITEM#2"]);

    request.exclusive_start_key = Some(first.last_evaluated_key.expect("more items follow"));
    let second = store.query(request).await.unwrap();
    assert_eq!(sort_keys(&second.items), vec!["ITEM#3", "ITEM#4"]);
}

pub async fn test_query_index_skips_unindexed_items<S: ItemStore>(store: &S) {
    let index_pk = partition("index");
    let table_pk = partition("index_table");

    for (sk, created) in [("A", "2024-01-01"), ("B", "2024-03-01"), ("C", "2024-02-01")] {
        let mut item = item_at(&PrimaryKey::new(&table_pk, sk), sk);
        item.insert(ATTR_GSI1_PK.to_string(), AttributeValue::from(index_pk.as_str()));
        item.insert(ATTR_GSI1_SK.to_string(), AttributeValue::from(created));
        store
            .put_item(PutRequest { item, condition: None })
            .await
            .unwrap();
    }
    store
        .put_item(PutRequest {
            item: item_at(&PrimaryKey::new(&table_pk, "D"), "unindexed"),
            condition: None,
        })
        .await
        .unwrap();

    let result = store
        .query(QueryRequest::index(account_repositories_index(), &index_pk).descending())
        .await
        .unwrap();

    assert_eq!(sort_keys(&result.items), vec!["B", "C", "A"]);
}

#[macro_export]
macro_rules! run_item_store_tests {
    ($store:expr) => {
        use $crate::store::item_store_tests::*;

        // point operations
        test_get_nonexistent($store).await;
        println!("  test_get_nonexistent: PASSED");

        test_put_and_get($store).await;
        println!("  test_put_and_get: PASSED");

        test_put_not_exists_rejects_second_write($store).await;
        println!("  test_put_not_exists_rejects_second_write: PASSED");

        test_delete_is_idempotent($store).await;
        println!("  test_delete_is_idempotent: PASSED");

        // update
        test_update_add_creates_and_increments($store).await;
        println!("  test_update_add_creates_and_increments: PASSED");

        test_update_requires_existence($store).await;
        println!("  test_update_requires_existence: PASSED");

        test_update_set_if_absent_and_remove($store).await;
        println!("  test_update_set_if_absent_and_remove: PASSED");

        // transactions
        test_transaction_applies_all($store).await;
        println!("  test_transaction_applies_all: PASSED");

        test_transaction_reports_failed_position($store).await;
        println!("  test_transaction_reports_failed_position: PASSED");

        test_transaction_attribute_check($store).await;
        println!("  test_transaction_attribute_check: PASSED");

        // queries
        test_query_orders_and_filters($store).await;
        println!("  test_query_orders_and_filters: PASSED");

        test_query_limit_and_resume($store).await;
        println!("  test_query_limit_and_resume: PASSED");

        test_query_index_skips_unindexed_items($store).await;
        println!("  test_query_index_skips_unindexed_items: PASSED");
    };
}
