//! In-memory item store.
//!
//! Reproduces the conditional, transactional and index semantics of the
//! remote store under a single lock, so every operation is linearizable.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::item::{self, AttributeValue, Item};
use super::schema::{ATTR_PK, ATTR_SK};
use super::{
    CancellationReason, ItemStore, PrimaryKey, PutRequest, QueryOutput, QueryRequest, Result,
    StoreError, TransactOp, UpdateRequest, MAX_TRANSACT_ITEMS,
};

/// Position of an item within a query's result order.
type SortPosition = (String, String, String);

/// In-memory implementation of ItemStore.
#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<BTreeMap<PrimaryKey, Item>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

/// Reject items the remote store would reject.
fn validate_item(item: &Item) -> Result<PrimaryKey> {
    let key = item::primary_key_of(item).map_err(|e| StoreError::Validation(e.to_string()))?;
    if key.pk.is_empty() || key.sk.is_empty() {
        return Err(StoreError::Validation(
            "key attributes must not be empty strings".to_string(),
        ));
    }
    for (name, value) in item {
        if let AttributeValue::Ss(values) = value {
            if values.is_empty() {
                return Err(StoreError::Validation(format!(
                    "string set '{name}' must not be empty"
                )));
            }
        }
    }
    Ok(key)
}

fn apply_update(current: Option<&Item>, request: &UpdateRequest) -> Result<Item> {
    for name in request
        .set
        .keys()
        .chain(request.set_if_absent.keys())
        .chain(request.add.keys())
        .chain(request.remove.iter())
    {
        if name == ATTR_PK || name == ATTR_SK {
            return Err(StoreError::Validation(format!(
                "cannot update key attribute '{name}'"
            )));
        }
    }

    let mut next = current.cloned().unwrap_or_else(|| item::key_item(&request.key));

    for (name, value) in &request.set {
        next.insert(name.clone(), value.clone());
    }
    for (name, value) in &request.set_if_absent {
        next.entry(name.clone()).or_insert_with(|| value.clone());
    }
    for (name, delta) in &request.add {
        let base = match next.get(name) {
            None => 0,
            Some(AttributeValue::N(n)) => n.parse::<i64>().map_err(|_| {
                StoreError::Validation(format!("attribute '{name}' is not an integer"))
            })?,
            Some(other) => {
                return Err(StoreError::Validation(format!(
                    "ADD requires a number for '{name}', found {}",
                    other.type_name()
                )))
            }
        };
        next.insert(name.clone(), AttributeValue::N((base + delta).to_string()));
    }
    for name in &request.remove {
        next.remove(name);
    }

    validate_item(&next)?;
    Ok(next)
}

fn string_attr<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
    item.get(name).and_then(AttributeValue::as_s)
}

/// Result order position: (query sort value, PK, SK).
fn position_of(item: &Item, sort_attr: &str) -> Option<SortPosition> {
    Some((
        string_attr(item, sort_attr)?.to_string(),
        string_attr(item, ATTR_PK)?.to_string(),
        string_attr(item, ATTR_SK)?.to_string(),
    ))
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Item>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn put_item(&self, request: PutRequest) -> Result<()> {
        let key = validate_item(&request.item)?;
        let mut items = self.items.write().await;

        if let Some(condition) = &request.condition {
            if !condition.evaluate(items.get(&key)) {
                return Err(StoreError::ConditionalCheckFailed);
            }
        }

        debug!(pk = %key.pk, sk = %key.sk, "Stored item in memory");
        items.insert(key, request.item);
        Ok(())
    }

    async fn update_item(&self, request: UpdateRequest) -> Result<Item> {
        let mut items = self.items.write().await;
        let current = items.get(&request.key);

        if let Some(condition) = &request.condition {
            if !condition.evaluate(current) {
                return Err(StoreError::ConditionalCheckFailed);
            }
        }

        let next = apply_update(current, &request)?;
        items.insert(request.key, next.clone());
        Ok(next)
    }

    async fn delete_item(&self, key: &PrimaryKey) -> Result<()> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryOutput> {
        let (partition_attr, sort_attr) = match &request.index {
            Some(index) => (index.partition_attr, index.sort_attr),
            None => (ATTR_PK, ATTR_SK),
        };
        let key_attrs = request.key_attributes();

        let start = match &request.exclusive_start_key {
            Some(start) => Some(position_of(start, sort_attr).ok_or_else(|| {
                StoreError::Validation("exclusive start key is incomplete".to_string())
            })?),
            None => None,
        };

        let items = self.items.read().await;
        let mut matched: Vec<(SortPosition, &Item)> = items
            .values()
            .filter(|item| string_attr(item, partition_attr) == Some(request.partition.as_str()))
            .filter_map(|item| position_of(item, sort_attr).map(|pos| (pos, item)))
            .filter(|(pos, _)| {
                request
                    .sort
                    .as_ref()
                    .map_or(true, |condition| condition.matches(&pos.0))
            })
            .collect();

        matched.sort_by(|a, b| a.0.cmp(&b.0));
        if !request.scan_forward {
            matched.reverse();
        }

        if let Some(start) = start {
            let past_start = |pos: &SortPosition| match pos.cmp(&start) {
                Ordering::Greater => request.scan_forward,
                Ordering::Less => !request.scan_forward,
                Ordering::Equal => false,
            };
            matched.retain(|(pos, _)| past_start(pos));
        }

        let limit = request.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let truncated = matched.len() >= limit;
        let page: Vec<Item> = matched
            .into_iter()
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect();

        let last_evaluated_key = if truncated {
            page.last().map(|item| item::project(item, &key_attrs))
        } else {
            None
        };

        Ok(QueryOutput {
            items: page,
            last_evaluated_key,
        })
    }

    async fn transact_write(&self, ops: Vec<TransactOp>) -> Result<()> {
        if ops.is_empty() || ops.len() > MAX_TRANSACT_ITEMS {
            return Err(StoreError::Validation(format!(
                "transaction must contain 1..={MAX_TRANSACT_ITEMS} operations, got {}",
                ops.len()
            )));
        }

        let mut seen = HashSet::new();
        for op in &ops {
            if let TransactOp::Put { item, .. } = op {
                validate_item(item)?;
            }
            let key = op.key().map_err(|e| StoreError::Validation(e.to_string()))?;
            if !seen.insert(key) {
                return Err(StoreError::Validation(
                    "transaction cannot include multiple operations on one item".to_string(),
                ));
            }
        }

        let mut items = self.items.write().await;

        let mut reasons = Vec::with_capacity(ops.len());
        for op in &ops {
            let (key, condition) = match op {
                TransactOp::Put { item, condition } => {
                    (item::primary_key_of(item)?, condition.as_ref())
                }
                TransactOp::ConditionCheck { key, condition } => (key.clone(), Some(condition)),
            };
            let passed = condition.map_or(true, |c| c.evaluate(items.get(&key)));
            reasons.push(if passed {
                CancellationReason::None
            } else {
                CancellationReason::ConditionalCheckFailed
            });
        }

        if reasons.iter().any(|r| *r != CancellationReason::None) {
            return Err(StoreError::TransactionCanceled { reasons });
        }

        for op in ops {
            if let TransactOp::Put { item, .. } = op {
                let key = item::primary_key_of(&item)?;
                items.insert(key, item);
            }
        }
        Ok(())
    }
}
