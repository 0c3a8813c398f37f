//! Item storage.
//!
//! A single keyspace of items addressed by a partition key (`PK`) and sort
//! key (`SK`), with optional secondary indexes projected from item
//! attributes. The [`ItemStore`] trait is the only seam between the access
//! layer and a concrete store.
//!
//! Implementations:
//! - `MemoryItemStore`: in-process store for tests and local development
//! - `DynamoItemStore`: Amazon DynamoDB (feature `dynamo`)

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

pub mod item;
pub mod memory;
pub mod schema;

#[cfg(feature = "dynamo")]
pub mod dynamo;

pub use item::{AttributeValue, Item};
pub use memory::MemoryItemStore;
pub use schema::SecondaryIndex;

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoItemStore;

/// Maximum number of operations DynamoDB accepts in one transaction.
pub const MAX_TRANSACT_ITEMS: usize = 100;

/// Result type for item store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by an item store.
///
/// These are raw store signals. The access layer translates the ones it
/// understands into domain errors and passes the rest through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Conditional check failed")]
    ConditionalCheckFailed,

    #[error("Transaction canceled: [{}]", describe_reasons(.reasons))]
    TransactionCanceled { reasons: Vec<CancellationReason> },

    #[error("Store rejected request: {0}")]
    Validation(String),

    #[error("Malformed item attribute '{attribute}': {reason}")]
    MalformedItem { attribute: String, reason: String },

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn malformed(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedItem {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Per-operation outcome of a canceled transaction, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    /// This operation did not cause the cancellation.
    None,
    /// This operation's condition evaluated to false.
    ConditionalCheckFailed,
    /// The store rejected this operation's shape (size, types, key schema).
    ValidationError(String),
    /// Anything else (conflicts, throttling, capacity).
    Other { code: String, message: String },
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::ConditionalCheckFailed => write!(f, "ConditionalCheckFailed"),
            Self::ValidationError(message) => write!(f, "ValidationError: {message}"),
            Self::Other { code, message } => write!(f, "{code}: {message}"),
        }
    }
}

fn describe_reasons(reasons: &[CancellationReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Primary key of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryKey {
    pub pk: String,
    pub sk: String,
}

impl PrimaryKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.pk, self.sk)
    }
}

/// Predicate evaluated against the current state of a single item.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `attribute_not_exists(PK)`
    NotExists,
    /// `attribute_exists(PK)`
    Exists,
    /// `attribute_exists(PK) AND #name = :value`
    AttributeEquals { name: String, value: AttributeValue },
}

impl Condition {
    /// Evaluate the condition against the item currently stored at the key.
    pub fn evaluate(&self, current: Option<&Item>) -> bool {
        match (self, current) {
            (Self::NotExists, current) => current.is_none(),
            (Self::Exists, current) => current.is_some(),
            (Self::AttributeEquals { name, value }, Some(item)) => item.get(name) == Some(value),
            (Self::AttributeEquals { .. }, None) => false,
        }
    }
}

/// Write a whole item, replacing any existing item with the same key.
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub item: Item,
    pub condition: Option<Condition>,
}

/// Modify attributes of one item in place and return its post-image.
///
/// Creates the item when it does not exist (unless the condition forbids
/// it), which is what makes `add` usable as an atomic counter.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub key: PrimaryKey,
    /// `SET #a = :a`
    pub set: Item,
    /// `SET #a = if_not_exists(#a, :a)`
    pub set_if_absent: Item,
    /// `ADD #a :n`
    pub add: HashMap<String, i64>,
    /// `REMOVE #a`
    pub remove: Vec<String>,
    pub condition: Option<Condition>,
}

impl UpdateRequest {
    pub fn new(key: PrimaryKey) -> Self {
        Self {
            key,
            set: Item::new(),
            set_if_absent: Item::new(),
            add: HashMap::new(),
            remove: Vec::new(),
            condition: None,
        }
    }
}

/// Range condition on the sort key of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCondition {
    Equals(String),
    BeginsWith(String),
    /// Inclusive on both ends.
    Between(String, String),
}

impl SortCondition {
    pub fn matches(&self, sort_value: &str) -> bool {
        match self {
            Self::Equals(v) => sort_value == v,
            Self::BeginsWith(prefix) => sort_value.starts_with(prefix.as_str()),
            Self::Between(low, high) => sort_value >= low.as_str() && sort_value <= high.as_str(),
        }
    }
}

/// Secondary index addressed by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name as known to the store.
    pub name: String,
    pub partition_attr: &'static str,
    pub sort_attr: &'static str,
}

/// Range query within one partition of the table or a secondary index.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// `None` queries the table's primary key.
    pub index: Option<IndexSpec>,
    pub partition: String,
    pub sort: Option<SortCondition>,
    /// Ascending sort-key order when true.
    pub scan_forward: bool,
    pub limit: Option<u32>,
    pub exclusive_start_key: Option<Item>,
}

impl QueryRequest {
    pub fn table(partition: impl Into<String>) -> Self {
        Self {
            index: None,
            partition: partition.into(),
            sort: None,
            scan_forward: true,
            limit: None,
            exclusive_start_key: None,
        }
    }

    pub fn index(index: IndexSpec, partition: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            ..Self::table(partition)
        }
    }

    pub fn with_sort(mut self, sort: SortCondition) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn descending(mut self) -> Self {
        self.scan_forward = false;
        self
    }

    /// Attribute names that make up a position in this query's result order.
    pub fn key_attributes(&self) -> Vec<&'static str> {
        let mut attrs = vec![schema::ATTR_PK, schema::ATTR_SK];
        if let Some(index) = &self.index {
            attrs.push(index.partition_attr);
            attrs.push(index.sort_attr);
        }
        attrs
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub items: Vec<Item>,
    /// Present when the store stopped early; resume from here.
    pub last_evaluated_key: Option<Item>,
}

/// One element of an ordered transactional write.
#[derive(Debug, Clone)]
pub enum TransactOp {
    Put {
        item: Item,
        condition: Option<Condition>,
    },
    ConditionCheck {
        key: PrimaryKey,
        condition: Condition,
    },
}

impl TransactOp {
    /// Primary key targeted by this operation.
    pub fn key(&self) -> Result<PrimaryKey> {
        match self {
            Self::Put { item, .. } => item::primary_key_of(item),
            Self::ConditionCheck { key, .. } => Ok(key.clone()),
        }
    }
}

/// Interface for partition/sort-key item persistence.
///
/// Every method is a single remote call with the store's own atomicity:
/// conditions are evaluated and applied atomically per item, and
/// `transact_write` applies all operations or none.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Strongly consistent point read.
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Item>>;

    /// Write an item.
    ///
    /// Fails with `ConditionalCheckFailed` when the condition is false.
    async fn put_item(&self, request: PutRequest) -> Result<()>;

    /// Update an item in place and return all attributes after the update.
    ///
    /// Fails with `ConditionalCheckFailed` when the condition is false.
    async fn update_item(&self, request: UpdateRequest) -> Result<Item>;

    /// Delete an item. Deleting a missing item succeeds.
    async fn delete_item(&self, key: &PrimaryKey) -> Result<()>;

    /// Range query within one partition.
    async fn query(&self, request: QueryRequest) -> Result<QueryOutput>;

    /// Apply an ordered list of operations atomically.
    ///
    /// On failure returns `TransactionCanceled` whose reasons are aligned
    /// with `ops` by position.
    async fn transact_write(&self, ops: Vec<TransactOp>) -> Result<()>;
}
