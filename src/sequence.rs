//! Atomic per-repository sequence.
//!
//! Issue and pull request numbers are drawn from one counter item per
//! `(namespace, resource_id)`. Each draw is a single atomic add-and-return
//! update, so concurrent callers always receive distinct, increasing
//! values. A value consumed by a create that later fails is not reused.

use std::sync::Arc;

use tracing::debug;

use crate::keys;
use crate::model::timestamp;
use crate::storage::item::{self, AttributeValue};
use crate::storage::schema::{ATTR_CREATED, ATTR_ENTITY_TYPE, ATTR_MODIFIED};
use crate::storage::{ItemStore, Result, UpdateRequest};

pub const ENTITY_TYPE: &str = "counter";

/// Attribute holding the last issued value.
pub const ATTR_CURRENT_VALUE: &str = "current_value";

/// Increment-and-fetch counters backed by the item store.
#[derive(Clone)]
pub struct SequenceGenerator {
    store: Arc<dyn ItemStore>,
}

impl SequenceGenerator {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Advance the counter and return its new value.
    ///
    /// The first call for an unseen key creates the counter and returns 1.
    pub async fn increment_and_get(&self, namespace: &str, resource_id: &str) -> Result<u64> {
        let now = timestamp::format(&timestamp::now());
        let mut request = UpdateRequest::new(keys::counter_key(namespace, resource_id));
        request.add.insert(ATTR_CURRENT_VALUE.to_string(), 1);
        request
            .set
            .insert(ATTR_ENTITY_TYPE.to_string(), AttributeValue::from(ENTITY_TYPE));
        request
            .set
            .insert(ATTR_MODIFIED.to_string(), AttributeValue::S(now.clone()));
        request
            .set_if_absent
            .insert(ATTR_CREATED.to_string(), AttributeValue::S(now));

        let after = self.store.update_item(request).await?;
        let value = item::required_number(&after, ATTR_CURRENT_VALUE)?;

        debug!(namespace, resource_id, value, "Advanced sequence");
        Ok(value)
    }

    /// Last issued value, or `None` if the counter was never advanced.
    pub async fn current(&self, namespace: &str, resource_id: &str) -> Result<Option<u64>> {
        match self
            .store
            .get_item(&keys::counter_key(namespace, resource_id))
            .await?
        {
            Some(counter) => Ok(Some(item::required_number(&counter, ATTR_CURRENT_VALUE)?)),
            None => Ok(None),
        }
    }
}
