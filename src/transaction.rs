//! Transactional write coordinator.
//!
//! A [`WriteTransaction`] is an ordered list of conditional operations,
//! each paired with the failure it stands for. By convention position 0 is
//! the entity's own uniqueness check and later positions are parent
//! existence checks; on cancellation the store reports outcomes by
//! position and the translator picks the matching cause.

use tracing::debug;

use crate::error::{self, EntityKind, Error, FailureCause, NaturalKey};
use crate::storage::{
    AttributeValue, Condition, Item, ItemStore, PrimaryKey, TransactOp, MAX_TRANSACT_ITEMS,
};

#[derive(Debug, Default)]
pub struct WriteTransaction {
    ops: Vec<TransactOp>,
    causes: Vec<FailureCause>,
}

impl WriteTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `item` only if no item exists at its key.
    pub fn put_unique(&mut self, item: Item, entity: EntityKind, key: NaturalKey) -> &mut Self {
        self.ops.push(TransactOp::Put {
            item,
            condition: Some(Condition::NotExists),
        });
        self.causes.push(FailureCause::Duplicate { entity, key });
        self
    }

    /// Require an item to exist at `target`, without modifying it.
    pub fn require_exists(
        &mut self,
        target: PrimaryKey,
        entity: EntityKind,
        key: NaturalKey,
    ) -> &mut Self {
        self.ops.push(TransactOp::ConditionCheck {
            key: target,
            condition: Condition::Exists,
        });
        self.causes.push(FailureCause::MissingParent { entity, key });
        self
    }

    /// Require an item to exist at `target` with `name = value`.
    pub fn require_attribute(
        &mut self,
        target: PrimaryKey,
        name: &str,
        value: AttributeValue,
        entity: EntityKind,
        key: NaturalKey,
    ) -> &mut Self {
        self.ops.push(TransactOp::ConditionCheck {
            key: target,
            condition: Condition::AttributeEquals {
                name: name.to_string(),
                value,
            },
        });
        self.causes.push(FailureCause::MissingParent { entity, key });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Submit all operations as one atomic unit.
    pub async fn execute(self, store: &dyn ItemStore) -> error::Result<()> {
        if self.ops.is_empty() || self.ops.len() > MAX_TRANSACT_ITEMS {
            return Err(Error::validation(
                "transaction",
                format!(
                    "must contain between 1 and {MAX_TRANSACT_ITEMS} operations (got: {})",
                    self.ops.len()
                ),
            ));
        }

        let count = self.ops.len();
        store
            .transact_write(self.ops)
            .await
            .map_err(|e| error::translate_transaction(e, &self.causes))?;

        debug!(ops = count, "Executed write transaction");
        Ok(())
    }
}
