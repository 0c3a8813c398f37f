//! Operations shared by every facade.

use tracing::{debug, error, warn};

use super::StoreContext;
use crate::error::{self, EntityKind, Error, Result};
use crate::model::{timestamp, Entity};
use crate::pagination::{self, Page, PageRequest};
use crate::storage::item;
use crate::storage::schema::{ATTR_MODIFIED, ATTR_PK, ATTR_SK};
use crate::storage::{
    AttributeValue, Condition, PrimaryKey, PutRequest, QueryRequest, StoreError, UpdateRequest,
};
use crate::transaction::WriteTransaction;

/// Log a failed facade call: domain outcomes at warn, store faults at error.
pub(crate) fn log_failure(operation: &'static str, entity: EntityKind, err: &Error) {
    if err.is_domain() {
        warn!(operation, entity = %entity, error = %err, "Storage operation rejected");
    } else {
        error!(operation, entity = %entity, error = %err, "Storage operation failed");
    }
}

/// Point read. Absence is `Ok(None)`.
pub(crate) async fn fetch<T: Entity>(ctx: &StoreContext, key: &PrimaryKey) -> Result<Option<T>> {
    let found = ctx.store().get_item(key).await.map_err(error::translate)?;
    found
        .map(|item| T::from_item(&item))
        .transpose()
        .map_err(Error::from)
}

/// Write `entity` as the only operation, failing if it already exists.
pub(crate) async fn put_unique<T: Entity>(ctx: &StoreContext, entity: &T) -> Result<()> {
    let request = PutRequest {
        item: entity.to_item(),
        condition: Some(Condition::NotExists),
    };
    ctx.store()
        .put_item(request)
        .await
        .map_err(|err| match err {
            StoreError::ConditionalCheckFailed => {
                Error::duplicate(entity.kind(), entity.natural_key())
            }
            other => error::translate(other),
        })
}

/// Start a create transaction with the entity's own uniqueness check at
/// position 0.
pub(crate) fn create_transaction<T: Entity>(entity: &T) -> WriteTransaction {
    let mut tx = WriteTransaction::new();
    tx.put_unique(entity.to_item(), entity.kind(), entity.natural_key());
    tx
}

/// Commit a create transaction and return the persisted entity.
pub(crate) async fn commit_and_fetch<T: Entity>(
    ctx: &StoreContext,
    entity: &T,
    tx: WriteTransaction,
) -> Result<T> {
    tx.execute(ctx.store()).await?;
    reread(ctx, entity).await
}

/// Follow-up read after a successful write.
pub(crate) async fn reread<T: Entity>(ctx: &StoreContext, entity: &T) -> Result<T> {
    let key = entity.primary_key();
    let persisted = fetch::<T>(ctx, &key)
        .await?
        .ok_or_else(|| Error::not_found(entity.kind(), entity.natural_key()))?;
    debug!(pk = %key.pk, sk = %key.sk, entity = %entity.kind(), "Created entity");
    Ok(persisted)
}

/// Build the conditional update that rewrites every mutable attribute.
fn update_request<T: Entity>(entity: &T) -> UpdateRequest {
    let mut request = UpdateRequest::new(entity.primary_key());
    request.condition = Some(Condition::Exists);

    for (name, value) in entity.to_item() {
        if name == ATTR_PK || name == ATTR_SK {
            continue;
        }
        if T::IMMUTABLE_ATTRIBUTES.contains(&name.as_str()) {
            request.set_if_absent.insert(name, value);
        } else {
            request.set.insert(name, value);
        }
    }
    request.set.insert(
        ATTR_MODIFIED.to_string(),
        AttributeValue::S(timestamp::format(&timestamp::now())),
    );
    request.remove = T::OPTIONAL_ATTRIBUTES
        .iter()
        .filter(|name| !request.set.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    request
}

/// Replace the mutable state of an existing entity and return the
/// post-image. `created` is preserved and `modified` advances.
pub(crate) async fn update<T: Entity>(ctx: &StoreContext, entity: &T) -> Result<T> {
    entity.validate()?;
    let after = ctx
        .store()
        .update_item(update_request(entity))
        .await
        .map_err(|err| error::translate_update(err, entity.kind(), entity.natural_key()))?;
    Ok(T::from_item(&after)?)
}

/// Unconditional, idempotent delete.
pub(crate) async fn delete(ctx: &StoreContext, key: &PrimaryKey) -> Result<()> {
    ctx.store().delete_item(key).await.map_err(error::translate)?;
    debug!(pk = %key.pk, sk = %key.sk, "Deleted item");
    Ok(())
}

/// Run a paged query.
///
/// Over-fetches by one so `next_token` is `None` exactly when nothing
/// follows, and keeps reading while the store stops short of that.
pub(crate) async fn query_page<T: Entity>(
    ctx: &StoreContext,
    mut request: QueryRequest,
    page: &PageRequest,
) -> Result<Page<T>> {
    let limit = page.resolved_limit()? as usize;
    let key_attrs = request.key_attributes();

    let start = page.start_key()?;
    if let Some(start) = &start {
        check_start_key(&request, &key_attrs, start)?;
    }
    request.exclusive_start_key = start;

    let mut items = Vec::with_capacity(limit + 1);
    loop {
        request.limit = u32::try_from(limit + 1 - items.len()).ok();
        let output = ctx
            .store()
            .query(request.clone())
            .await
            .map_err(error::translate)?;
        items.extend(output.items);

        match output.last_evaluated_key {
            Some(last) if items.len() <= limit => request.exclusive_start_key = Some(last),
            _ => break,
        }
    }

    let next_token = if items.len() > limit {
        items.truncate(limit);
        match items.last() {
            Some(last) => Some(pagination::encode_token(&item::project(last, &key_attrs))?),
            None => None,
        }
    } else {
        None
    };

    let items = items
        .iter()
        .map(T::from_item)
        .collect::<crate::storage::Result<Vec<_>>>()?;

    Ok(Page { items, next_token })
}

/// A token must name a position inside the partition being queried.
fn check_start_key(
    request: &QueryRequest,
    key_attrs: &[&'static str],
    start: &item::Item,
) -> Result<()> {
    let partition_attr = request
        .index
        .as_ref()
        .map_or(ATTR_PK, |index| index.partition_attr);

    let complete = key_attrs.iter().all(|name| start.contains_key(*name))
        && start.len() == key_attrs.len();
    let same_partition = start
        .get(partition_attr)
        .and_then(AttributeValue::as_s)
        .is_some_and(|pk| pk == request.partition);

    if complete && same_partition {
        Ok(())
    } else {
        Err(Error::validation(
            "next_token",
            "token does not belong to this listing",
        ))
    }
}
