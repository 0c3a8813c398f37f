//! Domain entities and their item codecs.
//!
//! Each entity knows its own keys, its natural key for error reporting and
//! how to convert to and from a store item. Index keys are derived in
//! `to_item`, so a rewrite of the whole item also refreshes any
//! attribute-dependent index (the status index).

pub mod account;
pub mod comment;
pub mod fork;
pub mod issue;
pub mod pull_request;
pub mod reaction;
pub mod repository;
pub mod star;
pub mod timestamp;

use chrono::{DateTime, Utc};

pub use account::{Account, AccountKind, NewAccount};
pub use comment::{Comment, CommentParent, NewComment};
pub use fork::{Fork, NewFork};
pub use issue::{Issue, IssueStatus, NewIssue};
pub use pull_request::{NewPullRequest, PullRequest, PullRequestStatus};
pub use reaction::{NewReaction, Reaction, ReactionTarget};
pub use repository::{NewRepository, Repository};
pub use star::{NewStar, Star};

use crate::error::{EntityKind, NaturalKey};
use crate::storage::item::{self, Item, ItemBuilder};
use crate::storage::schema::{ATTR_CREATED, ATTR_ENTITY_TYPE, ATTR_MODIFIED};
use crate::storage::{PrimaryKey, StoreError};

/// A persisted entity.
pub trait Entity: Sized + Send + Sync {
    /// Attributes an update never overwrites.
    const IMMUTABLE_ATTRIBUTES: &'static [&'static str] = &[ATTR_CREATED];

    /// Attributes that may be absent. An update removes them when the new
    /// state omits them.
    const OPTIONAL_ATTRIBUTES: &'static [&'static str] = &[];

    fn kind(&self) -> EntityKind;

    fn primary_key(&self) -> PrimaryKey;

    fn natural_key(&self) -> NaturalKey;

    /// Check caller-supplied fields.
    fn validate(&self) -> crate::error::Result<()>;

    fn to_item(&self) -> Item;

    fn from_item(item: &Item) -> crate::storage::Result<Self>;
}

/// Item skeleton shared by every entity: key, type tag and timestamps.
pub(crate) fn base_item(
    key: &PrimaryKey,
    entity_type: &str,
    created: &DateTime<Utc>,
    modified: &DateTime<Utc>,
) -> ItemBuilder {
    ItemBuilder::new(key)
        .string(ATTR_ENTITY_TYPE, entity_type)
        .timestamp(ATTR_CREATED, created)
        .timestamp(ATTR_MODIFIED, modified)
}

/// Read the type tag and timestamps, rejecting items of another type.
pub(crate) fn read_base(
    item: &Item,
    expected: &str,
) -> crate::storage::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let entity_type = item::required_string(item, ATTR_ENTITY_TYPE)?;
    if entity_type != expected {
        return Err(StoreError::malformed(
            ATTR_ENTITY_TYPE,
            format!("expected '{expected}', found '{entity_type}'"),
        ));
    }
    Ok((
        item::required_timestamp(item, ATTR_CREATED)?,
        item::required_timestamp(item, ATTR_MODIFIED)?,
    ))
}
