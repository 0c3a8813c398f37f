//! Fork relationships between two existing repositories.

use chrono::{DateTime, Utc};

use super::{base_item, read_base, Entity};
use crate::error::{EntityKind, NaturalKey, Result};
use crate::keys;
use crate::storage::item::{self, Item};
use crate::storage::schema::{ATTR_GSI3_PK, ATTR_GSI3_SK};
use crate::storage::PrimaryKey;
use crate::validation;

pub const ENTITY_TYPE: &str = "fork";

const ATTR_ORIGINAL_OWNER: &str = "original_owner";
const ATTR_ORIGINAL_REPO: &str = "original_repo";
const ATTR_FORK_OWNER: &str = "fork_owner";
const ATTR_FORK_REPO: &str = "fork_repo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFork {
    pub original_owner: String,
    pub original_repo: String,
    pub fork_owner: String,
    pub fork_repo: String,
}

impl NewFork {
    pub fn new(
        original_owner: impl Into<String>,
        original_repo: impl Into<String>,
        fork_owner: impl Into<String>,
        fork_repo: impl Into<String>,
    ) -> Self {
        Self {
            original_owner: original_owner.into(),
            original_repo: original_repo.into(),
            fork_owner: fork_owner.into(),
            fork_repo: fork_repo.into(),
        }
    }

    pub(crate) fn into_fork(self, now: DateTime<Utc>) -> Fork {
        Fork {
            original_owner: self.original_owner,
            original_repo: self.original_repo,
            fork_owner: self.fork_owner,
            fork_repo: self.fork_repo,
            created: now,
            modified: now,
        }
    }
}

/// `fork_owner/fork_repo` is a fork of `original_owner/original_repo`.
///
/// An account holds at most one fork of a given repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fork {
    pub original_owner: String,
    pub original_repo: String,
    pub fork_owner: String,
    pub fork_repo: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Fork {
    pub fn key_of(original_owner: &str, original_repo: &str, fork_owner: &str) -> NaturalKey {
        NaturalKey::new()
            .with("original_owner", original_owner)
            .with("original_repo", original_repo)
            .with("fork_owner", fork_owner)
    }

    pub fn source_key(&self) -> PrimaryKey {
        keys::repository_key(&self.original_owner, &self.original_repo)
    }

    pub fn target_key(&self) -> PrimaryKey {
        keys::repository_key(&self.fork_owner, &self.fork_repo)
    }
}

impl Entity for Fork {
    fn kind(&self) -> EntityKind {
        EntityKind::Fork
    }

    fn primary_key(&self) -> PrimaryKey {
        keys::fork_key(&self.original_owner, &self.original_repo, &self.fork_owner)
    }

    fn natural_key(&self) -> NaturalKey {
        Self::key_of(&self.original_owner, &self.original_repo, &self.fork_owner)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_account_name("original_owner", &self.original_owner)?;
        validation::validate_repo_name("original_repo", &self.original_repo)?;
        validation::validate_account_name("fork_owner", &self.fork_owner)?;
        validation::validate_repo_name("fork_repo", &self.fork_repo)?;
        if self.original_owner == self.fork_owner {
            return Err(crate::error::Error::validation(
                "fork_owner",
                "cannot fork a repository into its own account",
            ));
        }
        Ok(())
    }

    fn to_item(&self) -> Item {
        let (gsi3_pk, gsi3_sk) =
            keys::account_forks_index(&self.fork_owner, &self.original_owner, &self.original_repo);
        base_item(&self.primary_key(), ENTITY_TYPE, &self.created, &self.modified)
            .string(ATTR_GSI3_PK, gsi3_pk)
            .string(ATTR_GSI3_SK, gsi3_sk)
            .string(ATTR_ORIGINAL_OWNER, &self.original_owner)
            .string(ATTR_ORIGINAL_REPO, &self.original_repo)
            .string(ATTR_FORK_OWNER, &self.fork_owner)
            .string(ATTR_FORK_REPO, &self.fork_repo)
            .build()
    }

    fn from_item(item: &Item) -> crate::storage::Result<Self> {
        let (created, modified) = read_base(item, ENTITY_TYPE)?;
        Ok(Self {
            original_owner: item::required_string(item, ATTR_ORIGINAL_OWNER)?,
            original_repo: item::required_string(item, ATTR_ORIGINAL_REPO)?,
            fork_owner: item::required_string(item, ATTR_FORK_OWNER)?,
            fork_repo: item::required_string(item, ATTR_FORK_REPO)?,
            created,
            modified,
        })
    }
}
