//! Stars: a user's bookmark on a repository.

use chrono::{DateTime, Utc};

use super::{base_item, read_base, Entity};
use crate::error::{EntityKind, NaturalKey, Result};
use crate::keys;
use crate::storage::item::{self, Item};
use crate::storage::schema::{ATTR_GSI2_PK, ATTR_GSI2_SK};
use crate::storage::PrimaryKey;
use crate::validation;

pub const ENTITY_TYPE: &str = "star";

const ATTR_USERNAME: &str = "username";
const ATTR_REPO_OWNER: &str = "repo_owner";
const ATTR_REPO_NAME: &str = "repo_name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStar {
    pub username: String,
    pub repo_owner: String,
    pub repo_name: String,
}

impl NewStar {
    pub fn new(
        username: impl Into<String>,
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
        }
    }

    pub(crate) fn into_star(self, now: DateTime<Utc>) -> Star {
        Star {
            username: self.username,
            repo_owner: self.repo_owner,
            repo_name: self.repo_name,
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Star {
    pub username: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Star {
    pub fn key_of(username: &str, repo_owner: &str, repo_name: &str) -> NaturalKey {
        NaturalKey::new()
            .with("username", username)
            .with("repo_owner", repo_owner)
            .with("repo_name", repo_name)
    }
}

impl Entity for Star {
    fn kind(&self) -> EntityKind {
        EntityKind::Star
    }

    fn primary_key(&self) -> PrimaryKey {
        keys::star_key(&self.username, &self.repo_owner, &self.repo_name)
    }

    fn natural_key(&self) -> NaturalKey {
        Self::key_of(&self.username, &self.repo_owner, &self.repo_name)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_account_name("username", &self.username)?;
        validation::validate_account_name("repo_owner", &self.repo_owner)?;
        validation::validate_repo_name("repo_name", &self.repo_name)
    }

    fn to_item(&self) -> Item {
        let (gsi2_pk, gsi2_sk) =
            keys::stargazers_index(&self.username, &self.repo_owner, &self.repo_name);
        base_item(&self.primary_key(), ENTITY_TYPE, &self.created, &self.modified)
            .string(ATTR_GSI2_PK, gsi2_pk)
            .string(ATTR_GSI2_SK, gsi2_sk)
            .string(ATTR_USERNAME, &self.username)
            .string(ATTR_REPO_OWNER, &self.repo_owner)
            .string(ATTR_REPO_NAME, &self.repo_name)
            .build()
    }

    fn from_item(item: &Item) -> crate::storage::Result<Self> {
        let (created, modified) = read_base(item, ENTITY_TYPE)?;
        Ok(Self {
            username: item::required_string(item, ATTR_USERNAME)?,
            repo_owner: item::required_string(item, ATTR_REPO_OWNER)?,
            repo_name: item::required_string(item, ATTR_REPO_NAME)?,
            created,
            modified,
        })
    }
}
