//! Repositories, owned by an account.

use chrono::{DateTime, Utc};

use super::{base_item, read_base, timestamp, Entity};
use crate::error::{EntityKind, NaturalKey, Result};
use crate::keys;
use crate::storage::item::{self, Item};
use crate::storage::schema::{ATTR_CREATED, ATTR_GSI1_PK, ATTR_GSI1_SK};
use crate::storage::PrimaryKey;
use crate::validation::{self, limits};

pub const ENTITY_TYPE: &str = "repository";

const ATTR_OWNER: &str = "owner";
const ATTR_REPO_NAME: &str = "repo_name";
const ATTR_DESCRIPTION: &str = "description";
const ATTR_IS_PRIVATE: &str = "is_private";
const ATTR_LANGUAGE: &str = "language";

/// Repository to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub owner: String,
    pub repo_name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub language: Option<String>,
}

impl NewRepository {
    pub fn new(owner: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
            description: None,
            is_private: false,
            language: None,
        }
    }

    pub(crate) fn into_repository(self, now: DateTime<Utc>) -> Repository {
        Repository {
            owner: self.owner,
            repo_name: self.repo_name,
            description: self.description,
            is_private: self.is_private,
            language: self.language,
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub repo_name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub language: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Repository {
    pub fn key_of(owner: &str, repo_name: &str) -> NaturalKey {
        NaturalKey::new()
            .with("owner", owner)
            .with("repo_name", repo_name)
    }
}

impl Entity for Repository {
    // The account index sorts on creation time, so it is immutable too.
    const IMMUTABLE_ATTRIBUTES: &'static [&'static str] = &[ATTR_CREATED, ATTR_GSI1_SK];
    const OPTIONAL_ATTRIBUTES: &'static [&'static str] = &[ATTR_DESCRIPTION, ATTR_LANGUAGE];

    fn kind(&self) -> EntityKind {
        EntityKind::Repository
    }

    fn primary_key(&self) -> PrimaryKey {
        keys::repository_key(&self.owner, &self.repo_name)
    }

    fn natural_key(&self) -> NaturalKey {
        Self::key_of(&self.owner, &self.repo_name)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_account_name("owner", &self.owner)?;
        validation::validate_repo_name("repo_name", &self.repo_name)?;
        validation::validate_optional_text(
            "description",
            self.description.as_deref(),
            limits::MAX_DESCRIPTION_LENGTH,
        )?;
        validation::validate_optional_text(
            "language",
            self.language.as_deref(),
            limits::MAX_SHORT_TEXT_LENGTH,
        )
    }

    fn to_item(&self) -> Item {
        let (gsi1_pk, gsi1_sk) =
            keys::account_repositories_index(&self.owner, &timestamp::format(&self.created));
        base_item(&self.primary_key(), ENTITY_TYPE, &self.created, &self.modified)
            .string(ATTR_GSI1_PK, gsi1_pk)
            .string(ATTR_GSI1_SK, gsi1_sk)
            .string(ATTR_OWNER, &self.owner)
            .string(ATTR_REPO_NAME, &self.repo_name)
            .optional_string(ATTR_DESCRIPTION, self.description.as_deref())
            .boolean(ATTR_IS_PRIVATE, self.is_private)
            .optional_string(ATTR_LANGUAGE, self.language.as_deref())
            .build()
    }

    fn from_item(item: &Item) -> crate::storage::Result<Self> {
        let (created, modified) = read_base(item, ENTITY_TYPE)?;
        Ok(Self {
            owner: item::required_string(item, ATTR_OWNER)?,
            repo_name: item::required_string(item, ATTR_REPO_NAME)?,
            description: item::optional_string(item, ATTR_DESCRIPTION)?,
            is_private: item::boolean_or(item, ATTR_IS_PRIVATE, false)?,
            language: item::optional_string(item, ATTR_LANGUAGE)?,
            created,
            modified,
        })
    }
}
