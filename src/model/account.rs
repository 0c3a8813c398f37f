//! Accounts: users and organizations sharing one name space.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{base_item, read_base, Entity};
use crate::error::{EntityKind, NaturalKey, Result};
use crate::keys;
use crate::storage::item::{self, Item};
use crate::storage::schema::ATTR_CREATED;
use crate::storage::PrimaryKey;
use crate::validation::{self, limits};

pub const ENTITY_TYPE: &str = "account";

const ATTR_NAME: &str = "name";
const ATTR_KIND: &str = "kind";
const ATTR_EMAIL: &str = "email";
const ATTR_DISPLAY_NAME: &str = "display_name";
const ATTR_BIO: &str = "bio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    User,
    Organization,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "organization" => Ok(Self::Organization),
            other => Err(format!("unknown account kind '{other}'")),
        }
    }
}

/// Account to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

impl NewAccount {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AccountKind::User,
            email: None,
            display_name: None,
            bio: None,
        }
    }

    pub fn organization(name: impl Into<String>) -> Self {
        Self {
            kind: AccountKind::Organization,
            ..Self::user(name)
        }
    }

    pub(crate) fn into_account(self, now: DateTime<Utc>) -> Account {
        Account {
            name: self.name,
            kind: self.kind,
            email: self.email,
            display_name: self.display_name,
            bio: self.bio,
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub kind: AccountKind,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Account {
    pub fn key_of(name: &str) -> NaturalKey {
        NaturalKey::new().with("name", name)
    }

    pub fn is_user(&self) -> bool {
        self.kind == AccountKind::User
    }
}

impl Entity for Account {
    /// `kind` is fixed at creation.
    const IMMUTABLE_ATTRIBUTES: &'static [&'static str] = &[ATTR_CREATED, ATTR_KIND];

    const OPTIONAL_ATTRIBUTES: &'static [&'static str] = &[ATTR_EMAIL, ATTR_DISPLAY_NAME, ATTR_BIO];

    fn kind(&self) -> EntityKind {
        EntityKind::Account
    }

    fn primary_key(&self) -> PrimaryKey {
        keys::account_key(&self.name)
    }

    fn natural_key(&self) -> NaturalKey {
        Self::key_of(&self.name)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_account_name("name", &self.name)?;
        validation::validate_email("email", self.email.as_deref())?;
        validation::validate_optional_text(
            "display_name",
            self.display_name.as_deref(),
            limits::MAX_SHORT_TEXT_LENGTH,
        )?;
        validation::validate_optional_text("bio", self.bio.as_deref(), limits::MAX_DESCRIPTION_LENGTH)
    }

    fn to_item(&self) -> Item {
        base_item(&self.primary_key(), ENTITY_TYPE, &self.created, &self.modified)
            .string(ATTR_NAME, &self.name)
            .string(ATTR_KIND, self.kind.as_str())
            .optional_string(ATTR_EMAIL, self.email.as_deref())
            .optional_string(ATTR_DISPLAY_NAME, self.display_name.as_deref())
            .optional_string(ATTR_BIO, self.bio.as_deref())
            .build()
    }

    fn from_item(item: &Item) -> crate::storage::Result<Self> {
        let (created, modified) = read_base(item, ENTITY_TYPE)?;
        Ok(Self {
            name: item::required_string(item, ATTR_NAME)?,
            kind: item::required_parsed(item, ATTR_KIND)?,
            email: item::optional_string(item, ATTR_EMAIL)?,
            display_name: item::optional_string(item, ATTR_DISPLAY_NAME)?,
            bio: item::optional_string(item, ATTR_BIO)?,
            created,
            modified,
        })
    }
}

/// Condition value identifying a user account.
pub(crate) fn user_kind_value() -> (&'static str, &'static str) {
    (ATTR_KIND, AccountKind::User.as_str())
}
