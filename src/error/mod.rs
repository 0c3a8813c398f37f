//! Domain error taxonomy.
//!
//! Facades report exactly three expected outcomes besides success:
//! [`Error::Validation`], [`Error::DuplicateEntity`] and
//! [`Error::EntityNotFound`]. Each carries structured identifying data so
//! callers can render precise responses without parsing messages. Any
//! store failure that is not one of these passes through unchanged as
//! [`Error::Store`].

mod translate;

use std::fmt;

pub use translate::{translate, translate_transaction, translate_update, FailureCause};

use crate::storage::StoreError;

/// Result type for access-layer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the repository facades.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client-supplied data failed a format or business rule.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The entity's own uniqueness condition failed.
    #[error("{entity} already exists ({key})")]
    DuplicateEntity { entity: EntityKind, key: NaturalKey },

    /// The entity, or a parent it references, does not exist.
    #[error("{entity} not found ({key})")]
    EntityNotFound { entity: EntityKind, key: NaturalKey },

    /// Unrecognised store failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn duplicate(entity: EntityKind, key: NaturalKey) -> Self {
        Self::DuplicateEntity { entity, key }
    }

    pub fn not_found(entity: EntityKind, key: NaturalKey) -> Self {
        Self::EntityNotFound { entity, key }
    }

    /// True for the three domain kinds; false for pass-through store errors.
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Entity types named in domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Account,
    /// An account that must be of kind User.
    User,
    Repository,
    Issue,
    PullRequest,
    IssueComment,
    PullRequestComment,
    Reaction,
    Fork,
    Star,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::User => "User",
            Self::Repository => "Repository",
            Self::Issue => "Issue",
            Self::PullRequest => "PullRequest",
            Self::IssueComment => "IssueComment",
            Self::PullRequestComment => "PullRequestComment",
            Self::Reaction => "Reaction",
            Self::Fork => "Fork",
            Self::Star => "Star",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered business key of an entity, e.g. `owner=acme, repo_name=widgets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NaturalKey(Vec<(&'static str, String)>);

impl NaturalKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &'static str, value: impl ToString) -> Self {
        self.0.push((field, value.to_string()));
        self
    }

    /// Value of a named field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}
