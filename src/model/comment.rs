//! Comments on issues and pull requests.
//!
//! Both kinds share one shape and differ only in their parent. Comment ids
//! are generated client-side before the write.

use std::fmt;

use chrono::{DateTime, Utc};

use super::{base_item, read_base, Entity};
use crate::error::{EntityKind, NaturalKey, Result};
use crate::keys::{self, NumberedKind};
use crate::model::{Issue, PullRequest};
use crate::storage::item::{self, Item};
use crate::storage::{PrimaryKey, StoreError};
use crate::validation::{self, limits};

pub const ISSUE_COMMENT_TYPE: &str = "issue_comment";
pub const PR_COMMENT_TYPE: &str = "pr_comment";

const ATTR_OWNER: &str = "owner";
const ATTR_REPO_NAME: &str = "repo_name";
const ATTR_COMMENT_ID: &str = "comment_id";
const ATTR_BODY: &str = "body";
const ATTR_AUTHOR: &str = "author";

/// What a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentParent {
    Issue,
    PullRequest,
}

impl CommentParent {
    pub fn numbered_kind(self) -> NumberedKind {
        match self {
            Self::Issue => NumberedKind::Issue,
            Self::PullRequest => NumberedKind::PullRequest,
        }
    }

    /// Entity kind of the comment itself.
    pub fn comment_kind(self) -> EntityKind {
        match self {
            Self::Issue => EntityKind::IssueComment,
            Self::PullRequest => EntityKind::PullRequestComment,
        }
    }

    /// Entity kind of the parent.
    pub fn parent_kind(self) -> EntityKind {
        match self {
            Self::Issue => EntityKind::Issue,
            Self::PullRequest => EntityKind::PullRequest,
        }
    }

    pub fn entity_type(self) -> &'static str {
        match self {
            Self::Issue => ISSUE_COMMENT_TYPE,
            Self::PullRequest => PR_COMMENT_TYPE,
        }
    }

    /// Attribute and natural-key field holding the parent number.
    pub fn number_field(self) -> &'static str {
        match self {
            Self::Issue => "issue_number",
            Self::PullRequest => "pr_number",
        }
    }

    pub fn parent_key(self, owner: &str, repo_name: &str, number: u32) -> PrimaryKey {
        match self {
            Self::Issue => keys::issue_key(owner, repo_name, number),
            Self::PullRequest => keys::pull_request_key(owner, repo_name, number),
        }
    }

    pub fn parent_natural_key(self, owner: &str, repo_name: &str, number: u32) -> NaturalKey {
        match self {
            Self::Issue => Issue::key_of(owner, repo_name, number),
            Self::PullRequest => PullRequest::key_of(owner, repo_name, number),
        }
    }
}

impl fmt::Display for CommentParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.parent_kind().as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub parent: CommentParent,
    pub owner: String,
    pub repo_name: String,
    pub number: u32,
    pub body: String,
    pub author: String,
}

impl NewComment {
    pub fn new(
        parent: CommentParent,
        owner: impl Into<String>,
        repo_name: impl Into<String>,
        number: u32,
        body: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            parent,
            owner: owner.into(),
            repo_name: repo_name.into(),
            number,
            body: body.into(),
            author: author.into(),
        }
    }

    pub(crate) fn into_comment(self, comment_id: String, now: DateTime<Utc>) -> Comment {
        Comment {
            parent: self.parent,
            owner: self.owner,
            repo_name: self.repo_name,
            number: self.number,
            comment_id,
            body: self.body,
            author: self.author,
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub parent: CommentParent,
    pub owner: String,
    pub repo_name: String,
    /// Issue or pull request number.
    pub number: u32,
    pub comment_id: String,
    pub body: String,
    pub author: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Comment {
    pub fn key_of(
        parent: CommentParent,
        owner: &str,
        repo_name: &str,
        number: u32,
        comment_id: &str,
    ) -> NaturalKey {
        parent
            .parent_natural_key(owner, repo_name, number)
            .with("comment_id", comment_id)
    }

    pub fn parent_key(&self) -> PrimaryKey {
        self.parent.parent_key(&self.owner, &self.repo_name, self.number)
    }
}

impl Entity for Comment {
    fn kind(&self) -> EntityKind {
        self.parent.comment_kind()
    }

    fn primary_key(&self) -> PrimaryKey {
        keys::comment_key(
            self.parent.numbered_kind(),
            &self.owner,
            &self.repo_name,
            self.number,
            &self.comment_id,
        )
    }

    fn natural_key(&self) -> NaturalKey {
        Self::key_of(
            self.parent,
            &self.owner,
            &self.repo_name,
            self.number,
            &self.comment_id,
        )
    }

    fn validate(&self) -> Result<()> {
        validation::validate_account_name("owner", &self.owner)?;
        validation::validate_repo_name("repo_name", &self.repo_name)?;
        validation::validate_number(self.parent.number_field(), u64::from(self.number))?;
        validation::validate_key_segment(
            "comment_id",
            &self.comment_id,
            limits::MAX_COMMENT_ID_LENGTH,
        )?;
        validation::validate_text("body", &self.body, limits::MAX_BODY_LENGTH)?;
        validation::validate_account_name("author", &self.author)
    }

    fn to_item(&self) -> Item {
        base_item(
            &self.primary_key(),
            self.parent.entity_type(),
            &self.created,
            &self.modified,
        )
        .string(ATTR_OWNER, &self.owner)
        .string(ATTR_REPO_NAME, &self.repo_name)
        .number(self.parent.number_field(), self.number)
        .string(ATTR_COMMENT_ID, &self.comment_id)
        .string(ATTR_BODY, &self.body)
        .string(ATTR_AUTHOR, &self.author)
        .build()
    }

    fn from_item(item: &Item) -> crate::storage::Result<Self> {
        let parent = match item::optional_string(item, crate::storage::schema::ATTR_ENTITY_TYPE)?
            .as_deref()
        {
            Some(ISSUE_COMMENT_TYPE) => CommentParent::Issue,
            Some(PR_COMMENT_TYPE) => CommentParent::PullRequest,
            other => {
                return Err(StoreError::malformed(
                    crate::storage::schema::ATTR_ENTITY_TYPE,
                    format!("expected a comment, found {other:?}"),
                ))
            }
        };
        let (created, modified) = read_base(item, parent.entity_type())?;
        Ok(Self {
            parent,
            owner: item::required_string(item, ATTR_OWNER)?,
            repo_name: item::required_string(item, ATTR_REPO_NAME)?,
            number: item::required_number(item, parent.number_field())?,
            comment_id: item::required_string(item, ATTR_COMMENT_ID)?,
            body: item::required_string(item, ATTR_BODY)?,
            author: item::required_string(item, ATTR_AUTHOR)?,
            created,
            modified,
        })
    }
}
