//! Issues, numbered from the repository sequence.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{base_item, read_base, Entity};
use crate::error::{EntityKind, NaturalKey, Result};
use crate::keys::{self, NumberedKind, StatusSegment};
use crate::storage::item::{self, Item};
use crate::storage::schema::{ATTR_GSI4_PK, ATTR_GSI4_SK};
use crate::storage::PrimaryKey;
use crate::validation::{self, limits};

pub const ENTITY_TYPE: &str = "issue";

const ATTR_OWNER: &str = "owner";
const ATTR_REPO_NAME: &str = "repo_name";
const ATTR_NUMBER: &str = "issue_number";
const ATTR_TITLE: &str = "title";
const ATTR_BODY: &str = "body";
const ATTR_STATUS: &str = "status";
const ATTR_AUTHOR: &str = "author";
const ATTR_ASSIGNEES: &str = "assignees";
const ATTR_LABELS: &str = "labels";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IssueStatus {
    #[default]
    Open,
    Closed,
}

impl IssueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub(crate) fn segment(self) -> StatusSegment {
        match self {
            Self::Open => StatusSegment::Open,
            Self::Closed => StatusSegment::Closed,
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown issue status '{other}'")),
        }
    }
}

/// Issue to create; the number is assigned from the repository sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub owner: String,
    pub repo_name: String,
    pub title: String,
    pub body: Option<String>,
    pub status: IssueStatus,
    pub author: String,
    pub assignees: BTreeSet<String>,
    pub labels: BTreeSet<String>,
}

impl NewIssue {
    pub fn new(
        owner: impl Into<String>,
        repo_name: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
            title: title.into(),
            body: None,
            status: IssueStatus::Open,
            author: author.into(),
            assignees: BTreeSet::new(),
            labels: BTreeSet::new(),
        }
    }

    /// Check every field before a number is drawn.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.owner,
            &self.repo_name,
            &self.title,
            self.body.as_deref(),
            &self.author,
            &self.assignees,
            &self.labels,
        )
    }

    pub(crate) fn into_issue(self, issue_number: u32, now: DateTime<Utc>) -> Issue {
        Issue {
            owner: self.owner,
            repo_name: self.repo_name,
            issue_number,
            title: self.title,
            body: self.body,
            status: self.status,
            author: self.author,
            assignees: self.assignees,
            labels: self.labels,
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub owner: String,
    pub repo_name: String,
    pub issue_number: u32,
    pub title: String,
    pub body: Option<String>,
    pub status: IssueStatus,
    pub author: String,
    pub assignees: BTreeSet<String>,
    pub labels: BTreeSet<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Issue {
    pub fn key_of(owner: &str, repo_name: &str, issue_number: u32) -> NaturalKey {
        NaturalKey::new()
            .with("owner", owner)
            .with("repo_name", repo_name)
            .with("issue_number", issue_number)
    }
}

fn validate_fields(
    owner: &str,
    repo_name: &str,
    title: &str,
    body: Option<&str>,
    author: &str,
    assignees: &BTreeSet<String>,
    labels: &BTreeSet<String>,
) -> Result<()> {
    validation::validate_account_name("owner", owner)?;
    validation::validate_repo_name("repo_name", repo_name)?;
    validation::validate_text("title", title, limits::MAX_TITLE_LENGTH)?;
    validation::validate_optional_text("body", body, limits::MAX_BODY_LENGTH)?;
    validation::validate_account_name("author", author)?;
    validation::validate_set("assignees", assignees, validation::validate_account_name)?;
    validation::validate_set("labels", labels, |field, label| {
        validation::validate_text(field, label, limits::MAX_LABEL_LENGTH)
    })
}

impl Entity for Issue {
    const OPTIONAL_ATTRIBUTES: &'static [&'static str] = &[ATTR_BODY, ATTR_ASSIGNEES, ATTR_LABELS];

    fn kind(&self) -> EntityKind {
        EntityKind::Issue
    }

    fn primary_key(&self) -> PrimaryKey {
        keys::issue_key(&self.owner, &self.repo_name, self.issue_number)
    }

    fn natural_key(&self) -> NaturalKey {
        Self::key_of(&self.owner, &self.repo_name, self.issue_number)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_number("issue_number", u64::from(self.issue_number))?;
        validate_fields(
            &self.owner,
            &self.repo_name,
            &self.title,
            self.body.as_deref(),
            &self.author,
            &self.assignees,
            &self.labels,
        )
    }

    fn to_item(&self) -> Item {
        let (gsi4_pk, gsi4_sk) = keys::status_index(
            &self.owner,
            &self.repo_name,
            NumberedKind::Issue,
            self.status.segment(),
            self.issue_number,
        );
        base_item(&self.primary_key(), ENTITY_TYPE, &self.created, &self.modified)
            .string(ATTR_GSI4_PK, gsi4_pk)
            .string(ATTR_GSI4_SK, gsi4_sk)
            .string(ATTR_OWNER, &self.owner)
            .string(ATTR_REPO_NAME, &self.repo_name)
            .number(ATTR_NUMBER, self.issue_number)
            .string(ATTR_TITLE, &self.title)
            .optional_string(ATTR_BODY, self.body.as_deref())
            .string(ATTR_STATUS, self.status.as_str())
            .string(ATTR_AUTHOR, &self.author)
            .string_set(ATTR_ASSIGNEES, &self.assignees)
            .string_set(ATTR_LABELS, &self.labels)
            .build()
    }

    fn from_item(item: &Item) -> crate::storage::Result<Self> {
        let (created, modified) = read_base(item, ENTITY_TYPE)?;
        Ok(Self {
            owner: item::required_string(item, ATTR_OWNER)?,
            repo_name: item::required_string(item, ATTR_REPO_NAME)?,
            issue_number: item::required_number(item, ATTR_NUMBER)?,
            title: item::required_string(item, ATTR_TITLE)?,
            body: item::optional_string(item, ATTR_BODY)?,
            status: item::required_parsed(item, ATTR_STATUS)?,
            author: item::required_string(item, ATTR_AUTHOR)?,
            assignees: item::string_set(item, ATTR_ASSIGNEES)?,
            labels: item::string_set(item, ATTR_LABELS)?,
            created,
            modified,
        })
    }
}
