//! Pull requests, numbered from the same sequence as issues.

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

pub const ENTITY_TYPE: &str = "pull_request";

const ATTR_OWNER: &str = "owner";
const ATTR_REPO_NAME: &str = "repo_name";
const ATTR_NUMBER: &str = "pr_number";
const ATTR_TITLE: &str = "title";
const ATTR_BODY: &str = "body";
const ATTR_STATUS: &str = "status";
const ATTR_AUTHOR: &str = "author";
const ATTR_SOURCE_BRANCH: &str = "source_branch";
const ATTR_TARGET_BRANCH: &str = "target_branch";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PullRequestStatus {
    #[default]
    Open,
    Closed,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Merged => "merged",
        }
    }

    pub(crate) fn segment(self) -> StatusSegment {
        match self {
            Self::Open => StatusSegment::Open,
            Self::Closed => StatusSegment::Closed,
            Self::Merged => StatusSegment::Merged,
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PullRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "merged" => Ok(Self::Merged),
            other => Err(format!("unknown pull request status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub owner: String,
    pub repo_name: String,
    pub title: String,
    pub body: Option<String>,
    pub status: PullRequestStatus,
    pub author: String,
    pub source_branch: String,
    pub target_branch: String,
}

impl NewPullRequest {
    pub fn new(
        owner: impl Into<String>,
        repo_name: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        source_branch: impl Into<String>,
        target_branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
            title: title.into(),
            body: None,
            status: PullRequestStatus::Open,
            author: author.into(),
            source_branch: source_branch.into(),
            target_branch: target_branch.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.owner,
            &self.repo_name,
            &self.title,
            self.body.as_deref(),
            &self.author,
            &self.source_branch,
            &self.target_branch,
        )
    }

    pub(crate) fn into_pull_request(self, pr_number: u32, now: DateTime<Utc>) -> PullRequest {
        PullRequest {
            owner: self.owner,
            repo_name: self.repo_name,
            pr_number,
            title: self.title,
            body: self.body,
            status: self.status,
            author: self.author,
            source_branch: self.source_branch,
            target_branch: self.target_branch,
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub owner: String,
    pub repo_name: String,
    pub pr_number: u32,
    pub title: String,
    pub body: Option<String>,
    pub status: PullRequestStatus,
    pub author: String,
    pub source_branch: String,
    pub target_branch: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl PullRequest {
    pub fn key_of(owner: &str, repo_name: &str, pr_number: u32) -> NaturalKey {
        NaturalKey::new()
            .with("owner", owner)
            .with("repo_name", repo_name)
            .with("pr_number", pr_number)
    }
}

fn validate_fields(
    owner: &str,
    repo_name: &str,
    title: &str,
    body: Option<&str>,
    author: &str,
    source_branch: &str,
    target_branch: &str,
) -> Result<()> {
    validation::validate_account_name("owner", owner)?;
    validation::validate_repo_name("repo_name", repo_name)?;
    validation::validate_text("title", title, limits::MAX_TITLE_LENGTH)?;
    validation::validate_optional_text("body", body, limits::MAX_BODY_LENGTH)?;
    validation::validate_account_name("author", author)?;
    validation::validate_text("source_branch", source_branch, limits::MAX_BRANCH_LENGTH)?;
    validation::validate_text("target_branch", target_branch, limits::MAX_BRANCH_LENGTH)
}

impl Entity for PullRequest {
    const OPTIONAL_ATTRIBUTES: &'static [&'static str] = &[ATTR_BODY];

    fn kind(&self) -> EntityKind {
        EntityKind::PullRequest
    }

    fn primary_key(&self) -> PrimaryKey {
        keys::pull_request_key(&self.owner, &self.repo_name, self.pr_number)
    }

    fn natural_key(&self) -> NaturalKey {
        Self::key_of(&self.owner, &self.repo_name, self.pr_number)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_number("pr_number", u64::from(self.pr_number))?;
        validate_fields(
            &self.owner,
            &self.repo_name,
            &self.title,
            self.body.as_deref(),
            &self.author,
            &self.source_branch,
            &self.target_branch,
        )
    }

    fn to_item(&self) -> Item {
        let (gsi4_pk, gsi4_sk) = keys::status_index(
            &self.owner,
            &self.repo_name,
            NumberedKind::PullRequest,
            self.status.segment(),
            self.pr_number,
        );
        base_item(&self.primary_key(), ENTITY_TYPE, &self.created, &self.modified)
            .string(ATTR_GSI4_PK, gsi4_pk)
            .string(ATTR_GSI4_SK, gsi4_sk)
            .string(ATTR_OWNER, &self.owner)
            .string(ATTR_REPO_NAME, &self.repo_name)
            .number(ATTR_NUMBER, self.pr_number)
            .string(ATTR_TITLE, &self.title)
            .optional_string(ATTR_BODY, self.body.as_deref())
            .string(ATTR_STATUS, self.status.as_str())
            .string(ATTR_AUTHOR, &self.author)
            .string(ATTR_SOURCE_BRANCH, &self.source_branch)
            .string(ATTR_TARGET_BRANCH, &self.target_branch)
            .build()
    }

    fn from_item(item: &Item) -> crate::storage::Result<Self> {
        let (created, modified) = read_base(item, ENTITY_TYPE)?;
        Ok(Self {
            owner: item::required_string(item, ATTR_OWNER)?,
            repo_name: item::required_string(item, ATTR_REPO_NAME)?,
            pr_number: item::required_number(item, ATTR_NUMBER)?,
            title: item::required_string(item, ATTR_TITLE)?,
            body: item::optional_string(item, ATTR_BODY)?,
            status: item::required_parsed(item, ATTR_STATUS)?,
            author: item::required_string(item, ATTR_AUTHOR)?,
            source_branch: item::required_string(item, ATTR_SOURCE_BRANCH)?,
            target_branch: item::required_string(item, ATTR_TARGET_BRANCH)?,
            created,
            modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::timestamp;

    #[test]
    fn test_merged_status_key() {
        let mut pr = NewPullRequest::new("acme", "widgets", "Add gears", "bob", "gears", "main")
            .into_pull_request(12, timestamp::now());
        pr.status = PullRequestStatus::Merged;

        let item = pr.to_item();
        assert_eq!(item[ATTR_GSI4_SK].as_s(), Some("#PR#MERGED#000012"));
        assert_eq!(PullRequest::from_item(&item).unwrap(), pr);
    }

    #[test]
    fn test_branches_are_required() {
        let new = NewPullRequest::new("acme", "widgets", "Add gears", "bob", "", "main");
        assert!(new.validate().is_err());
    }
}
