//! Emoji reactions on issues, pull requests and their comments.
//!
//! A reaction names its target by `(target_type, target_id)`. For comment
//! targets the id is composite, `"<parent number>-<comment id>"`, and is
//! split at the first `-`: the parent number is purely numeric, so the
//! first dash always ends it even when the comment id contains dashes.

use std::fmt;

use chrono::{DateTime, Utc};

use super::{base_item, read_base, CommentParent, Entity};
use crate::error::{EntityKind, Error, NaturalKey, Result};
use crate::keys::{self, MAX_NUMBER};
use crate::model::{Comment, Issue, PullRequest};
use crate::storage::item::{self, Item};
use crate::storage::{PrimaryKey, StoreError};
use crate::validation::{self, limits};

pub const ENTITY_TYPE: &str = "reaction";

const ATTR_OWNER: &str = "owner";
const ATTR_REPO_NAME: &str = "repo_name";
const ATTR_TARGET_TYPE: &str = "target_type";
const ATTR_TARGET_ID: &str = "target_id";
const ATTR_USER: &str = "user";
const ATTR_EMOJI: &str = "emoji";

const FIELD_TARGET_TYPE: &str = "target_type";
const FIELD_TARGET_ID: &str = "target_id";

/// The entity a reaction is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReactionTarget {
    Issue { number: u32 },
    PullRequest { number: u32 },
    IssueComment { number: u32, comment_id: String },
    PullRequestComment { number: u32, comment_id: String },
}

/// Parse a canonical decimal number in `1..=MAX_NUMBER` (no sign, no
/// leading zeros), so each number has exactly one textual form.
fn parse_number(raw: &str) -> Option<u32> {
    if raw.is_empty() || raw.starts_with('0') || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|n| *n <= MAX_NUMBER)
}

impl ReactionTarget {
    pub const ISSUE: &'static str = "ISSUE";
    pub const PR: &'static str = "PR";
    pub const ISSUE_COMMENT: &'static str = "ISSUECOMMENT";
    pub const PR_COMMENT: &'static str = "PRCOMMENT";

    /// Decode a `(target_type, target_id)` pair.
    ///
    /// Fails with a validation error on an unknown type, a non-canonical
    /// number, or a comment id without the `-` separator.
    pub fn parse(target_type: &str, target_id: &str) -> Result<Self> {
        let number = |raw: &str| {
            parse_number(raw).ok_or_else(|| {
                Error::validation(
                    FIELD_TARGET_ID,
                    format!("'{raw}' is not a number between 1 and {MAX_NUMBER}"),
                )
            })
        };

        match target_type {
            Self::ISSUE => Ok(Self::Issue {
                number: number(target_id)?,
            }),
            Self::PR => Ok(Self::PullRequest {
                number: number(target_id)?,
            }),
            Self::ISSUE_COMMENT | Self::PR_COMMENT => {
                let (parent, comment_id) = target_id.split_once('-').ok_or_else(|| {
                    Error::validation(
                        FIELD_TARGET_ID,
                        format!("'{target_id}' must have the form <number>-<comment_id>"),
                    )
                })?;
                let number = number(parent)?;
                validation::validate_key_segment(
                    FIELD_TARGET_ID,
                    comment_id,
                    limits::MAX_COMMENT_ID_LENGTH,
                )?;
                let comment_id = comment_id.to_string();
                Ok(if target_type == Self::ISSUE_COMMENT {
                    Self::IssueComment { number, comment_id }
                } else {
                    Self::PullRequestComment { number, comment_id }
                })
            }
            other => Err(Error::validation(
                FIELD_TARGET_TYPE,
                format!("unknown target type '{other}' (expected ISSUE, PR, ISSUECOMMENT or PRCOMMENT)"),
            )),
        }
    }

    pub fn issue(number: u32) -> Self {
        Self::Issue { number }
    }

    pub fn pull_request(number: u32) -> Self {
        Self::PullRequest { number }
    }

    pub fn comment(parent: CommentParent, number: u32, comment_id: impl Into<String>) -> Self {
        let comment_id = comment_id.into();
        match parent {
            CommentParent::Issue => Self::IssueComment { number, comment_id },
            CommentParent::PullRequest => Self::PullRequestComment { number, comment_id },
        }
    }

    pub fn target_type(&self) -> &'static str {
        match self {
            Self::Issue { .. } => Self::ISSUE,
            Self::PullRequest { .. } => Self::PR,
            Self::IssueComment { .. } => Self::ISSUE_COMMENT,
            Self::PullRequestComment { .. } => Self::PR_COMMENT,
        }
    }

    pub fn target_id(&self) -> String {
        match self {
            Self::Issue { number } | Self::PullRequest { number } => number.to_string(),
            Self::IssueComment { number, comment_id }
            | Self::PullRequestComment { number, comment_id } => format!("{number}-{comment_id}"),
        }
    }

    /// Kind of the entity whose existence the reaction depends on.
    pub fn parent_kind(&self) -> EntityKind {
        match self {
            Self::Issue { .. } => EntityKind::Issue,
            Self::PullRequest { .. } => EntityKind::PullRequest,
            Self::IssueComment { .. } => EntityKind::IssueComment,
            Self::PullRequestComment { .. } => EntityKind::PullRequestComment,
        }
    }

    pub fn parent_key(&self, owner: &str, repo_name: &str) -> PrimaryKey {
        match self {
            Self::Issue { number } => keys::issue_key(owner, repo_name, *number),
            Self::PullRequest { number } => keys::pull_request_key(owner, repo_name, *number),
            Self::IssueComment { number, comment_id } => keys::comment_key(
                keys::NumberedKind::Issue,
                owner,
                repo_name,
                *number,
                comment_id,
            ),
            Self::PullRequestComment { number, comment_id } => keys::comment_key(
                keys::NumberedKind::PullRequest,
                owner,
                repo_name,
                *number,
                comment_id,
            ),
        }
    }

    pub fn parent_natural_key(&self, owner: &str, repo_name: &str) -> NaturalKey {
        match self {
            Self::Issue { number } => Issue::key_of(owner, repo_name, *number),
            Self::PullRequest { number } => PullRequest::key_of(owner, repo_name, *number),
            Self::IssueComment { number, comment_id } => {
                Comment::key_of(CommentParent::Issue, owner, repo_name, *number, comment_id)
            }
            Self::PullRequestComment { number, comment_id } => Comment::key_of(
                CommentParent::PullRequest,
                owner,
                repo_name,
                *number,
                comment_id,
            ),
        }
    }
}

impl fmt::Display for ReactionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target_type(), self.target_id())
    }
}

/// Reaction to create. The target is given in its raw wire form and is
/// decoded before any store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReaction {
    pub owner: String,
    pub repo_name: String,
    pub target_type: String,
    pub target_id: String,
    pub user: String,
    pub emoji: String,
}

impl NewReaction {
    pub fn new(
        owner: impl Into<String>,
        repo_name: impl Into<String>,
        target: &ReactionTarget,
        user: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
            target_type: target.target_type().to_string(),
            target_id: target.target_id(),
            user: user.into(),
            emoji: emoji.into(),
        }
    }

    /// Decode the target and build the entity.
    pub(crate) fn into_reaction(self, now: DateTime<Utc>) -> Result<Reaction> {
        let target = ReactionTarget::parse(&self.target_type, &self.target_id)?;
        Ok(Reaction {
            owner: self.owner,
            repo_name: self.repo_name,
            target,
            user: self.user,
            emoji: self.emoji,
            created: now,
            modified: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub owner: String,
    pub repo_name: String,
    pub target: ReactionTarget,
    pub user: String,
    pub emoji: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Reaction {
    pub fn key_of(
        owner: &str,
        repo_name: &str,
        target: &ReactionTarget,
        user: &str,
        emoji: &str,
    ) -> NaturalKey {
        NaturalKey::new()
            .with("owner", owner)
            .with("repo_name", repo_name)
            .with("target_type", target.target_type())
            .with("target_id", target.target_id())
            .with("user", user)
            .with("emoji", emoji)
    }
}

impl Entity for Reaction {
    fn kind(&self) -> EntityKind {
        EntityKind::Reaction
    }

    fn primary_key(&self) -> PrimaryKey {
        keys::reaction_key(
            &self.owner,
            &self.repo_name,
            self.target.target_type(),
            &self.target.target_id(),
            &self.user,
            &self.emoji,
        )
    }

    fn natural_key(&self) -> NaturalKey {
        Self::key_of(
            &self.owner,
            &self.repo_name,
            &self.target,
            &self.user,
            &self.emoji,
        )
    }

    fn validate(&self) -> Result<()> {
        validation::validate_account_name("owner", &self.owner)?;
        validation::validate_repo_name("repo_name", &self.repo_name)?;
        validation::validate_account_name("user", &self.user)?;
        validation::validate_key_segment("emoji", &self.emoji, limits::MAX_EMOJI_LENGTH)
    }

    fn to_item(&self) -> Item {
        base_item(&self.primary_key(), ENTITY_TYPE, &self.created, &self.modified)
            .string(ATTR_OWNER, &self.owner)
            .string(ATTR_REPO_NAME, &self.repo_name)
            .string(ATTR_TARGET_TYPE, self.target.target_type())
            .string(ATTR_TARGET_ID, self.target.target_id())
            .string(ATTR_USER, &self.user)
            .string(ATTR_EMOJI, &self.emoji)
            .build()
    }

    fn from_item(item: &Item) -> crate::storage::Result<Self> {
        let (created, modified) = read_base(item, ENTITY_TYPE)?;
        let target_type = item::required_string(item, ATTR_TARGET_TYPE)?;
        let target_id = item::required_string(item, ATTR_TARGET_ID)?;
        let target = ReactionTarget::parse(&target_type, &target_id)
            .map_err(|e| StoreError::malformed(ATTR_TARGET_ID, e.to_string()))?;
        Ok(Self {
            owner: item::required_string(item, ATTR_OWNER)?,
            repo_name: item::required_string(item, ATTR_REPO_NAME)?,
            target,
            user: item::required_string(item, ATTR_USER)?,
            emoji: item::required_string(item, ATTR_EMOJI)?,
            created,
            modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: Error) -> String {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_numbered_targets() {
        assert_eq!(
            ReactionTarget::parse("ISSUE", "7").unwrap(),
            ReactionTarget::issue(7)
        );
        assert_eq!(
            ReactionTarget::parse("PR", "999999").unwrap(),
            ReactionTarget::pull_request(999_999)
        );
    }

    #[test]
    fn test_parse_comment_target_splits_at_first_dash() {
        let target = ReactionTarget::parse(
            "ISSUECOMMENT",
            "12-0b7e4c2a-9d1f-4e8a-b6c3-2f5d8e9a1b4c",
        )
        .unwrap();
        assert_eq!(
            target,
            ReactionTarget::IssueComment {
                number: 12,
                comment_id: "0b7e4c2a-9d1f-4e8a-b6c3-2f5d8e9a1b4c".into()
            }
        );
        assert_eq!(target.target_id(), "12-0b7e4c2a-9d1f-4e8a-b6c3-2f5d8e9a1b4c");
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for (target_type, target_id) in [
            ("ISSUECOMMENT", "12"),
            ("ISSUECOMMENT", "abc-c1"),
            ("PRCOMMENT", "-c1"),
            ("PRCOMMENT", "3-"),
            ("PRCOMMENT", "3-a#b"),
            ("ISSUE", "007"),
            ("ISSUE", "0"),
            ("ISSUE", "+7"),
            ("PR", "1000000"),
        ] {
            let err = ReactionTarget::parse(target_type, target_id).unwrap_err();
            assert_eq!(field_of(err), "target_id", "{target_type} {target_id}");
        }
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let err = ReactionTarget::parse("COMMIT", "1").unwrap_err();
        assert_eq!(field_of(err), "target_type");
    }

    #[test]
    fn test_parent_key() {
        let target = ReactionTarget::comment(CommentParent::PullRequest, 5, "c-1");
        assert_eq!(target.parent_key("acme", "widgets").sk, "PR#000005#COMMENT#c-1");
        assert_eq!(target.parent_kind(), EntityKind::PullRequestComment);
    }
}
