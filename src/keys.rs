//! Key codec.
//!
//! Pure functions from natural attributes to primary and secondary-index
//! keys. The formats are stable; existing stored data depends on them.
//!
//! ```text
//! Account       ACCOUNT#{name}                 / ACCOUNT#{name}
//! Repository    REPO#{owner}#{repo}            / REPO#{owner}#{repo}
//! Counter       COUNTER#{owner}#{repo}         / METADATA
//! Issue         REPO#{owner}#{repo}            / ISSUE#{n:06}
//! PullRequest   REPO#{owner}#{repo}            / PR#{n:06}
//! IssueComment  REPO#{owner}#{repo}            / ISSUE#{n:06}#COMMENT#{id}
//! PRComment     REPO#{owner}#{repo}            / PR#{n:06}#COMMENT#{id}
//! Reaction      REPO#{owner}#{repo}            / REACTION#{type}#{target}#{user}#{emoji}
//! Fork          REPO#{owner}#{repo}            / FORK#{fork_owner}
//! Star          ACCOUNT#{user}                 / STAR#{owner}#{repo}
//! ```
//!
//! Identifier segments never contain `#` (enforced by
//! [`crate::validation`]), which keeps the mapping injective.

use crate::storage::PrimaryKey;

/// Largest issue or pull request number the fixed key width can hold.
pub const MAX_NUMBER: u32 = 999_999;

pub const ACCOUNT_PREFIX: &str = "ACCOUNT#";
pub const REPO_PREFIX: &str = "REPO#";
pub const COUNTER_PREFIX: &str = "COUNTER#";
pub const COUNTER_SORT_KEY: &str = "METADATA";
pub const ISSUE_PREFIX: &str = "ISSUE#";
pub const PR_PREFIX: &str = "PR#";
pub const COMMENT_SEGMENT: &str = "#COMMENT#";
pub const REACTION_PREFIX: &str = "REACTION#";
pub const FORK_PREFIX: &str = "FORK#";
pub const STAR_PREFIX: &str = "STAR#";

/// Zero-pad a number to the fixed key width.
pub fn pad_number(n: u32) -> String {
    format!("{n:06}")
}

/// `MAX_NUMBER - n`, so that higher numbers sort first.
pub fn inverted(n: u32) -> u32 {
    MAX_NUMBER.saturating_sub(n)
}

pub fn account_partition(name: &str) -> String {
    format!("{ACCOUNT_PREFIX}{name}")
}

pub fn repository_partition(owner: &str, repo_name: &str) -> String {
    format!("{REPO_PREFIX}{owner}#{repo_name}")
}

pub fn account_key(name: &str) -> PrimaryKey {
    let pk = account_partition(name);
    PrimaryKey::new(pk.clone(), pk)
}

pub fn repository_key(owner: &str, repo_name: &str) -> PrimaryKey {
    let pk = repository_partition(owner, repo_name);
    PrimaryKey::new(pk.clone(), pk)
}

pub fn counter_key(owner: &str, repo_name: &str) -> PrimaryKey {
    PrimaryKey::new(
        format!("{COUNTER_PREFIX}{owner}#{repo_name}"),
        COUNTER_SORT_KEY,
    )
}

/// Entity kinds numbered from the per-repository sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberedKind {
    Issue,
    PullRequest,
}

impl NumberedKind {
    /// Sort-key label: `ISSUE` or `PR`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Issue => "ISSUE",
            Self::PullRequest => "PR",
        }
    }

    /// Sort key of the numbered entity itself.
    pub fn sort_key(self, number: u32) -> String {
        format!("{}#{}", self.label(), pad_number(number))
    }

    /// Sort-key prefix shared by all comments on one entity.
    pub fn comment_prefix(self, number: u32) -> String {
        format!("{}{COMMENT_SEGMENT}", self.sort_key(number))
    }
}

pub fn issue_key(owner: &str, repo_name: &str, number: u32) -> PrimaryKey {
    PrimaryKey::new(
        repository_partition(owner, repo_name),
        NumberedKind::Issue.sort_key(number),
    )
}

pub fn pull_request_key(owner: &str, repo_name: &str, number: u32) -> PrimaryKey {
    PrimaryKey::new(
        repository_partition(owner, repo_name),
        NumberedKind::PullRequest.sort_key(number),
    )
}

pub fn comment_key(
    parent: NumberedKind,
    owner: &str,
    repo_name: &str,
    number: u32,
    comment_id: &str,
) -> PrimaryKey {
    PrimaryKey::new(
        repository_partition(owner, repo_name),
        format!("{}{comment_id}", parent.comment_prefix(number)),
    )
}

/// Sort-key prefix of every reaction on one target.
pub fn reaction_prefix(target_type: &str, target_id: &str) -> String {
    format!("{REACTION_PREFIX}{target_type}#{target_id}#")
}

pub fn reaction_key(
    owner: &str,
    repo_name: &str,
    target_type: &str,
    target_id: &str,
    user: &str,
    emoji: &str,
) -> PrimaryKey {
    PrimaryKey::new(
        repository_partition(owner, repo_name),
        format!("{}{user}#{emoji}", reaction_prefix(target_type, target_id)),
    )
}

pub fn fork_key(original_owner: &str, original_repo: &str, fork_owner: &str) -> PrimaryKey {
    PrimaryKey::new(
        repository_partition(original_owner, original_repo),
        format!("{FORK_PREFIX}{fork_owner}"),
    )
}

pub fn star_key(username: &str, repo_owner: &str, repo_name: &str) -> PrimaryKey {
    PrimaryKey::new(
        account_partition(username),
        format!("{STAR_PREFIX}{repo_owner}#{repo_name}"),
    )
}

/// Account-repositories index: the owner's partition, sorted by creation time.
pub fn account_repositories_index(owner: &str, created: &str) -> (String, String) {
    (account_partition(owner), created.to_string())
}

/// Stargazers index: the starred repository's partition, one entry per user.
pub fn stargazers_index(username: &str, repo_owner: &str, repo_name: &str) -> (String, String) {
    (
        repository_partition(repo_owner, repo_name),
        format!("{STAR_PREFIX}{username}"),
    )
}

/// Account-forks index: the fork owner's partition, one entry per source.
pub fn account_forks_index(
    fork_owner: &str,
    original_owner: &str,
    original_repo: &str,
) -> (String, String) {
    (
        account_partition(fork_owner),
        format!("{FORK_PREFIX}{original_owner}#{original_repo}"),
    )
}

/// Status segment of a status-index sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusSegment {
    Open,
    Closed,
    Merged,
}

impl StatusSegment {
    fn label(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Merged => "MERGED",
        }
    }

    /// Sort-key prefix selecting one status block.
    ///
    /// Open keys start with the kind label; closed and merged keys carry a
    /// leading `#`.
    pub fn prefix(self, kind: NumberedKind) -> String {
        match self {
            Self::Open => format!("{}#{}#", kind.label(), self.label()),
            Self::Closed | Self::Merged => format!("#{}#{}#", kind.label(), self.label()),
        }
    }

    /// Open entries are inverted (newest first); the others ascend.
    pub fn sort_key(self, kind: NumberedKind, number: u32) -> String {
        let n = match self {
            Self::Open => inverted(number),
            Self::Closed | Self::Merged => number,
        };
        format!("{}{}", self.prefix(kind), pad_number(n))
    }
}

/// Status index: the repository's partition, ordered within each status.
pub fn status_index(
    owner: &str,
    repo_name: &str,
    kind: NumberedKind,
    status: StatusSegment,
    number: u32,
) -> (String, String) {
    (
        repository_partition(owner, repo_name),
        status.sort_key(kind, number),
    )
}
