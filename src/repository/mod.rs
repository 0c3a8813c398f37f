//! Repository facades.
//!
//! One facade per entity type, each built from a [`StoreContext`]. A
//! facade turns natural keys into store keys, runs a point operation or a
//! [`WriteTransaction`](crate::transaction::WriteTransaction), and
//! translates failures into the domain error taxonomy.

mod account;
mod comment;
mod common;
mod fork;
mod issue;
mod pull_request;
mod reaction;
mod repo;
mod star;

use std::sync::Arc;

pub use account::AccountRepository;
pub use comment::CommentRepository;
pub use fork::ForkRepository;
pub use issue::IssueRepository;
pub use pull_request::PullRequestRepository;
pub use reaction::ReactionRepository;
pub use repo::RepoRepository;
pub use star::StarRepository;

use crate::config::IndexNames;
use crate::sequence::SequenceGenerator;
use crate::storage::{IndexSpec, ItemStore, SecondaryIndex};

/// Store handle and index names shared by all facades.
#[derive(Clone)]
pub struct StoreContext {
    store: Arc<dyn ItemStore>,
    indexes: IndexNames,
}

impl StoreContext {
    pub fn new(store: Arc<dyn ItemStore>, indexes: IndexNames) -> Self {
        Self { store, indexes }
    }

    /// Context using the default index names.
    pub fn with_default_indexes(store: Arc<dyn ItemStore>) -> Self {
        Self::new(store, IndexNames::default())
    }

    pub fn store(&self) -> &dyn ItemStore {
        self.store.as_ref()
    }

    pub fn index_names(&self) -> &IndexNames {
        &self.indexes
    }

    /// Query target for one secondary index.
    pub fn index(&self, index: SecondaryIndex) -> IndexSpec {
        IndexSpec {
            name: self.indexes.name(index).to_string(),
            partition_attr: index.partition_attr(),
            sort_attr: index.sort_attr(),
        }
    }

    pub fn sequence(&self) -> SequenceGenerator {
        SequenceGenerator::new(self.store.clone())
    }
}

/// All facades over one store.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: AccountRepository,
    pub repos: RepoRepository,
    pub issues: IssueRepository,
    pub pull_requests: PullRequestRepository,
    pub comments: CommentRepository,
    pub reactions: ReactionRepository,
    pub forks: ForkRepository,
    pub stars: StarRepository,
}

impl Repositories {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            accounts: AccountRepository::new(ctx.clone()),
            repos: RepoRepository::new(ctx.clone()),
            issues: IssueRepository::new(ctx.clone()),
            pull_requests: PullRequestRepository::new(ctx.clone()),
            comments: CommentRepository::new(ctx.clone()),
            reactions: ReactionRepository::new(ctx.clone()),
            forks: ForkRepository::new(ctx.clone()),
            stars: StarRepository::new(ctx),
        }
    }
}
