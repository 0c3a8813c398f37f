//! Fork facade.

use tracing::info;

use super::common;
use super::StoreContext;
use crate::error::{EntityKind, Result};
use crate::keys;
use crate::model::{timestamp, Entity, Fork, NewFork, Repository};
use crate::pagination::{Page, PageRequest};
use crate::storage::{QueryRequest, SecondaryIndex, SortCondition};
use crate::validation;

#[derive(Clone)]
pub struct ForkRepository {
    ctx: StoreContext,
}

impl ForkRepository {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    pub async fn get(
        &self,
        original_owner: &str,
        original_repo: &str,
        fork_owner: &str,
    ) -> Result<Option<Fork>> {
        validation::validate_account_name("original_owner", original_owner)?;
        validation::validate_repo_name("original_repo", original_repo)?;
        validation::validate_account_name("fork_owner", fork_owner)?;
        common::fetch(&self.ctx, &keys::fork_key(original_owner, original_repo, fork_owner))
            .await
            .inspect_err(|e| common::log_failure("get", EntityKind::Fork, e))
    }

    /// Record that `fork_owner/fork_repo` was forked from
    /// `original_owner/original_repo`.
    ///
    /// Errors: `DuplicateEntity` (Fork), or `EntityNotFound` naming the
    /// source repository or the fork repository, whichever check failed
    /// first.
    pub async fn create(&self, new: NewFork) -> Result<Fork> {
        let fork = new.into_fork(timestamp::now());
        let result = async {
            fork.validate()?;
            let mut tx = common::create_transaction(&fork);
            tx.require_exists(
                fork.source_key(),
                EntityKind::Repository,
                Repository::key_of(&fork.original_owner, &fork.original_repo),
            )
            .require_exists(
                fork.target_key(),
                EntityKind::Repository,
                Repository::key_of(&fork.fork_owner, &fork.fork_repo),
            );
            common::commit_and_fetch(&self.ctx, &fork, tx).await
        }
        .await
        .inspect_err(|e| common::log_failure("create", EntityKind::Fork, e))?;

        info!(
            source = %format!("{}/{}", result.original_owner, result.original_repo),
            fork = %format!("{}/{}", result.fork_owner, result.fork_repo),
            "Created fork"
        );
        Ok(result)
    }

    pub async fn update(&self, fork: &Fork) -> Result<Fork> {
        common::update(&self.ctx, fork)
            .await
            .inspect_err(|e| common::log_failure("update", EntityKind::Fork, e))
    }

    pub async fn delete(
        &self,
        original_owner: &str,
        original_repo: &str,
        fork_owner: &str,
    ) -> Result<()> {
        validation::validate_account_name("original_owner", original_owner)?;
        validation::validate_repo_name("original_repo", original_repo)?;
        validation::validate_account_name("fork_owner", fork_owner)?;
        common::delete(&self.ctx, &keys::fork_key(original_owner, original_repo, fork_owner))
            .await
            .inspect_err(|e| common::log_failure("delete", EntityKind::Fork, e))
    }

    /// Forks of one repository, by fork owner.
    pub async fn list_forks(
        &self,
        original_owner: &str,
        original_repo: &str,
        page: &PageRequest,
    ) -> Result<Page<Fork>> {
        validation::validate_account_name("original_owner", original_owner)?;
        validation::validate_repo_name("original_repo", original_repo)?;
        let request =
            QueryRequest::table(keys::repository_partition(original_owner, original_repo))
                .with_sort(SortCondition::BeginsWith(keys::FORK_PREFIX.to_string()));
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list_forks", EntityKind::Fork, e))
    }

    /// Forks owned by one account, by source repository.
    pub async fn list_by_fork_owner(&self, fork_owner: &str, page: &PageRequest) -> Result<Page<Fork>> {
        validation::validate_account_name("fork_owner", fork_owner)?;
        let request = QueryRequest::index(
            self.ctx.index(SecondaryIndex::AccountForks),
            keys::account_partition(fork_owner),
        )
        .with_sort(SortCondition::BeginsWith(keys::FORK_PREFIX.to_string()));
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list_by_fork_owner", EntityKind::Fork, e))
    }
}
