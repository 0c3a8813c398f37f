//! Repository facade.

use tracing::info;

use super::common;
use super::StoreContext;
use crate::error::{EntityKind, Result};
use crate::keys;
use crate::model::{timestamp, Account, Entity, NewRepository, Repository};
use crate::pagination::{Page, PageRequest};
use crate::storage::{QueryRequest, SecondaryIndex};
use crate::validation;

#[derive(Clone)]
pub struct RepoRepository {
    ctx: StoreContext,
}

impl RepoRepository {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    pub async fn get(&self, owner: &str, repo_name: &str) -> Result<Option<Repository>> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        common::fetch(&self.ctx, &keys::repository_key(owner, repo_name))
            .await
            .inspect_err(|e| common::log_failure("get", EntityKind::Repository, e))
    }

    /// Create a repository under an existing account.
    ///
    /// Errors: `DuplicateEntity` (Repository) or `EntityNotFound` (Account).
    pub async fn create(&self, new: NewRepository) -> Result<Repository> {
        let repo = new.into_repository(timestamp::now());
        let result = async {
            repo.validate()?;
            let mut tx = common::create_transaction(&repo);
            tx.require_exists(
                keys::account_key(&repo.owner),
                EntityKind::Account,
                Account::key_of(&repo.owner),
            );
            common::commit_and_fetch(&self.ctx, &repo, tx).await
        }
        .await
        .inspect_err(|e| common::log_failure("create", EntityKind::Repository, e))?;

        info!(owner = %result.owner, repo = %result.repo_name, "Created repository");
        Ok(result)
    }

    pub async fn update(&self, repo: &Repository) -> Result<Repository> {
        common::update(&self.ctx, repo)
            .await
            .inspect_err(|e| common::log_failure("update", EntityKind::Repository, e))
    }

    pub async fn delete(&self, owner: &str, repo_name: &str) -> Result<()> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        common::delete(&self.ctx, &keys::repository_key(owner, repo_name))
            .await
            .inspect_err(|e| common::log_failure("delete", EntityKind::Repository, e))
    }

    /// Repositories of an account, most recently created first.
    pub async fn list_by_owner(&self, owner: &str, page: &PageRequest) -> Result<Page<Repository>> {
        validation::validate_account_name("owner", owner)?;
        let request = QueryRequest::index(
            self.ctx.index(SecondaryIndex::AccountRepositories),
            keys::account_partition(owner),
        )
        .descending();
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list_by_owner", EntityKind::Repository, e))
    }
}
