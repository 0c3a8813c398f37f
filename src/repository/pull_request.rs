//! Pull request facade.

use tracing::info;

use super::common;
use super::StoreContext;
use crate::error::{self, EntityKind, Result};
use crate::keys::{self, NumberedKind};
use crate::model::{timestamp, NewPullRequest, PullRequest, PullRequestStatus, Repository};
use crate::pagination::{Page, PageRequest};
use crate::storage::{QueryRequest, SecondaryIndex, SortCondition};
use crate::validation;

#[derive(Clone)]
pub struct PullRequestRepository {
    ctx: StoreContext,
}

impl PullRequestRepository {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    pub async fn get(
        &self,
        owner: &str,
        repo_name: &str,
        pr_number: u32,
    ) -> Result<Option<PullRequest>> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        validation::validate_number("pr_number", u64::from(pr_number))?;
        common::fetch(&self.ctx, &keys::pull_request_key(owner, repo_name, pr_number))
            .await
            .inspect_err(|e| common::log_failure("get", EntityKind::PullRequest, e))
    }

    /// Create a pull request. Shares the issue sequence of its repository.
    pub async fn create(&self, new: NewPullRequest) -> Result<PullRequest> {
        let result = async {
            new.validate()?;
            let drawn = self
                .ctx
                .sequence()
                .increment_and_get(&new.owner, &new.repo_name)
                .await
                .map_err(error::translate)?;
            let number = validation::validate_number("pr_number", drawn)?;

            let pr = new.into_pull_request(number, timestamp::now());
            let mut tx = common::create_transaction(&pr);
            tx.require_exists(
                keys::repository_key(&pr.owner, &pr.repo_name),
                EntityKind::Repository,
                Repository::key_of(&pr.owner, &pr.repo_name),
            );
            common::commit_and_fetch(&self.ctx, &pr, tx).await
        }
        .await
        .inspect_err(|e| common::log_failure("create", EntityKind::PullRequest, e))?;

        info!(
            owner = %result.owner,
            repo = %result.repo_name,
            number = result.pr_number,
            "Created pull request"
        );
        Ok(result)
    }

    pub async fn update(&self, pr: &PullRequest) -> Result<PullRequest> {
        common::update(&self.ctx, pr)
            .await
            .inspect_err(|e| common::log_failure("update", EntityKind::PullRequest, e))
    }

    pub async fn delete(&self, owner: &str, repo_name: &str, pr_number: u32) -> Result<()> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        validation::validate_number("pr_number", u64::from(pr_number))?;
        common::delete(&self.ctx, &keys::pull_request_key(owner, repo_name, pr_number))
            .await
            .inspect_err(|e| common::log_failure("delete", EntityKind::PullRequest, e))
    }

    /// Pull requests of one status: open newest first, closed and merged
    /// oldest first.
    pub async fn list_by_status(
        &self,
        owner: &str,
        repo_name: &str,
        status: PullRequestStatus,
        page: &PageRequest,
    ) -> Result<Page<PullRequest>> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        let request = QueryRequest::index(
            self.ctx.index(SecondaryIndex::Status),
            keys::repository_partition(owner, repo_name),
        )
        .with_sort(SortCondition::BeginsWith(
            status.segment().prefix(NumberedKind::PullRequest),
        ));
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list_by_status", EntityKind::PullRequest, e))
    }
}
