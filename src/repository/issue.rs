//! Issue facade.

use tracing::info;

use super::common;
use super::StoreContext;
use crate::error::{self, EntityKind, Result};
use crate::keys::{self, NumberedKind};
use crate::model::{timestamp, Issue, IssueStatus, NewIssue, Repository};
use crate::pagination::{Page, PageRequest};
use crate::storage::{QueryRequest, SecondaryIndex, SortCondition};
use crate::validation;

#[derive(Clone)]
pub struct IssueRepository {
    ctx: StoreContext,
}

impl IssueRepository {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    pub async fn get(&self, owner: &str, repo_name: &str, issue_number: u32) -> Result<Option<Issue>> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        validation::validate_number("issue_number", u64::from(issue_number))?;
        common::fetch(&self.ctx, &keys::issue_key(owner, repo_name, issue_number))
            .await
            .inspect_err(|e| common::log_failure("get", EntityKind::Issue, e))
    }

    /// Create an issue numbered from the repository sequence.
    ///
    /// The number is drawn before the write and is not returned to the
    /// sequence if the write fails.
    pub async fn create(&self, new: NewIssue) -> Result<Issue> {
        let result = async {
            new.validate()?;
            let drawn = self
                .ctx
                .sequence()
                .increment_and_get(&new.owner, &new.repo_name)
                .await
                .map_err(error::translate)?;
            let number = validation::validate_number("issue_number", drawn)?;

            let issue = new.into_issue(number, timestamp::now());
            let mut tx = common::create_transaction(&issue);
            tx.require_exists(
                keys::repository_key(&issue.owner, &issue.repo_name),
                EntityKind::Repository,
                Repository::key_of(&issue.owner, &issue.repo_name),
            );
            common::commit_and_fetch(&self.ctx, &issue, tx).await
        }
        .await
        .inspect_err(|e| common::log_failure("create", EntityKind::Issue, e))?;

        info!(
            owner = %result.owner,
            repo = %result.repo_name,
            number = result.issue_number,
            "Created issue"
        );
        Ok(result)
    }

    /// Replace the mutable fields of an existing issue. A status change
    /// moves it between status listings.
    pub async fn update(&self, issue: &Issue) -> Result<Issue> {
        common::update(&self.ctx, issue)
            .await
            .inspect_err(|e| common::log_failure("update", EntityKind::Issue, e))
    }

    pub async fn delete(&self, owner: &str, repo_name: &str, issue_number: u32) -> Result<()> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        validation::validate_number("issue_number", u64::from(issue_number))?;
        common::delete(&self.ctx, &keys::issue_key(owner, repo_name, issue_number))
            .await
            .inspect_err(|e| common::log_failure("delete", EntityKind::Issue, e))
    }

    /// Issues of one status: open newest first, closed oldest first.
    pub async fn list_by_status(
        &self,
        owner: &str,
        repo_name: &str,
        status: IssueStatus,
        page: &PageRequest,
    ) -> Result<Page<Issue>> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        let request = QueryRequest::index(
            self.ctx.index(SecondaryIndex::Status),
            keys::repository_partition(owner, repo_name),
        )
        .with_sort(SortCondition::BeginsWith(
            status.segment().prefix(NumberedKind::Issue),
        ));
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list_by_status", EntityKind::Issue, e))
    }
}
