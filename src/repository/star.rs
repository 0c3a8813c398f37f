//! Star facade.

use tracing::info;

use super::common;
use super::StoreContext;
use crate::error::{EntityKind, Result};
use crate::keys;
use crate::model::{account, timestamp, Account, Entity, NewStar, Repository, Star};
use crate::pagination::{Page, PageRequest};
use crate::storage::{AttributeValue, QueryRequest, SecondaryIndex, SortCondition};
use crate::validation;

#[derive(Clone)]
pub struct StarRepository {
    ctx: StoreContext,
}

impl StarRepository {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    fn validate_ids(username: &str, repo_owner: &str, repo_name: &str) -> Result<()> {
        validation::validate_account_name("username", username)?;
        validation::validate_account_name("repo_owner", repo_owner)?;
        validation::validate_repo_name("repo_name", repo_name)
    }

    pub async fn get(
        &self,
        username: &str,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Option<Star>> {
        Self::validate_ids(username, repo_owner, repo_name)?;
        common::fetch(&self.ctx, &keys::star_key(username, repo_owner, repo_name))
            .await
            .inspect_err(|e| common::log_failure("get", EntityKind::Star, e))
    }

    pub async fn is_starred(&self, username: &str, repo_owner: &str, repo_name: &str) -> Result<bool> {
        Ok(self.get(username, repo_owner, repo_name).await?.is_some())
    }

    /// Star a repository. Only user accounts may star.
    ///
    /// Errors: `DuplicateEntity` (Star), `EntityNotFound` (User) when the
    /// account is missing or is an organization, `EntityNotFound`
    /// (Repository).
    pub async fn create(&self, new: NewStar) -> Result<Star> {
        let star = new.into_star(timestamp::now());
        let result = async {
            star.validate()?;
            let (kind_attr, user_kind) = account::user_kind_value();
            let mut tx = common::create_transaction(&star);
            tx.require_attribute(
                keys::account_key(&star.username),
                kind_attr,
                AttributeValue::from(user_kind),
                EntityKind::User,
                Account::key_of(&star.username),
            )
            .require_exists(
                keys::repository_key(&star.repo_owner, &star.repo_name),
                EntityKind::Repository,
                Repository::key_of(&star.repo_owner, &star.repo_name),
            );
            common::commit_and_fetch(&self.ctx, &star, tx).await
        }
        .await
        .inspect_err(|e| common::log_failure("create", EntityKind::Star, e))?;

        info!(
            user = %result.username,
            repo = %format!("{}/{}", result.repo_owner, result.repo_name),
            "Created star"
        );
        Ok(result)
    }

    pub async fn delete(&self, username: &str, repo_owner: &str, repo_name: &str) -> Result<()> {
        Self::validate_ids(username, repo_owner, repo_name)?;
        common::delete(&self.ctx, &keys::star_key(username, repo_owner, repo_name))
            .await
            .inspect_err(|e| common::log_failure("delete", EntityKind::Star, e))
    }

    /// Repositories a user has starred.
    pub async fn list_by_user(&self, username: &str, page: &PageRequest) -> Result<Page<Star>> {
        validation::validate_account_name("username", username)?;
        let request = QueryRequest::table(keys::account_partition(username))
            .with_sort(SortCondition::BeginsWith(keys::STAR_PREFIX.to_string()));
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list_by_user", EntityKind::Star, e))
    }

    /// Users who starred a repository.
    pub async fn list_stargazers(
        &self,
        repo_owner: &str,
        repo_name: &str,
        page: &PageRequest,
    ) -> Result<Page<Star>> {
        validation::validate_account_name("repo_owner", repo_owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        let request = QueryRequest::index(
            self.ctx.index(SecondaryIndex::Stargazers),
            keys::repository_partition(repo_owner, repo_name),
        )
        .with_sort(SortCondition::BeginsWith(keys::STAR_PREFIX.to_string()));
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list_stargazers", EntityKind::Star, e))
    }
}
