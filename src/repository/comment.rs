//! Comment facade for issue and pull request comments.

use tracing::info;
use uuid::Uuid;

use super::common;
use super::StoreContext;
use crate::error::Result;
use crate::keys;
use crate::model::{timestamp, Comment, CommentParent, Entity, NewComment};
use crate::pagination::{Page, PageRequest};
use crate::storage::{QueryRequest, SortCondition};
use crate::validation::{self, limits};

#[derive(Clone)]
pub struct CommentRepository {
    ctx: StoreContext,
}

impl CommentRepository {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    fn check_parent(parent: CommentParent, owner: &str, repo_name: &str, number: u32) -> Result<()> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        validation::validate_number(parent.number_field(), u64::from(number))?;
        Ok(())
    }

    pub async fn get(
        &self,
        parent: CommentParent,
        owner: &str,
        repo_name: &str,
        number: u32,
        comment_id: &str,
    ) -> Result<Option<Comment>> {
        Self::check_parent(parent, owner, repo_name, number)?;
        validation::validate_key_segment("comment_id", comment_id, limits::MAX_COMMENT_ID_LENGTH)?;
        let key = keys::comment_key(parent.numbered_kind(), owner, repo_name, number, comment_id);
        common::fetch(&self.ctx, &key)
            .await
            .inspect_err(|e| common::log_failure("get", parent.comment_kind(), e))
    }

    /// Create a comment with a fresh id. The parent issue or pull request
    /// must exist.
    pub async fn create(&self, new: NewComment) -> Result<Comment> {
        let kind = new.parent.comment_kind();
        let comment = new.into_comment(Uuid::new_v4().to_string(), timestamp::now());
        let result = async {
            comment.validate()?;
            let mut tx = common::create_transaction(&comment);
            tx.require_exists(
                comment.parent_key(),
                comment.parent.parent_kind(),
                comment
                    .parent
                    .parent_natural_key(&comment.owner, &comment.repo_name, comment.number),
            );
            common::commit_and_fetch(&self.ctx, &comment, tx).await
        }
        .await
        .inspect_err(|e| common::log_failure("create", kind, e))?;

        info!(
            owner = %result.owner,
            repo = %result.repo_name,
            parent = %result.parent,
            number = result.number,
            comment_id = %result.comment_id,
            "Created comment"
        );
        Ok(result)
    }

    /// Replace the body of an existing comment.
    pub async fn update(&self, comment: &Comment) -> Result<Comment> {
        common::update(&self.ctx, comment)
            .await
            .inspect_err(|e| common::log_failure("update", comment.kind(), e))
    }

    pub async fn delete(
        &self,
        parent: CommentParent,
        owner: &str,
        repo_name: &str,
        number: u32,
        comment_id: &str,
    ) -> Result<()> {
        Self::check_parent(parent, owner, repo_name, number)?;
        validation::validate_key_segment("comment_id", comment_id, limits::MAX_COMMENT_ID_LENGTH)?;
        let key = keys::comment_key(parent.numbered_kind(), owner, repo_name, number, comment_id);
        common::delete(&self.ctx, &key)
            .await
            .inspect_err(|e| common::log_failure("delete", parent.comment_kind(), e))
    }

    /// Comments on one issue or pull request, in comment-id order.
    pub async fn list(
        &self,
        parent: CommentParent,
        owner: &str,
        repo_name: &str,
        number: u32,
        page: &PageRequest,
    ) -> Result<Page<Comment>> {
        Self::check_parent(parent, owner, repo_name, number)?;
        let request = QueryRequest::table(keys::repository_partition(owner, repo_name)).with_sort(
            SortCondition::BeginsWith(parent.numbered_kind().comment_prefix(number)),
        );
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list", parent.comment_kind(), e))
    }
}

