//! Reaction facade.
//!
//! Targets arrive in their wire form (`target_type`, `target_id`) and are
//! decoded before any store call, so a malformed id never costs a request.

use tracing::info;

use super::common;
use super::StoreContext;
use crate::error::{EntityKind, Result};
use crate::keys;
use crate::model::{timestamp, Entity, NewReaction, Reaction, ReactionTarget};
use crate::pagination::{Page, PageRequest};
use crate::storage::{PrimaryKey, QueryRequest, SortCondition};
use crate::validation::{self, limits};

#[derive(Clone)]
pub struct ReactionRepository {
    ctx: StoreContext,
}

impl ReactionRepository {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    fn reaction_key(
        owner: &str,
        repo_name: &str,
        target_type: &str,
        target_id: &str,
        user: &str,
        emoji: &str,
    ) -> Result<PrimaryKey> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        let target = ReactionTarget::parse(target_type, target_id)?;
        validation::validate_account_name("user", user)?;
        validation::validate_key_segment("emoji", emoji, limits::MAX_EMOJI_LENGTH)?;
        Ok(keys::reaction_key(
            owner,
            repo_name,
            target.target_type(),
            &target.target_id(),
            user,
            emoji,
        ))
    }

    pub async fn get(
        &self,
        owner: &str,
        repo_name: &str,
        target_type: &str,
        target_id: &str,
        user: &str,
        emoji: &str,
    ) -> Result<Option<Reaction>> {
        let key = Self::reaction_key(owner, repo_name, target_type, target_id, user, emoji)?;
        common::fetch(&self.ctx, &key)
            .await
            .inspect_err(|e| common::log_failure("get", EntityKind::Reaction, e))
    }

    /// Record a reaction. The target must exist, and one user may use each
    /// emoji once per target.
    pub async fn create(&self, new: NewReaction) -> Result<Reaction> {
        let result = async {
            let reaction = new.into_reaction(timestamp::now())?;
            reaction.validate()?;
            let mut tx = common::create_transaction(&reaction);
            tx.require_exists(
                reaction.target.parent_key(&reaction.owner, &reaction.repo_name),
                reaction.target.parent_kind(),
                reaction
                    .target
                    .parent_natural_key(&reaction.owner, &reaction.repo_name),
            );
            common::commit_and_fetch(&self.ctx, &reaction, tx).await
        }
        .await
        .inspect_err(|e| common::log_failure("create", EntityKind::Reaction, e))?;

        info!(
            owner = %result.owner,
            repo = %result.repo_name,
            target = %result.target,
            user = %result.user,
            emoji = %result.emoji,
            "Created reaction"
        );
        Ok(result)
    }

    pub async fn delete(
        &self,
        owner: &str,
        repo_name: &str,
        target_type: &str,
        target_id: &str,
        user: &str,
        emoji: &str,
    ) -> Result<()> {
        let key = Self::reaction_key(owner, repo_name, target_type, target_id, user, emoji)?;
        common::delete(&self.ctx, &key)
            .await
            .inspect_err(|e| common::log_failure("delete", EntityKind::Reaction, e))
    }

    /// All reactions on one target, ordered by user then emoji.
    pub async fn list_for_target(
        &self,
        owner: &str,
        repo_name: &str,
        target_type: &str,
        target_id: &str,
        page: &PageRequest,
    ) -> Result<Page<Reaction>> {
        validation::validate_account_name("owner", owner)?;
        validation::validate_repo_name("repo_name", repo_name)?;
        let target = ReactionTarget::parse(target_type, target_id)?;
        let request = QueryRequest::table(keys::repository_partition(owner, repo_name)).with_sort(
            SortCondition::BeginsWith(keys::reaction_prefix(
                target.target_type(),
                &target.target_id(),
            )),
        );
        common::query_page(&self.ctx, request, page)
            .await
            .inspect_err(|e| common::log_failure("list_for_target", EntityKind::Reaction, e))
    }
}
