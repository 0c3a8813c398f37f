//! Account facade.

use tracing::info;

use super::common;
use super::StoreContext;
use crate::error::{EntityKind, Result};
use crate::keys;
use crate::model::{timestamp, Account, Entity, NewAccount};
use crate::validation;

/// Users and organizations. Names are unique across both kinds.
#[derive(Clone)]
pub struct AccountRepository {
    ctx: StoreContext,
}

impl AccountRepository {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    pub async fn get(&self, name: &str) -> Result<Option<Account>> {
        validation::validate_account_name("name", name)?;
        common::fetch(&self.ctx, &keys::account_key(name))
            .await
            .inspect_err(|e| common::log_failure("get", EntityKind::Account, e))
    }

    /// Create an account. Fails with `DuplicateEntity` if the name is taken
    /// by a user or an organization.
    pub async fn create(&self, new: NewAccount) -> Result<Account> {
        let account = new.into_account(timestamp::now());
        let result = async {
            account.validate()?;
            common::put_unique(&self.ctx, &account).await?;
            common::reread(&self.ctx, &account).await
        }
        .await
        .inspect_err(|e| common::log_failure("create", EntityKind::Account, e))?;

        info!(name = %result.name, kind = %result.kind, "Created account");
        Ok(result)
    }

    /// Replace the profile fields of an existing account. The account kind
    /// never changes; the returned account carries the stored kind.
    pub async fn update(&self, account: &Account) -> Result<Account> {
        common::update(&self.ctx, account)
            .await
            .inspect_err(|e| common::log_failure("update", EntityKind::Account, e))
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        validation::validate_account_name("name", name)?;
        common::delete(&self.ctx, &keys::account_key(name))
            .await
            .inspect_err(|e| common::log_failure("delete", EntityKind::Account, e))
    }
}
