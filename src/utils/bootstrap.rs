//! Process bootstrap: tracing setup and store construction from config.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, StorageConfig, StorageType, LOG_ENV_VAR};
use crate::repository::{Repositories, StoreContext};
use crate::storage::{self, ItemStore, MemoryItemStore};

/// Initialize tracing with the FORGESTORE_LOG environment variable.
///
/// Defaults to "info" level if FORGESTORE_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the configured item store.
pub async fn open_store(config: &StorageConfig) -> storage::Result<Arc<dyn ItemStore>> {
    match config.storage_type {
        StorageType::Memory => {
            info!(storage_type = "memory", "Opening item store");
            Ok(Arc::new(MemoryItemStore::new()))
        }
        StorageType::Dynamo => open_dynamo(config).await,
    }
}

#[cfg(feature = "dynamo")]
async fn open_dynamo(config: &StorageConfig) -> storage::Result<Arc<dyn ItemStore>> {
    use crate::storage::dynamo;

    info!(
        storage_type = "dynamo",
        table = %config.dynamo.table_name,
        "Opening item store"
    );
    let store = storage::DynamoItemStore::connect(&config.dynamo).await?;
    if config.dynamo.create_table {
        dynamo::create_table(&store, |index| config.indexes.name(index).to_string()).await?;
    }
    Ok(Arc::new(store))
}

#[cfg(not(feature = "dynamo"))]
async fn open_dynamo(_config: &StorageConfig) -> storage::Result<Arc<dyn ItemStore>> {
    Err(storage::StoreError::backend(
        "storage type 'dynamo' requires the 'dynamo' feature",
    ))
}

/// Open the configured store and wrap it in the full set of facades.
pub async fn open_repositories(config: &Config) -> storage::Result<Repositories> {
    let store = open_store(&config.storage).await?;
    Ok(Repositories::new(StoreContext::new(
        store,
        config.storage.indexes.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewAccount;

    #[tokio::test]
    async fn test_open_store_memory_by_default() {
        let config = Config::for_test();

        let repos = open_repositories(&config).await.unwrap();
        let account = repos.accounts.create(NewAccount::user("alice")).await.unwrap();

        assert_eq!(account.name, "alice");
    }

    #[cfg(not(feature = "dynamo"))]
    #[tokio::test]
    async fn test_open_store_dynamo_without_feature_fails() {
        let config = StorageConfig {
            storage_type: StorageType::Dynamo,
            ..Default::default()
        };

        let result = open_store(&config).await;

        assert!(matches!(result, Err(storage::StoreError::Backend(_))));
    }
}
