//! Storage configuration types.

use serde::Deserialize;

use crate::storage::schema::{SecondaryIndex, DEFAULT_TABLE_NAME};

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Memory,
    Dynamo,
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// DynamoDB-specific configuration.
    pub dynamo: DynamoConfig,
    /// Names of the secondary indexes.
    pub indexes: IndexNames,
}

/// DynamoDB-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DynamoConfig {
    /// Table holding every entity.
    pub table_name: String,
    /// Endpoint override, e.g. `http://localhost:8000` for DynamoDB Local.
    pub endpoint: Option<String>,
    /// Region override. Falls back to the AWS default provider chain.
    pub region: Option<String>,
    /// Per-operation timeout in milliseconds. Unset keeps the SDK default.
    pub timeout_ms: Option<u64>,
    /// Create the table on startup when it does not exist.
    pub create_table: bool,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            endpoint: None,
            region: None,
            timeout_ms: None,
            create_table: false,
        }
    }
}

/// Secondary index names as provisioned in the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexNames {
    /// Repositories of an account, by creation time.
    pub account_repositories: String,
    /// Stargazers of a repository.
    pub stargazers: String,
    /// Forks owned by an account.
    pub account_forks: String,
    /// Issues and pull requests by status.
    pub status: String,
}

impl IndexNames {
    pub fn name(&self, index: SecondaryIndex) -> &str {
        match index {
            SecondaryIndex::AccountRepositories => &self.account_repositories,
            SecondaryIndex::Stargazers => &self.stargazers,
            SecondaryIndex::AccountForks => &self.account_forks,
            SecondaryIndex::Status => &self.status,
        }
    }
}

impl Default for IndexNames {
    fn default() -> Self {
        Self {
            account_repositories: SecondaryIndex::AccountRepositories.default_name().to_string(),
            stargazers: SecondaryIndex::Stargazers.default_name().to_string(),
            account_forks: SecondaryIndex::AccountForks.default_name().to_string(),
            status: SecondaryIndex::Status.default_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let storage = StorageConfig::default();
        assert_eq!(storage.storage_type, StorageType::Memory);
        assert_eq!(storage.dynamo.table_name, "forgestore");
        assert!(storage.dynamo.endpoint.is_none());
        assert!(!storage.dynamo.create_table);
    }

    #[test]
    fn test_index_names_default() {
        let indexes = IndexNames::default();
        assert_eq!(indexes.name(SecondaryIndex::AccountRepositories), "GSI1");
        assert_eq!(indexes.name(SecondaryIndex::Stargazers), "GSI2");
        assert_eq!(indexes.name(SecondaryIndex::AccountForks), "GSI3");
        assert_eq!(indexes.name(SecondaryIndex::Status), "GSI4");
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
type: dynamo
dynamo:
  table_name: forge-test
  endpoint: http://localhost:8000
  timeout_ms: 2500
indexes:
  status: by-status
"#;
        let storage: StorageConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(storage.storage_type, StorageType::Dynamo);
        assert_eq!(storage.dynamo.table_name, "forge-test");
        assert_eq!(storage.dynamo.endpoint.as_deref(), Some("http://localhost:8000"));
        assert_eq!(storage.dynamo.timeout_ms, Some(2500));
        assert_eq!(storage.indexes.status, "by-status");
        assert_eq!(storage.indexes.stargazers, "GSI2");
    }
}
