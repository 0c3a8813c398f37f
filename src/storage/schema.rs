//! Table schema: attribute names and secondary index layout.
//!
//! ```text
//! Primary key:
//!   - PK (String, partition)
//!   - SK (String, sort)
//!
//! Secondary indexes (projection ALL, sparse):
//!   - GSI1  GSI1PK / GSI1SK   repositories of an account, by creation time
//!   - GSI2  GSI2PK / GSI2SK   stargazers of a repository
//!   - GSI3  GSI3PK / GSI3SK   forks owned by an account
//!   - GSI4  GSI4PK / GSI4SK   issues and pull requests, by status
//! ```

pub const ATTR_PK: &str = "PK";
pub const ATTR_SK: &str = "SK";

pub const ATTR_GSI1_PK: &str = "GSI1PK";
pub const ATTR_GSI1_SK: &str = "GSI1SK";
pub const ATTR_GSI2_PK: &str = "GSI2PK";
pub const ATTR_GSI2_SK: &str = "GSI2SK";
pub const ATTR_GSI3_PK: &str = "GSI3PK";
pub const ATTR_GSI3_SK: &str = "GSI3SK";
pub const ATTR_GSI4_PK: &str = "GSI4PK";
pub const ATTR_GSI4_SK: &str = "GSI4SK";

/// Discriminator written on every item.
pub const ATTR_ENTITY_TYPE: &str = "entity_type";
pub const ATTR_CREATED: &str = "created";
pub const ATTR_MODIFIED: &str = "modified";

/// Default table name.
pub const DEFAULT_TABLE_NAME: &str = "forgestore";

/// The secondary indexes of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryIndex {
    AccountRepositories,
    Stargazers,
    AccountForks,
    Status,
}

impl SecondaryIndex {
    pub const ALL: [SecondaryIndex; 4] = [
        SecondaryIndex::AccountRepositories,
        SecondaryIndex::Stargazers,
        SecondaryIndex::AccountForks,
        SecondaryIndex::Status,
    ];

    pub fn partition_attr(self) -> &'static str {
        match self {
            Self::AccountRepositories => ATTR_GSI1_PK,
            Self::Stargazers => ATTR_GSI2_PK,
            Self::AccountForks => ATTR_GSI3_PK,
            Self::Status => ATTR_GSI4_PK,
        }
    }

    pub fn sort_attr(self) -> &'static str {
        match self {
            Self::AccountRepositories => ATTR_GSI1_SK,
            Self::Stargazers => ATTR_GSI2_SK,
            Self::AccountForks => ATTR_GSI3_SK,
            Self::Status => ATTR_GSI4_SK,
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            Self::AccountRepositories => "GSI1",
            Self::Stargazers => "GSI2",
            Self::AccountForks => "GSI3",
            Self::Status => "GSI4",
        }
    }
}
