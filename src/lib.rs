//! Forgestore - single-table storage for a code-hosting domain
//!
//! Accounts, repositories, issues, pull requests, comments, reactions,
//! forks and stars persisted in one partitioned key-value table with four
//! secondary indexes. Cross-entity invariants (uniqueness, referential
//! integrity, per-repository numbering) are enforced with conditional and
//! transactional writes against an [`storage::ItemStore`].

pub mod config;
pub mod error;
pub mod keys;
pub mod model;
pub mod pagination;
pub mod repository;
pub mod sequence;
pub mod storage;
pub mod transaction;
pub mod utils;
pub mod validation;

pub use error::{EntityKind, Error, NaturalKey, Result};
pub use pagination::{Page, PageRequest};
pub use repository::{Repositories, StoreContext};
