//! Store failure to domain error translation.
//!
//! Attribution is positional: each transaction operation carries the
//! [`FailureCause`] to report if its condition is the one that failed. No
//! follow-up reads are made to disambiguate.

use tracing::{debug, warn};

use super::{EntityKind, Error, NaturalKey};
use crate::storage::{CancellationReason, StoreError};

/// Field name reported for store-side validation failures.
const STORE_VALIDATION_FIELD: &str = "item";

/// What a failed condition at one transaction position means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The entity's own uniqueness check.
    Duplicate { entity: EntityKind, key: NaturalKey },
    /// A referenced parent's existence check.
    MissingParent { entity: EntityKind, key: NaturalKey },
}

impl FailureCause {
    fn into_error(self) -> Error {
        match self {
            Self::Duplicate { entity, key } => Error::duplicate(entity, key),
            Self::MissingParent { entity, key } => Error::not_found(entity, key),
        }
    }
}

/// Translate a failed transactional write.
///
/// `causes` is aligned with the submitted operations by position. The
/// lowest-indexed conditional-check failure wins; a store validation
/// reason becomes [`Error::Validation`]; everything else passes through.
pub fn translate_transaction(err: StoreError, causes: &[FailureCause]) -> Error {
    let reasons = match &err {
        StoreError::TransactionCanceled { reasons } => reasons,
        _ => return translate(err),
    };

    if let Some((index, cause)) = reasons
        .iter()
        .zip(causes)
        .enumerate()
        .find(|(_, (reason, _))| **reason == CancellationReason::ConditionalCheckFailed)
        .map(|(index, (_, cause))| (index, cause))
    {
        debug!(position = index, cause = ?cause, "Attributed transaction failure");
        return cause.clone().into_error();
    }

    if let Some(message) = reasons.iter().find_map(|reason| match reason {
        CancellationReason::ValidationError(message) => Some(message.clone()),
        _ => None,
    }) {
        return Error::validation(STORE_VALIDATION_FIELD, message);
    }

    warn!(error = %err, "Unattributed transaction cancellation");
    Error::Store(err)
}

/// Translate a failed conditional update: the only condition is existence.
pub fn translate_update(err: StoreError, entity: EntityKind, key: NaturalKey) -> Error {
    match err {
        StoreError::ConditionalCheckFailed => Error::not_found(entity, key),
        other => translate(other),
    }
}

/// Translate a store failure that carries no positional context.
pub fn translate(err: StoreError) -> Error {
    match err {
        StoreError::Validation(message) => Error::validation(STORE_VALIDATION_FIELD, message),
        other => Error::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_key() -> NaturalKey {
        NaturalKey::new().with("owner", "acme").with("repo_name", "widgets")
    }

    fn fork_causes() -> Vec<FailureCause> {
        vec![
            FailureCause::Duplicate {
                entity: EntityKind::Fork,
                key: NaturalKey::new().with("fork_owner", "bob"),
            },
            FailureCause::MissingParent {
                entity: EntityKind::Repository,
                key: repo_key(),
            },
            FailureCause::MissingParent {
                entity: EntityKind::Repository,
                key: NaturalKey::new().with("owner", "bob").with("repo_name", "widgets"),
            },
        ]
    }

    fn canceled(reasons: Vec<CancellationReason>) -> StoreError {
        StoreError::TransactionCanceled { reasons }
    }

    #[test]
    fn test_position_zero_is_duplicate() {
        let err = translate_transaction(
            canceled(vec![
                CancellationReason::ConditionalCheckFailed,
                CancellationReason::None,
                CancellationReason::None,
            ]),
            &fork_causes(),
        );
        assert!(matches!(err, Error::DuplicateEntity { entity: EntityKind::Fork, .. }));
    }

    #[test]
    fn test_later_positions_are_missing_parents() {
        let err = translate_transaction(
            canceled(vec![
                CancellationReason::None,
                CancellationReason::None,
                CancellationReason::ConditionalCheckFailed,
            ]),
            &fork_causes(),
        );
        match err {
            Error::EntityNotFound { entity, key } => {
                assert_eq!(entity, EntityKind::Repository);
                assert_eq!(key.get("owner"), Some("bob"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_lowest_failed_position_wins() {
        let err = translate_transaction(
            canceled(vec![
                CancellationReason::None,
                CancellationReason::ConditionalCheckFailed,
                CancellationReason::ConditionalCheckFailed,
            ]),
            &fork_causes(),
        );
        match err {
            Error::EntityNotFound { key, .. } => assert_eq!(key, repo_key()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validation_reason_maps_to_validation() {
        let err = translate_transaction(
            canceled(vec![
                CancellationReason::ValidationError("item too large".into()),
                CancellationReason::None,
            ]),
            &fork_causes(),
        );
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "item"));
    }

    #[test]
    fn test_conflict_passes_through() {
        let err = translate_transaction(
            canceled(vec![
                CancellationReason::Other {
                    code: "TransactionConflict".into(),
                    message: "busy".into(),
                },
                CancellationReason::None,
            ]),
            &fork_causes(),
        );
        assert!(matches!(
            err,
            Error::Store(StoreError::TransactionCanceled { .. })
        ));
    }

    #[test]
    fn test_update_condition_failure_is_not_found() {
        let err = translate_update(
            StoreError::ConditionalCheckFailed,
            EntityKind::Repository,
            repo_key(),
        );
        assert!(matches!(err, Error::EntityNotFound { entity: EntityKind::Repository, .. }));
    }

    #[test]
    fn test_backend_errors_pass_through() {
        let err = translate(StoreError::backend("timeout"));
        assert!(matches!(err, Error::Store(StoreError::Backend(_))));
    }
}
