// ============================================================================
// spark-entities - Errors
// Error types for the state cell, entity snapshots and data services
// ============================================================================

use thiserror::Error;

use crate::entity::id::Id;

/// Errors raised by the state cell and the stores built on it.
///
/// Structural entity operations never fail; the only failure is touching a
/// cell that was never given a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("state is not initialized; call set_state before updating it")]
    NotInitialized,
}

/// Errors raised when building an `EntityState` from raw parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("id {0} appears more than once in ids")]
    DuplicateId(Id),

    #[error("id {0} is listed in ids but has no entity")]
    MissingEntity(Id),

    #[error("entity {0} is stored but not listed in ids")]
    OrphanEntity(Id),
}

/// Errors a `DataService` reports back to the data store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("entity {0} not found")]
    NotFound(Id),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_id() {
        assert_eq!(
            StateError::DuplicateId(Id::from(3)).to_string(),
            "id 3 appears more than once in ids"
        );
        assert_eq!(
            DataError::NotFound(Id::from("a")).to_string(),
            "entity a not found"
        );
    }

    #[test]
    fn decode_errors_convert() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let data: DataError = err.into();
        assert!(matches!(data, DataError::Decode(_)));
    }
}
