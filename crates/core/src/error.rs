//! Store error taxonomy.
//!
//! Every failure a store operation can surface is one of these variants.
//! Variants raised by the storage layer carry the name of the operation that
//! failed (and, for lookups, the key) so the boundary layer can log them
//! without re-wrapping.

use thiserror::Error;

/// Errors produced by [`CatalogStore`](crate::CatalogStore) and
/// [`ConnectionLifecycle`](crate::ConnectionLifecycle) implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Caller input was rejected before reaching storage.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A single-entity lookup matched zero rows.
    #[error("{entity} {key} not found")]
    NotFound {
        /// Entity kind, e.g. `"product"`.
        entity: &'static str,
        /// The key that was looked up.
        key: String,
    },

    /// The database could not be reached or the connection was lost.
    #[error("{op}: connection error: {message}")]
    Connection { op: &'static str, message: String },

    /// The caller's deadline passed before the operation finished.
    #[error("{op}: deadline exceeded")]
    Timeout { op: &'static str },

    /// The caller cancelled the operation.
    #[error("{op}: cancelled")]
    Cancelled { op: &'static str },

    /// A row did not have the expected shape or column types.
    #[error("{op}: unexpected row shape: {message}")]
    Decode { op: &'static str, message: String },

    /// A write violated a table constraint.
    #[error("{op}: constraint violation: {message}")]
    Constraint { op: &'static str, message: String },

    /// Commit or rollback failed.
    #[error("{op}: transaction failed: {message}")]
    Transaction { op: &'static str, message: String },

    /// Any other database failure.
    #[error("{op}: database error: {message}")]
    Database { op: &'static str, message: String },
}

impl StoreError {
    /// Shorthand for a [`StoreError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether the failure is transient and the caller may retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// The operation the error was raised in, if the storage layer recorded one.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Validation(_) | Self::NotFound { .. } => None,
            Self::Connection { op, .. }
            | Self::Timeout { op }
            | Self::Cancelled { op }
            | Self::Decode { op, .. }
            | Self::Constraint { op, .. }
            | Self::Transaction { op, .. }
            | Self::Database { op, .. } => Some(op),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_operation_and_key() {
        let err = StoreError::not_found("product", 12);
        assert_eq!(err.to_string(), "product 12 not found");

        let err = StoreError::Decode {
            op: "get_product",
            message: "mismatched types".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "get_product: unexpected row shape: mismatched types"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            StoreError::Connection {
                op: "ping",
                message: "refused".to_owned()
            }
            .is_retryable()
        );
        assert!(StoreError::Timeout { op: "list_products" }.is_retryable());
        assert!(!StoreError::Cancelled { op: "list_products" }.is_retryable());
        assert!(!StoreError::Validation("bad".to_owned()).is_retryable());
        assert!(
            !StoreError::Constraint {
                op: "add_brand",
                message: "duplicate".to_owned()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_operation_is_recorded() {
        assert_eq!(
            StoreError::Timeout { op: "list_cart" }.operation(),
            Some("list_cart")
        );
        assert_eq!(StoreError::not_found("brand", "x").operation(), None);
    }
}
