//! Error taxonomy for store access and inventory operations.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `InventoryError` as follows:
//!
//! | SQLx Error | Scenario | InventoryError |
//! |------------|----------|----------------|
//! | Database (unique violation) | Insert of a product name that already exists | `DuplicateName` |
//! | Database (other) | Constraint / IO failure inside SQLite | `Storage` |
//! | PoolTimedOut / PoolClosed | No connection available | `Storage` |
//! | Other | Anything else raised by the driver | `Storage` |

use thiserror::Error;

use stockroom_core::{DomainError, ProductId};

#[derive(Debug, Error)]
pub enum InventoryError {
    /// The referenced product (or its stock row) does not exist.
    #[error("product not found - id: {product_id}")]
    NotFound { product_id: ProductId },

    /// The store rejected a second product with the same name.
    #[error("a product named '{0}' already exists")]
    DuplicateName(String),

    /// Input was rejected before reaching the store.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backing store failed a read or write.
    #[error("storage failure in {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Store configuration could not be turned into connect options.
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl InventoryError {
    pub fn not_found(product_id: ProductId) -> Self {
        Self::NotFound { product_id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

/// Map SQLx errors to `InventoryError`.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> InventoryError {
    InventoryError::Storage {
        operation,
        source: err,
    }
}

/// Check if an error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_carries_the_id() {
        let err = InventoryError::not_found(ProductId::from_raw(42));
        assert_eq!(err.to_string(), "product not found - id: 42");
        assert!(err.is_not_found());
        assert!(!err.is_storage());
    }

    #[test]
    fn domain_errors_convert_transparently() {
        let err: InventoryError = DomainError::validation("bad price").into();
        assert_eq!(err.to_string(), "validation failed: bad price");
    }

    #[test]
    fn storage_error_names_the_operation() {
        let err = map_sqlx_error("insert_product", sqlx::Error::PoolTimedOut);
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("storage failure in insert_product"));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
