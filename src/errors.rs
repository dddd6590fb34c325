use sea_orm::error::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the storefront core services.
///
/// Parsing, filtering and aggregation never error: malformed input degrades
/// to an absence (`None`), per the tolerant-extraction design. The variants
/// here cover the stateful side: the reservation ledger and its storage.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The only user-facing rejection the ledger emits: the requested
    /// quantity exceeds what the chosen warehouse holds. The order-management
    /// collaborator decides whether to retry elsewhere, back-order, or fail
    /// the order.
    #[error(
        "Insufficient stock for item {item_id} at warehouse {warehouse_id}: \
         requested {requested}, available {available}"
    )]
    InsufficientStock {
        item_id: Uuid,
        warehouse_id: Uuid,
        requested: i64,
        available: i64,
    },

    /// A clamped read-modify-write lost its optimistic guard to a concurrent
    /// writer. Callers may retry.
    #[error("Concurrent modification of stock for item {0}")]
    ConcurrentModification(Uuid),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// True when the error is the recoverable insufficient-stock rejection.
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, ServiceError::InsufficientStock { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_carries_quantities() {
        let err = ServiceError::InsufficientStock {
            item_id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            requested: 2,
            available: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("requested 2"));
        assert!(msg.contains("available 1"));
        assert!(err.is_insufficient_stock());
    }

    #[test]
    fn db_err_converts() {
        let err: ServiceError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
