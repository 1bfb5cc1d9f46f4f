use thiserror::Error;

use crate::db_types::{OrderId, OrderStatusType, ValidationErrors};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Invalid order data. {0}")]
    ValidationError(ValidationErrors),
    #[error("Order {0} already exists")]
    DuplicateOrder(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} is {current} and cannot move to {requested}")]
    InvalidTransition { order_id: OrderId, current: OrderStatusType, requested: OrderStatusType },
    #[error("A uniqueness constraint was violated. {0}")]
    ConstraintViolation(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => Self::ConstraintViolation(db_err.message().to_string()),
            _ => Self::DatabaseError(e.to_string()),
        }
    }
}
