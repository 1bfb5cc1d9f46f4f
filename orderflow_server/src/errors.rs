use actix_web::{
    error::ResponseError,
    http::{
        header::{ContentType, RETRY_AFTER},
        StatusCode,
    },
    HttpResponse,
};
use orderflow_engine::{db_types::ValidationErrors, OrderFlowError, OrderStoreError, QueueError};
use serde_json::json;
use thiserror::Error;

/// Seconds a client is asked to wait before retrying when the order queue is full.
pub const RETRY_AFTER_SECONDS: u64 = 5;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The order is invalid. {0}")]
    ValidationError(ValidationErrors),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request query: {0}")]
    InvalidQuery(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("An order with id {0} already exists.")]
    DuplicateOrder(String),
    #[error("{0}")]
    QueueFull(String),
    #[error("{0}")]
    QueueClosed(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateOrder(_) => StatusCode::CONFLICT,
            Self::QueueFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::QueueClosed(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::ValidationError(fields) => json!({ "error": "The order is invalid.", "fields": fields }),
            _ => json!({ "error": self.to_string() }),
        };
        let mut response = HttpResponse::build(self.status_code());
        response.insert_header(ContentType::json());
        if matches!(self, Self::QueueFull(_)) {
            response.insert_header((RETRY_AFTER, RETRY_AFTER_SECONDS.to_string()));
        }
        response.body(body.to_string())
    }
}

impl From<OrderStoreError> for ServerError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::ValidationError(fields) => Self::ValidationError(fields),
            OrderStoreError::DuplicateOrder(id) => Self::DuplicateOrder(id.as_str().to_string()),
            OrderStoreError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {} does not exist.", id.as_str())),
            e @ OrderStoreError::InvalidTransition { .. } => Self::BackendError(e.to_string()),
            OrderStoreError::ConstraintViolation(s) => Self::BackendError(format!("Constraint violation: {s}")),
            OrderStoreError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<QueueError> for ServerError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Full { .. } => Self::QueueFull(e.to_string()),
            QueueError::Closed => Self::QueueClosed(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Store(e) => e.into(),
            OrderFlowError::Queue(e) => e.into(),
        }
    }
}
