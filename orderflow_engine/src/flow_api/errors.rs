use thiserror::Error;

use crate::{db::traits::OrderStoreError, order_queue::QueueError};

/// Errors on the synchronous order path (validation, persistence and admission to the queue).
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error(transparent)]
    Store(#[from] OrderStoreError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}
