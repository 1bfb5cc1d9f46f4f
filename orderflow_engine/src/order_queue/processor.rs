use std::{fmt::Debug, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use thiserror::Error;

use crate::{
    db::traits::{OrderManagement, OrderStoreError},
    db_types::{Order, OrderId, OrderStatusType, StatusTransition},
};

/// What happened to an order that was processed without a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// The order was driven to `COMPLETED`.
    Completed(Order),
    /// The order was already `COMPLETED` when it was picked up. Nothing was written.
    AlreadyCompleted(Order),
}

impl ProcessingOutcome {
    pub fn order(&self) -> &Order {
        match self {
            Self::Completed(o) | Self::AlreadyCompleted(o) => o,
        }
    }
}

/// Everything that can go wrong while processing a single order.
///
/// None of these stop the consumer loop. See [`ProcessorFault::action`] for what happens to the order.
#[derive(Debug, Error)]
pub enum ProcessorFault {
    #[error("Order {order_id} hit a uniqueness constraint. {reason}")]
    Duplicate { order_id: OrderId, reason: String },
    #[error("Order {0} no longer exists")]
    Vanished(OrderId),
    #[error("Order {order_id} is {current} and could not be moved to {requested}")]
    Conflict { order_id: OrderId, current: OrderStatusType, requested: OrderStatusType },
    #[error("Store error while processing order {order_id}. {source}")]
    Store { order_id: OrderId, source: OrderStoreError },
    #[error("Processing order {order_id} panicked. {message}")]
    Panicked { order_id: OrderId, message: String },
}

/// How the consumer loop treats a faulted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    /// The work item is meaningless now (the row is gone, or someone else owns it). Drop it, no retry.
    Drop,
    /// The order is left in its last successfully written state for inspection, and the loop moves on.
    Abandon,
}

impl ProcessorFault {
    pub fn from_store_error(order_id: &OrderId, e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::DuplicateOrder(_) => {
                Self::Duplicate { order_id: order_id.clone(), reason: "The order id is already taken".into() }
            },
            OrderStoreError::ConstraintViolation(reason) => Self::Duplicate { order_id: order_id.clone(), reason },
            OrderStoreError::OrderNotFound(_) => Self::Vanished(order_id.clone()),
            OrderStoreError::InvalidTransition { current, requested, .. } => {
                Self::Conflict { order_id: order_id.clone(), current, requested }
            },
            e @ (OrderStoreError::ValidationError(_) | OrderStoreError::DatabaseError(_)) => {
                Self::Store { order_id: order_id.clone(), source: e }
            },
        }
    }

    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Duplicate { order_id, .. } |
            Self::Conflict { order_id, .. } |
            Self::Store { order_id, .. } |
            Self::Panicked { order_id, .. } => order_id,
            Self::Vanished(order_id) => order_id,
        }
    }

    pub fn action(&self) -> FaultAction {
        match self {
            Self::Duplicate { .. } | Self::Vanished(_) | Self::Conflict { .. } => FaultAction::Drop,
            Self::Store { .. } | Self::Panicked { .. } => FaultAction::Abandon,
        }
    }

    pub fn log(&self) {
        match self.action() {
            FaultAction::Drop => warn!("⚙️ {self}. The order has been dropped from the queue."),
            FaultAction::Abandon => error!("⚙️ {self}. The order has been abandoned in its current state."),
        }
    }
}

/// Drives a dequeued order through `PENDING → PROCESSING → COMPLETED`, writing each step back to the store.
pub struct OrderProcessor<B> {
    db: Arc<B>,
    processing_delay: Duration,
}

impl<B> Debug for OrderProcessor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderProcessor (delay: {:?})", self.processing_delay)
    }
}

impl<B> OrderProcessor<B> {
    pub fn new(db: Arc<B>) -> Self {
        Self { db, processing_delay: Duration::ZERO }
    }

    /// Adds a pause between starting and completing each order, to simulate real work.
    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }
}

impl<B> OrderProcessor<B>
where B: OrderManagement
{
    /// Processes a single order.
    ///
    /// The store is re-read first, since the queue only carries the id. An order that is already `PROCESSING` (e.g.
    /// one recovered after a restart) resumes at the completion step.
    pub async fn process(&self, order_id: &OrderId) -> Result<ProcessingOutcome, ProcessorFault> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await
            .map_err(|e| ProcessorFault::from_store_error(order_id, e))?
            .ok_or_else(|| ProcessorFault::Vanished(order_id.clone()))?;
        let started = match order.status {
            OrderStatusType::Pending => self.transition(order_id, StatusTransition::start_processing()).await?,
            OrderStatusType::Processing => {
                debug!("⚙️ Order {order_id} was already processing. Resuming.");
                order
            },
            OrderStatusType::Completed => {
                debug!("⚙️ Order {order_id} is already complete. Nothing to do.");
                return Ok(ProcessingOutcome::AlreadyCompleted(order));
            },
        };
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }
        let started_at = started.processing_started_at.unwrap_or(started.updated_at);
        let at = completion_time(started_at, Utc::now());
        let completed = self.transition(order_id, StatusTransition::Complete { at }).await?;
        trace!("⚙️ Order {order_id} completed in {:?}", completed.processing_duration());
        Ok(ProcessingOutcome::Completed(completed))
    }

    async fn transition(&self, order_id: &OrderId, transition: StatusTransition) -> Result<Order, ProcessorFault> {
        self.db
            .update_order_status(order_id, transition)
            .await
            .map_err(|e| ProcessorFault::from_store_error(order_id, e))
    }
}

/// The completion timestamp for an order that started at `started_at`. It is always strictly later than the start,
/// even if the clock has not visibly moved (or has stepped backwards).
pub fn completion_time(started_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > started_at {
        now
    } else {
        started_at + chrono::Duration::microseconds(1)
    }
}
