//! # The order queue
//!
//! A single FIFO buffer sits between the request handlers, which enqueue freshly stored orders, and one background
//! consumer, which hands each order to the [`OrderProcessor`].
//!
//! The queue is built once at startup and passed around by cloning the [`OrderQueue`] handle. Every clone shares the
//! same buffer, worker and counters. The consumer is controlled with [`OrderQueue::start`], [`OrderQueue::stop`] and
//! [`OrderQueue::shutdown`].
//!
//! Only the order id travels through the queue. The store is always the source of truth, and the processor re-reads
//! the order before touching it.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod processor;
mod queue;

pub use processor::{completion_time, FaultAction, OrderProcessor, ProcessingOutcome, ProcessorFault};
pub use queue::{OrderQueue, QueuePermit};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_HIGH_WATER_MARK: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("The order queue is full ({capacity} orders waiting). Try again later.")]
    Full { capacity: usize },
    #[error("The order queue has been shut down and is not accepting orders.")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// The longest the consumer waits for an item before re-checking for a stop request.
    pub poll_interval: Duration,
    /// In bounded mode, the number of orders that may wait in the queue. `None` means unbounded.
    pub max_depth: Option<usize>,
    /// A warning is logged when the number of waiting orders reaches this value.
    pub high_water_mark: usize,
    /// Simulated work per order.
    pub processing_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_depth: None,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            processing_delay: Duration::ZERO,
        }
    }
}

impl QueueConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_high_water_mark(mut self, high_water_mark: usize) -> Self {
        self.high_water_mark = high_water_mark;
        self
    }

    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }
}

/// Point-in-time view of the queue, for the `/queue` endpoint and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub running: bool,
    pub depth: usize,
    pub processed: u64,
    pub failed: u64,
}
