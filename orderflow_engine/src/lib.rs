//! Order Flow Engine
//!
//! The order flow engine accepts orders, stores them durably, and moves every stored order through its lifecycle
//! (`PENDING → PROCESSING → COMPLETED`) in the background.
//!
//! The library is divided into these sections:
//! 1. Database management and control ([`mod@db`]). The [`OrderManagement`] trait is the contract for an order store
//!    backend. SQLite is the supported backend ([`SqliteDatabase`]). The data types stored in the database are defined
//!    in [`db_types`] and are public.
//! 2. The order queue ([`order_queue`]). A single shared FIFO queue with one background consumer that hands each order
//!    to the [`OrderProcessor`].
//! 3. The public API ([`mod@flow_api`]): [`OrderFlowApi`] for the synchronous order path and [`MetricsApi`] for
//!    aggregate statistics. Request handlers should use these rather than the database directly.
mod db;

pub mod db_types;
mod flow_api;
pub mod order_queue;

#[cfg(feature = "test_utils")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db::SqliteDatabase, db_url};
pub use db::traits::{OrderManagement, OrderStoreError};
pub use flow_api::{
    errors::OrderFlowError,
    metrics_api::MetricsApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
pub use order_queue::{OrderProcessor, OrderQueue, QueueConfig, QueueError, QueueStats};
