//! # Order flow public API
//!
//! The `flow_api` module exposes the programmatic API that the HTTP layer (and the tools) are built on.
//!
//! * [`order_flow_api`] is the synchronous order path: validate, store, enqueue. It also provides the read-side
//!   lookups and the startup recovery pass.
//! * [`metrics_api`] computes aggregate statistics over the order store.
//!
//! # API usage
//!
//! An API instance wraps a shared database backend that implements [`crate::OrderManagement`]:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use orderflow_engine::{MetricsApi, SqliteDatabase};
//! let db = Arc::new(SqliteDatabase::new_with_url("sqlite://data/orders.db", 5).await?);
//! let api = MetricsApi::new(db);
//! let metrics = api.compute_metrics().await?;
//! ```

pub mod errors;
pub mod metrics_api;
pub mod order_flow_api;
pub mod order_objects;
