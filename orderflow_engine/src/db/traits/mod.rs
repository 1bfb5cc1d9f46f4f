//! # Order store backends
//!
//! This module defines the contract a database backend must honour to act as the order store.
//!
//! * [`OrderManagement`] covers creating orders, reading them back, moving them along the lifecycle and the
//!   aggregate queries the metrics are built from.
//! * [`OrderStoreError`] is the error type every backend reports in, so that callers (the order processor in
//!   particular) can tell a duplicate from a vanished row from a lost race without knowing the backend.
mod errors;
mod order_management;

pub use errors::OrderStoreError;
pub use order_management::OrderManagement;
