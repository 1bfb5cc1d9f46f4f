use async_trait::async_trait;

use super::OrderStoreError;
use crate::{
    db_types::{NewOrder, Order, OrderId, StatusCounts, StatusTransition},
    flow_api::order_objects::OrderQueryFilter,
};

/// The `OrderManagement` trait defines the behaviour of the durable order store.
///
/// Implementations are shared between the request handlers and the background order processor, so they must be
/// `Send + Sync` and every method may be called concurrently.
#[async_trait]
pub trait OrderManagement: Send + Sync {
    /// Stores a brand-new order with status `PENDING`.
    ///
    /// The order is validated first. The backend's unique constraint on `order_id` decides duplicates, so two
    /// concurrent inserts of the same id result in exactly one row and one [`OrderStoreError::DuplicateOrder`].
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches the orders matching the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;

    /// Applies a single forward status transition atomically.
    ///
    /// The update only takes effect if the order is still in [`StatusTransition::from_status`]. Otherwise
    /// [`OrderStoreError::InvalidTransition`] (or [`OrderStoreError::OrderNotFound`]) is returned and nothing is
    /// written.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        transition: StatusTransition,
    ) -> Result<Order, OrderStoreError>;

    /// The number of orders in each status, taken from a single consistent read.
    async fn status_counts(&self) -> Result<StatusCounts, OrderStoreError>;

    /// The mean time, in seconds, between processing start and completion over all completed orders.
    async fn average_processing_seconds(&self) -> Result<Option<f64>, OrderStoreError>;
}
