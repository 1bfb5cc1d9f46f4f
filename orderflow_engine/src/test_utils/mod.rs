//! Helpers for tests that need a real database. Enabled with the `test_utils` feature.
mod prepare_env;

pub use prepare_env::{create_database, new_test_database, prepare_test_env, random_db_path, run_migrations};

use std::time::Duration;

use crate::{
    db_types::{Order, OrderId, OrderStatusType},
    OrderManagement,
};

/// Polls the store until the order reaches `status`, or `timeout` expires. Returns the order as last read.
pub async fn wait_for_status<B: OrderManagement>(
    db: &B,
    order_id: &OrderId,
    status: OrderStatusType,
    timeout: Duration,
) -> Option<Order> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let order = db.fetch_order_by_order_id(order_id).await.expect("Error fetching order");
        let done = order.as_ref().map(|o| o.status == status).unwrap_or(false);
        if done || tokio::time::Instant::now() >= deadline {
            return order;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
