use std::{fmt::Debug, sync::Arc};

use log::*;

use super::{errors::OrderFlowError, order_objects::OrderQueryFilter};
use crate::{
    db::traits::{OrderManagement, OrderStoreError},
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    order_queue::{OrderQueue, QueueError},
};

/// `OrderFlowApi` is the primary API for accepting orders and looking them up.
///
/// New orders are stored and handed to the [`OrderQueue`]. The caller gets the stored `PENDING` order back straight
/// away; processing happens in the background.
pub struct OrderFlowApi<B> {
    db: Arc<B>,
    queue: OrderQueue<B>,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.queue)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: Arc<B>, queue: OrderQueue<B>) -> Self {
        Self { db, queue }
    }

    pub fn queue(&self) -> &OrderQueue<B> {
        &self.queue
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Submit a new order.
    ///
    /// The order is validated, a queue slot is reserved, and only then is the order stored. A full queue therefore
    /// rejects the order without leaving a stray `PENDING` row behind. The stored order is returned.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        order.validate().map_err(OrderStoreError::ValidationError)?;
        let permit = self.queue.reserve()?;
        let order = self.db.insert_order(order).await?;
        debug!("🔄️📦️ Order {} stored for user {}", order.order_id, order.user_id);
        if let Err(e) = permit.send(order.order_id.clone()) {
            // The row is already committed, so report success. A recovery pass at the next start picks it up.
            warn!("🔄️📦️ Order {} was stored but could not be queued. {e}", order.order_id);
        }
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order_by_order_id(order_id).await?;
        order.ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()).into())
    }

    pub async fn list_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        trace!("🔄️📦️ Listing orders. Filter: {query}");
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    /// Puts every unfinished order (`PENDING` or `PROCESSING`) back on the queue, oldest first.
    ///
    /// The queue does not survive a restart, so this is how orders that were in flight when the process stopped get
    /// finished. Returns the number of orders queued.
    pub async fn recover_unfinished_orders(&self) -> Result<usize, OrderFlowError> {
        let mut orders = Vec::new();
        for status in [OrderStatusType::Processing, OrderStatusType::Pending] {
            let query = OrderQueryFilter::default().with_status(status);
            orders.extend(self.db.search_orders(query).await?);
        }
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let mut count = 0;
        for order in orders {
            match self.queue.enqueue(order.order_id.clone()) {
                Ok(()) => count += 1,
                Err(e @ QueueError::Closed) => return Err(e.into()),
                Err(e @ QueueError::Full { .. }) => {
                    warn!("🔄️📦️ Order recovery stopped early after {count} orders. {e}");
                    break;
                },
            }
        }
        info!("🔄️📦️ {count} unfinished orders have been put back on the queue");
        Ok(count)
    }
}
