use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{db::traits::OrderManagement, db::traits::OrderStoreError, order_objects::OrderMetrics};

/// Read-only aggregate statistics over the order store.
pub struct MetricsApi<B> {
    db: Arc<B>,
}

impl<B> Debug for MetricsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MetricsApi")
    }
}

impl<B> MetricsApi<B> {
    pub fn new(db: Arc<B>) -> Self {
        Self { db }
    }
}

impl<B> MetricsApi<B>
where B: OrderManagement
{
    /// Counts the orders in each status and averages the processing time of the completed ones.
    ///
    /// The totals are derived from the same grouped count as `status_counts`, so they always add up. The average is a
    /// separate read and may include an order or two that completed in between.
    pub async fn compute_metrics(&self) -> Result<OrderMetrics, OrderStoreError> {
        let counts = self.db.status_counts().await?;
        let average = self.db.average_processing_seconds().await?;
        let metrics = OrderMetrics::new(counts, average);
        trace!("📊️ Computed order metrics: {metrics:?}");
        Ok(metrics)
    }
}
