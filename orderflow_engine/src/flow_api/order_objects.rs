use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{OrderStatusType, StatusCounts};

/// Equality filters for order searches. An empty filter matches every order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub status: Option<OrderStatusType>,
    pub user_id: Option<String>,
}

impl OrderQueryFilter {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.user_id.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "All orders");
        }
        let mut parts = vec![];
        if let Some(status) = &self.status {
            parts.push(format!("status: {status}"));
        }
        if let Some(user_id) = &self.user_id {
            parts.push(format!("user_id: {user_id}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// A snapshot of the order table, as reported by the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMetrics {
    pub status_counts: StatusCounts,
    pub total_orders: i64,
    /// The number of orders that have reached `COMPLETED`.
    pub total_orders_processed: i64,
    /// `None` until at least one order has completed.
    pub average_processing_time_seconds: Option<f64>,
}

impl OrderMetrics {
    pub fn new(status_counts: StatusCounts, average_processing_time_seconds: Option<f64>) -> Self {
        Self {
            status_counts,
            total_orders: status_counts.total(),
            total_orders_processed: status_counts.get(OrderStatusType::Completed),
            average_processing_time_seconds,
        }
    }
}
