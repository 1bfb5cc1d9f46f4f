use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mockall::mock;
use orderflow_common::Amount;
use orderflow_engine::{
    db_types::{ItemId, NewOrder, Order, OrderId, OrderStatusType, StatusCounts, StatusTransition},
    order_objects::OrderQueryFilter,
    OrderManagement,
    OrderStoreError,
};

mock! {
    pub OrderStore {}
    #[async_trait]
    impl OrderManagement for OrderStore {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
        async fn update_order_status(&self, order_id: &OrderId, transition: StatusTransition) -> Result<Order, OrderStoreError>;
        async fn status_counts(&self) -> Result<StatusCounts, OrderStoreError>;
        async fn average_processing_seconds(&self) -> Result<Option<f64>, OrderStoreError>;
    }
}

/// What the store hands back for a freshly inserted order.
pub fn stored(order: NewOrder) -> Order {
    Order {
        order_id: order.order_id,
        user_id: order.user_id,
        item_ids: order.item_ids,
        total_amount: order.total_amount,
        status: OrderStatusType::Pending,
        created_at: order.created_at,
        updated_at: order.created_at,
        processing_started_at: None,
        processing_completed_at: None,
    }
}

pub fn sample_order(order_id: &str, user_id: &str, status: OrderStatusType) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let started = (status != OrderStatusType::Pending).then(|| created_at + chrono::Duration::seconds(1));
    let completed = (status == OrderStatusType::Completed).then(|| created_at + chrono::Duration::seconds(3));
    Order {
        order_id: OrderId::from(order_id),
        user_id: user_id.to_string(),
        item_ids: vec![ItemId::Number(1), ItemId::Number(2)],
        total_amount: Amount::from_cents(5000),
        status,
        created_at,
        updated_at: completed.or(started).unwrap_or(created_at),
        processing_started_at: started,
        processing_completed_at: completed,
    }
}
