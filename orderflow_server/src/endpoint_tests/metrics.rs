use std::sync::Arc;

use actix_web::http::StatusCode;
use orderflow_engine::{db_types::StatusCounts, OrderQueue, OrderStoreError, QueueConfig};
use serde_json::json;

use super::{
    helpers::{configure, get_request},
    mocks::MockOrderStore,
};

fn counts(pending: i64, processing: i64, completed: i64) -> StatusCounts {
    StatusCounts { pending, processing, completed }
}

#[actix_web::test]
async fn order_metrics() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_status_counts().times(1).returning(|| Ok(counts(1, 1, 2)));
    db.expect_average_processing_seconds().times(1).returning(|| Ok(Some(1.5)));
    // "metrics" must never be looked up as an order id
    db.expect_fetch_order_by_order_id().never();
    let db = Arc::new(db);
    let queue = OrderQueue::new(Arc::clone(&db), QueueConfig::default());
    let res = get_request("/orders/metrics", configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({
            "status_counts": {"PENDING": 1, "PROCESSING": 1, "COMPLETED": 2},
            "total_orders": 4,
            "total_orders_processed": 2,
            "average_processing_time_seconds": 1.5
        })
    );
}

#[actix_web::test]
async fn metrics_for_an_empty_store() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_status_counts().returning(|| Ok(StatusCounts::default()));
    db.expect_average_processing_seconds().returning(|| Ok(None));
    let db = Arc::new(db);
    let queue = OrderQueue::new(Arc::clone(&db), QueueConfig::default());
    let res = get_request("/orders/metrics/", configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status_counts"], json!({"PENDING": 0, "PROCESSING": 0, "COMPLETED": 0}));
    assert_eq!(body["total_orders"], 0);
    assert!(body["average_processing_time_seconds"].is_null());
}

#[actix_web::test]
async fn metrics_store_failure() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_status_counts().returning(|| Err(OrderStoreError::DatabaseError("database is locked".into())));
    db.expect_average_processing_seconds().never();
    let db = Arc::new(db);
    let queue = OrderQueue::new(Arc::clone(&db), QueueConfig::default());
    let res = get_request("/orders/metrics", configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.json()["error"].as_str().unwrap().contains("database is locked"));
}
