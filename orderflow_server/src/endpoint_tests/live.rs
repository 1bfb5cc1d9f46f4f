//! Runs the real store and a running queue behind the routes.
use std::{sync::Arc, time::Duration};

use actix_web::http::StatusCode;
use chrono::{DateTime, Utc};
use orderflow_engine::{test_utils::new_test_database, OrderQueue, QueueConfig, SqliteDatabase};

use super::helpers::{configure, get_request, post_request, TestResponse};

const A1: &str = r#"{"order_id": "A1", "user_id": "U1", "item_ids": [1, 2], "total_amount": 50.00}"#;

async fn poll_until_completed(
    db: &Arc<SqliteDatabase>,
    queue: &OrderQueue<SqliteDatabase>,
    path: &str,
) -> TestResponse {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let res = get_request(path, configure(Arc::clone(db), queue.clone())).await;
        if res.json()["status"] == "COMPLETED" || tokio::time::Instant::now() > deadline {
            return res;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn timestamp(value: &serde_json::Value) -> DateTime<Utc> {
    value.as_str().and_then(|s| s.parse().ok()).unwrap_or_else(|| panic!("{value} is not a timestamp"))
}

#[actix_web::test]
async fn submitted_order_completes() {
    let _ = env_logger::try_init().ok();
    let db = new_test_database().await;
    let config = QueueConfig::default()
        .with_poll_interval(Duration::from_millis(20))
        .with_processing_delay(Duration::from_millis(10));
    let queue = OrderQueue::new(Arc::clone(&db), config);
    assert!(queue.start().await);

    let res = post_request("/orders", A1, configure(Arc::clone(&db), queue.clone())).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json()["status"], "PENDING");

    let res = poll_until_completed(&db, &queue, "/orders/A1").await;
    assert_eq!(res.status, StatusCode::OK);
    let order = res.json();
    assert_eq!(order["status"], "COMPLETED", "{order}");
    assert!(timestamp(&order["processing_completed_at"]) > timestamp(&order["processing_started_at"]));

    let res = post_request("/orders", A1, configure(Arc::clone(&db), queue.clone())).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let metrics = get_request("/orders/metrics", configure(Arc::clone(&db), queue.clone())).await.json();
    assert_eq!(metrics["total_orders"], 1);
    assert_eq!(metrics["total_orders_processed"], 1);
    assert!(metrics["average_processing_time_seconds"].as_f64().unwrap() > 0.0);

    let stats = get_request("/queue", configure(Arc::clone(&db), queue.clone())).await.json();
    assert_eq!(stats["processed"], 1);
    assert_eq!(stats["running"], true);

    queue.shutdown().await;
    db.close().await;
}
