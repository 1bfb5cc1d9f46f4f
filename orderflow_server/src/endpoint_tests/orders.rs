use std::sync::Arc;

use actix_web::http::{header::RETRY_AFTER, StatusCode};
use orderflow_common::Amount;
use orderflow_engine::{
    db_types::{ItemId, OrderId, OrderStatusType},
    OrderQueue,
    OrderStoreError,
    QueueConfig,
};

use super::{
    helpers::{configure, get_request, post_request},
    mocks::{sample_order, stored, MockOrderStore},
};

const A1: &str = r#"{"order_id": "A1", "user_id": "U1", "item_ids": [1, 2], "total_amount": 50.00}"#;

fn system(db: MockOrderStore, config: QueueConfig) -> (Arc<MockOrderStore>, OrderQueue<MockOrderStore>) {
    let db = Arc::new(db);
    let queue = OrderQueue::new(Arc::clone(&db), config);
    (db, queue)
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order()
        .withf(|o| {
            o.order_id.as_str() == "A1" &&
                o.user_id == "U1" &&
                o.item_ids == vec![ItemId::Number(1), ItemId::Number(2)] &&
                o.total_amount == Amount::from_cents(5000)
        })
        .times(1)
        .returning(|o| Ok(stored(o)));
    let (db, queue) = system(db, QueueConfig::default());
    let res = post_request("/orders", A1, configure(db, queue.clone())).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let body = res.json();
    assert_eq!(body["order_id"], "A1");
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["total_amount"], "50.00");
    assert_eq!(body["item_ids"], serde_json::json!([1, 2]));
    assert!(body["processing_started_at"].is_null());
    assert_eq!(queue.depth(), 1, "The new order should be waiting in the queue");
}

#[actix_web::test]
async fn create_order_with_trailing_slash() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().times(1).returning(|o| Ok(stored(o)));
    let (db, queue) = system(db, QueueConfig::default());
    let res = post_request("/orders/", A1, configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::CREATED);
}

#[actix_web::test]
async fn invalid_order_is_not_stored() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().never();
    let (db, queue) = system(db, QueueConfig::default());
    let body = r#"{"order_id": "A2", "user_id": "U1", "item_ids": [], "total_amount": 0}"#;
    let res = post_request("/orders", body, configure(db, queue.clone())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["error"], "The order is invalid.");
    assert_eq!(body["fields"]["item_ids"][0], "Items list cannot be empty.");
    assert_eq!(body["fields"]["total_amount"][0], "Total amount must be greater than zero.");
    assert!(body["fields"].get("order_id").is_none());
    assert_eq!(queue.depth(), 0);
}

#[actix_web::test]
async fn missing_fields_are_listed() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().never();
    let (db, queue) = system(db, QueueConfig::default());
    let res = post_request("/orders", r#"{"order_id": "A3"}"#, configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    for field in ["user_id", "item_ids", "total_amount"] {
        assert_eq!(body["fields"][field][0], "This field is required.", "{field}");
    }
}

#[actix_web::test]
async fn malformed_body() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().never();
    let (db, queue) = system(db, QueueConfig::default());
    let res = post_request("/orders", r#"{"order_id": "A1", "#, configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert!(body["error"].as_str().unwrap().starts_with("Could not read request body"), "{body}");
}

#[actix_web::test]
async fn duplicate_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().times(1).returning(|o| Err(OrderStoreError::DuplicateOrder(o.order_id)));
    let (db, queue) = system(db, QueueConfig::default());
    let res = post_request("/orders", A1, configure(db, queue.clone())).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json()["error"], "An order with id A1 already exists.");
    assert_eq!(queue.depth(), 0, "A rejected order must not take up a queue slot");
}

#[actix_web::test]
async fn full_queue() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().never();
    let (db, queue) = system(db, QueueConfig::default().with_max_depth(1));
    queue.enqueue(OrderId::from("WAITING")).unwrap();
    let res = post_request("/orders", A1, configure(db, queue.clone())).await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(res.headers.contains_key(RETRY_AFTER));
    assert!(res.json()["error"].as_str().unwrap().contains("queue is full"));
    assert_eq!(queue.depth(), 1);
}

#[actix_web::test]
async fn closed_queue() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_insert_order().never();
    let (db, queue) = system(db, QueueConfig::default());
    queue.shutdown().await;
    let res = post_request("/orders", A1, configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!res.headers.contains_key(RETRY_AFTER));
}

#[actix_web::test]
async fn fetch_order_by_id() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_fetch_order_by_order_id()
        .withf(|id| id.as_str() == "A1")
        .returning(|_| Ok(Some(sample_order("A1", "U1", OrderStatusType::Completed))));
    db.expect_fetch_order_by_order_id().withf(|id| id.as_str() == "NOPE").returning(|_| Ok(None));
    let (db, queue) = system(db, QueueConfig::default());

    let res = get_request("/orders/A1", configure(Arc::clone(&db), queue.clone())).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["processing_started_at"], "2024-06-01T12:00:01Z");
    assert_eq!(body["processing_completed_at"], "2024-06-01T12:00:03Z");

    let res = get_request("/orders/NOPE", configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["error"], "The data was not found. Order NOPE does not exist.");
}

#[actix_web::test]
async fn list_all_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_search_orders().withf(|q| q.is_empty()).times(1).returning(|_| {
        Ok(vec![
            sample_order("A1", "U1", OrderStatusType::Completed),
            sample_order("A2", "U2", OrderStatusType::Pending),
        ])
    });
    let (db, queue) = system(db, QueueConfig::default());
    let res = get_request("/orders", configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["order_id"], "A1");
    assert_eq!(orders[1]["status"], "PENDING");
}

#[actix_web::test]
async fn list_orders_with_filters() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderStore::new();
    db.expect_search_orders()
        .withf(|q| q.status == Some(OrderStatusType::Pending) && q.user_id.as_deref() == Some("U2"))
        .times(1)
        .returning(|_| Ok(vec![sample_order("A2", "U2", OrderStatusType::Pending)]));
    let (db, queue) = system(db, QueueConfig::default());
    let res = get_request("/orders/?status=PENDING&user_id=U2", configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json().as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn bad_filters() {
    let _ = env_logger::try_init().ok();
    for query in ["status=SHIPPED", "colour=red"] {
        let mut db = MockOrderStore::new();
        db.expect_search_orders().never();
        let (db, queue) = system(db, QueueConfig::default());
        let res = get_request(&format!("/orders?{query}"), configure(db, queue)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{query}");
        assert!(res.json()["error"].as_str().unwrap().starts_with("Could not read request query"));
    }
}

#[actix_web::test]
async fn queue_status() {
    let _ = env_logger::try_init().ok();
    let (db, queue) = system(MockOrderStore::new(), QueueConfig::default());
    queue.enqueue(OrderId::from("Q1")).unwrap();
    queue.enqueue(OrderId::from("Q2")).unwrap();
    let res = get_request("/queue", configure(db, queue)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), serde_json::json!({"running": false, "depth": 2, "processed": 0, "failed": 0}));
}
