use std::time::Duration;

use cucumber::{then, when};
use orderflow_common::Amount;
use orderflow_engine::{
    db_types::{ItemId, NewOrder, OrderId, OrderStatusType},
    test_utils::wait_for_status,
    OrderFlowError,
    OrderManagement,
    OrderStoreError,
    QueueError,
};

use crate::cucumber::OrderFlowWorld;

#[when("the order queue is started")]
async fn start_queue(world: &mut OrderFlowWorld) {
    world.api().queue().start().await;
}

#[when("the order queue is stopped")]
async fn stop_queue(world: &mut OrderFlowWorld) {
    world.api().queue().stop().await;
}

#[when(expr = "user {word} submits order {word} for items {string} totalling {word}")]
async fn submit_order(world: &mut OrderFlowWorld, user_id: String, order_id: String, items: String, total: String) {
    let items: Vec<ItemId> = serde_json::from_str(&items).expect("Item list is not valid JSON");
    let total: Amount = total.parse().expect("Not a valid amount");
    let order = NewOrder::new(OrderId::from(order_id), user_id, items, total);
    world.last_error = world.api().create_order(order).await.err();
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut OrderFlowWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then("the submission is accepted")]
async fn submission_accepted(world: &mut OrderFlowWorld) {
    if let Some(e) = &world.last_error {
        panic!("Expected the order to be accepted, but got: {e}");
    }
}

#[then("the submission is rejected as a duplicate")]
async fn rejected_duplicate(world: &mut OrderFlowWorld) {
    let err = world.last_error.take().expect("Expected the order to be rejected");
    assert!(matches!(err, OrderFlowError::Store(OrderStoreError::DuplicateOrder(_))), "Got {err}");
}

#[then(expr = "the submission is rejected because of the {word} field")]
async fn rejected_field(world: &mut OrderFlowWorld, field: String) {
    let err = world.last_error.take().expect("Expected the order to be rejected");
    match err {
        OrderFlowError::Store(OrderStoreError::ValidationError(errors)) => {
            assert!(errors.contains(&field), "{field} is not mentioned in {errors}");
        },
        e => panic!("Expected a validation error, got {e}"),
    }
}

#[then("the submission is rejected because the queue is full")]
async fn rejected_full(world: &mut OrderFlowWorld) {
    let err = world.last_error.take().expect("Expected the order to be rejected");
    assert!(matches!(err, OrderFlowError::Queue(QueueError::Full { .. })), "Got {err}");
}

#[then(expr = "order {word} is {word}")]
async fn order_has_status(world: &mut OrderFlowWorld, order_id: String, status: String) {
    let status: OrderStatusType = status.parse().expect("Not a valid status");
    let order = world.api().fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order");
    assert_eq!(order.status, status);
}

#[then(expr = "order {word} is {word} within {int}ms")]
async fn order_reaches_status(world: &mut OrderFlowWorld, order_id: String, status: String, ms: u64) {
    let status: OrderStatusType = status.parse().expect("Not a valid status");
    let id = OrderId::from(order_id);
    let order = wait_for_status(world.system().db.as_ref(), &id, status, Duration::from_millis(ms))
        .await
        .expect("Order does not exist");
    assert_eq!(order.status, status, "{id} did not become {status} in time");
    if status == OrderStatusType::Completed {
        let started = order.processing_started_at.expect("Start time is not set");
        let completed = order.processing_completed_at.expect("Completion time is not set");
        assert!(completed > started);
    }
}

#[then(expr = "order {word} does not exist")]
async fn order_does_not_exist(world: &mut OrderFlowWorld, order_id: String) {
    let id = OrderId::from(order_id);
    let order = world.system().db.fetch_order_by_order_id(&id).await.expect("Error fetching order");
    assert!(order.is_none(), "{id} should not have been stored");
}

#[then(expr = "the metrics show {int} orders of which {int} are complete")]
async fn metrics_totals(world: &mut OrderFlowWorld, total: i64, completed: i64) {
    let metrics = world.system().metrics.compute_metrics().await.expect("Error computing metrics");
    assert_eq!(metrics.total_orders, total);
    assert_eq!(metrics.total_orders_processed, completed);
    assert_eq!(metrics.status_counts.total(), total);
    if completed > 0 {
        assert!(metrics.average_processing_time_seconds.is_some());
    }
}

#[then(expr = "the metrics show {int} {word} orders")]
async fn metrics_status_count(world: &mut OrderFlowWorld, count: i64, status: String) {
    let status: OrderStatusType = status.parse().expect("Not a valid status");
    let metrics = world.system().metrics.compute_metrics().await.expect("Error computing metrics");
    assert_eq!(metrics.status_counts.get(status), count);
}
