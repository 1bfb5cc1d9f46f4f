use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Row, SqliteConnection};

use crate::{
    db::traits::OrderStoreError,
    db_types::{NewOrder, Order, OrderId, OrderStatusType, StatusCounts, StatusTransition},
    flow_api::order_objects::OrderQueryFilter,
};

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatusType>()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "status".into(), source: Box::new(e) })?;
        let item_ids: String = row.try_get("item_ids")?;
        let item_ids = serde_json::from_str(&item_ids)
            .map_err(|e| sqlx::Error::ColumnDecode { index: "item_ids".into(), source: Box::new(e) })?;
        Ok(Self {
            order_id: row.try_get("order_id")?,
            user_id: row.try_get("user_id")?,
            item_ids,
            total_amount: row.try_get("total_amount")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            processing_started_at: row.try_get("processing_started_at")?,
            processing_completed_at: row.try_get("processing_completed_at")?,
        })
    }
}

/// Inserts a new order into the database using the given connection.
///
/// There is no prior existence check. The unique index on `order_id` is the sole arbiter of duplicates, and a
/// violation is reported as [`OrderStoreError::DuplicateOrder`].
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let item_ids = serde_json::to_string(&order.item_ids)
        .map_err(|e| OrderStoreError::DatabaseError(format!("Could not serialize item ids. {e}")))?;
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, user_id, item_ids, total_amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'PENDING', $5, $5)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.user_id)
    .bind(item_ids)
    .bind(order.total_amount)
    .bind(order.created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(e) => match OrderStoreError::from(e) {
            OrderStoreError::ConstraintViolation(_) => Err(OrderStoreError::DuplicateOrder(order.order_id)),
            other => Err(other),
        },
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order, with ties broken by insertion order.
pub async fn search_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderStoreError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    // Timestamps are RFC3339 text in UTC with a variable number of fractional digits. Text order still matches time
    // order because '+' sorts before '.', and '.' before every digit.
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Applies the transition with a single conditional update. The `WHERE` clause names the status the order must still
/// be in, so a stale caller can never move an order backwards or skip a step.
///
/// Returns `Ok(None)` if no row matched.
pub async fn try_update_order_status(
    order_id: &OrderId,
    transition: StatusTransition,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let timestamp_column = match transition {
        StatusTransition::StartProcessing { .. } => "processing_started_at",
        StatusTransition::Complete { .. } => "processing_completed_at",
    };
    let sql = format!(
        "UPDATE orders SET status = '{to}', updated_at = $1, {timestamp_column} = $1 WHERE order_id = $2 AND status \
         = '{from}' RETURNING *",
        to = transition.to_status(),
        from = transition.from_status(),
    );
    let order: Option<Order> = sqlx::query_as(&sql).bind(transition.at()).bind(order_id).fetch_optional(conn).await?;
    if order.is_some() {
        debug!("🗃️ Order {order_id} moved to {}", transition.to_status());
    }
    Ok(order)
}

/// Counts the orders in each status with one grouped query, so the counts are mutually consistent.
pub async fn status_counts(conn: &mut SqliteConnection) -> Result<StatusCounts, OrderStoreError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) AS count FROM orders GROUP BY status").fetch_all(conn).await?;
    let mut counts = StatusCounts::default();
    for (status, count) in rows {
        let status = status.parse::<OrderStatusType>().map_err(|e| OrderStoreError::DatabaseError(e.to_string()))?;
        counts.set(status, count);
    }
    Ok(counts)
}

/// Averages `processing_completed_at - processing_started_at` over every completed order, at microsecond precision.
///
/// The difference is taken in Rust rather than with `julianday`, which rounds each timestamp to whole milliseconds.
pub async fn average_processing_seconds(conn: &mut SqliteConnection) -> Result<Option<f64>, OrderStoreError> {
    let spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
        r#"
            SELECT processing_started_at, processing_completed_at
            FROM orders
            WHERE status = 'COMPLETED'
              AND processing_started_at IS NOT NULL
              AND processing_completed_at IS NOT NULL
        "#,
    )
    .fetch_all(conn)
    .await?;
    if spans.is_empty() {
        return Ok(None);
    }
    let total_us = spans
        .iter()
        .map(|(started, completed)| (*completed - *started).num_microseconds().unwrap_or(i64::MAX) as i128)
        .sum::<i128>();
    Ok(Some(total_us as f64 / spans.len() as f64 / 1_000_000.0))
}
