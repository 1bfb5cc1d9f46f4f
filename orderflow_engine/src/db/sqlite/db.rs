use std::fmt::Debug;

use async_trait::async_trait;
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::{db_url, new_pool, orders};
use crate::{
    db::traits::{OrderManagement, OrderStoreError},
    db_types::{NewOrder, Order, OrderId, StatusCounts, StatusTransition},
    flow_api::order_objects::OrderQueryFilter,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

#[async_trait]
impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        order.validate().map_err(OrderStoreError::ValidationError)?;
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(order, &mut conn).await?;
        debug!("🗃️ Order {} has been saved in the DB", order.order_id);
        Ok(order)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        transition: StatusTransition,
    ) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let result = match orders::try_update_order_status(order_id, transition, &mut tx).await? {
            Some(order) => Ok(order),
            None => match orders::fetch_order_by_order_id(order_id, &mut tx).await? {
                None => Err(OrderStoreError::OrderNotFound(order_id.clone())),
                Some(order) => Err(OrderStoreError::InvalidTransition {
                    order_id: order_id.clone(),
                    current: order.status,
                    requested: transition.to_status(),
                }),
            },
        };
        tx.commit().await?;
        result
    }

    async fn status_counts(&self) -> Result<StatusCounts, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::status_counts(&mut conn).await
    }

    async fn average_processing_seconds(&self) -> Result<Option<f64>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::average_processing_seconds(&mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `OFS_DATABASE_URL` or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date using the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Closes every connection in the pool. Pending queries are allowed to finish first.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("🗃️ Database connection pool for {} closed", self.url);
    }
}
