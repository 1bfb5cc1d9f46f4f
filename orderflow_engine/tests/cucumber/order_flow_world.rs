use std::{sync::Arc, time::Duration};

use cucumber::World;
use log::*;
use orderflow_engine::{
    test_utils::{create_database, random_db_path, run_migrations},
    MetricsApi,
    OrderFlowApi,
    OrderFlowError,
    OrderQueue,
    QueueConfig,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct OrderFlowWorld {
    pub system: Option<OrderFlowSystem>,
    pub last_error: Option<OrderFlowError>,
}

#[derive(Debug)]
pub struct OrderFlowSystem {
    pub db_path: String,
    pub db: Arc<SqliteDatabase>,
    pub api: OrderFlowApi<SqliteDatabase>,
    pub metrics: MetricsApi<SqliteDatabase>,
}

impl OrderFlowWorld {
    pub fn system(&self) -> &OrderFlowSystem {
        self.system.as_ref().expect("Order flow system not initialised")
    }

    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase> {
        &self.system().api
    }
}

impl OrderFlowSystem {
    pub async fn new(config: QueueConfig) -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let db = Arc::new(db);
        let queue = OrderQueue::new(Arc::clone(&db), config);
        let api = OrderFlowApi::new(Arc::clone(&db), queue);
        let metrics = MetricsApi::new(Arc::clone(&db));
        Self { db_path: url, db, api, metrics }
    }
}

pub fn scenario_queue_config() -> QueueConfig {
    QueueConfig::default().with_poll_interval(Duration::from_millis(20))
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
