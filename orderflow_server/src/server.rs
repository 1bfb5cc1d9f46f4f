use std::{path::Path, sync::Arc, time::Duration};

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::{Logger, NormalizePath},
    web,
    App,
    HttpServer,
};
use log::*;
use orderflow_engine::{MetricsApi, OrderFlowApi, OrderQueue, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{configure_order_routes, health},
};

/// Runs the order flow service until the HTTP server stops (normally on SIGINT or SIGTERM).
///
/// Startup: open (and migrate) the database, optionally re-queue unfinished orders, then start the queue consumer
/// and the HTTP server. On the way out the queue is shut down before the connection pool is closed, so the consumer
/// never sees a closed pool.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    prepare_data_directory(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not open {}. {e}", config.database_url)))?;
    if config.auto_migrate {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    }
    let db = Arc::new(db);
    let queue = OrderQueue::new(Arc::clone(&db), config.queue.clone());
    if config.recover_on_start {
        let api = OrderFlowApi::new(Arc::clone(&db), queue.clone());
        api.recover_unfinished_orders().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    queue.start().await;
    let srv = create_server_instance(&config, Arc::clone(&db), queue.clone())?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    info!("🚀️ HTTP server has stopped. Shutting down the order queue.");
    queue.shutdown().await;
    db.close().await;
    result
}

pub fn create_server_instance(
    config: &ServerConfig,
    db: Arc<SqliteDatabase>,
    queue: OrderQueue<SqliteDatabase>,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(Arc::clone(&db), queue.clone());
        let metrics_api = MetricsApi::new(Arc::clone(&db));
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ofs::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(metrics_api))
            .service(health)
            .configure(configure_order_routes::<SqliteDatabase>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// SQLite creates the database file on demand, but not the directory it lives in.
fn prepare_data_directory(url: &str) -> Result<(), ServerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🚀️ Creating data directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
