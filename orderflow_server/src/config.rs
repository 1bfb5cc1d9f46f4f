//! Server configuration.
//!
//! Everything is read from `OFS_*` environment variables. Missing values fall back to the defaults below, and
//! malformed values are logged and replaced by their default rather than stopping the server.
use std::{env, time::Duration};

use log::*;
use orderflow_common::helpers::{env_value, parse_boolean_flag};
use orderflow_engine::QueueConfig;

/// Every environment variable the server configuration is read from.
pub const CONFIG_ENV_VARS: [&str; 10] = [
    "OFS_HOST",
    "OFS_PORT",
    "OFS_DATABASE_URL",
    "OFS_DB_MAX_CONNECTIONS",
    "OFS_AUTO_MIGRATE",
    "OFS_QUEUE_POLL_INTERVAL_MS",
    "OFS_QUEUE_MAX_DEPTH",
    "OFS_QUEUE_HIGH_WATER_MARK",
    "OFS_PROCESSING_DELAY_MS",
    "OFS_RECOVER_ON_START",
];

const DEFAULT_OFS_HOST: &str = "127.0.0.1";
const DEFAULT_OFS_PORT: u16 = 8360;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/orders.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_HIGH_WATER_MARK: usize = 10_000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The size of the SQLite connection pool.
    pub max_connections: u32,
    /// Run the embedded migrations when the server starts.
    pub auto_migrate: bool,
    pub queue: QueueConfig,
    /// Put every unfinished order back on the queue when the server starts.
    pub recover_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OFS_HOST.to_string(),
            port: DEFAULT_OFS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
            queue: QueueConfig::default()
                .with_poll_interval(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
                .with_high_water_mark(DEFAULT_HIGH_WATER_MARK),
            recover_on_start: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let host = env::var("OFS_HOST").ok().unwrap_or(defaults.host);
        let port = value_or_default("OFS_PORT", DEFAULT_OFS_PORT);
        let database_url = env::var("OFS_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ OFS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = value_or_default("OFS_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let auto_migrate = parse_boolean_flag(env::var("OFS_AUTO_MIGRATE").ok(), true);
        let recover_on_start = parse_boolean_flag(env::var("OFS_RECOVER_ON_START").ok(), false);
        let queue = queue_config_from_env();
        Self { host, port, database_url, max_connections, auto_migrate, queue, recover_on_start }
    }
}

fn queue_config_from_env() -> QueueConfig {
    let poll_interval = value_or_default("OFS_QUEUE_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);
    let poll_interval = if poll_interval == 0 {
        warn!("🪛️ OFS_QUEUE_POLL_INTERVAL_MS must be greater than zero. Using {DEFAULT_POLL_INTERVAL_MS}ms.");
        DEFAULT_POLL_INTERVAL_MS
    } else {
        poll_interval
    };
    let high_water_mark = value_or_default("OFS_QUEUE_HIGH_WATER_MARK", DEFAULT_HIGH_WATER_MARK);
    let delay = value_or_default("OFS_PROCESSING_DELAY_MS", 0u64);
    let mut config = QueueConfig::default()
        .with_poll_interval(Duration::from_millis(poll_interval))
        .with_high_water_mark(high_water_mark)
        .with_processing_delay(Duration::from_millis(delay));
    match env_value::<usize>("OFS_QUEUE_MAX_DEPTH") {
        None => {},
        Some(Ok(0)) => warn!("🪛️ OFS_QUEUE_MAX_DEPTH must be greater than zero. The queue will be unbounded."),
        Some(Ok(depth)) => config = config.with_max_depth(depth),
        Some(Err(e)) => error!("🪛️ {e} The queue will be unbounded."),
    }
    config
}

fn value_or_default<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env_value::<T>(name) {
        None => default,
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            error!("🪛️ {e} Using the default, {default}, instead.");
            default
        },
    }
}
