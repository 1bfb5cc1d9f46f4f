//! # Order flow server
//! This crate hosts the HTTP front end of the order flow service. It is responsible for:
//! * Accepting new orders, validating them and handing them to the order flow engine.
//! * Serving order lookups, order metrics and the state of the processing queue.
//! * Owning the lifecycle of the queue consumer: it is started with the server and shut down after it.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /orders`: Submit an order.
//! * `GET /orders`: List orders, optionally filtered by `status` and `user_id`.
//! * `GET /orders/metrics`: Order counts per status and the average processing time.
//! * `GET /orders/{order_id}`: Fetch a single order.
//! * `GET /queue`: Whether the queue consumer is running, how many orders are waiting, and how many have been handled.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
