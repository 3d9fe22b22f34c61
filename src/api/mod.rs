//! HTTP boundary of the dashboard
//!
//! A thin layer that parses query parameters into pipeline requests and
//! serialises the resulting views. The router is assembled here so tests can
//! drive it without binding a socket.

pub mod error_response;
pub mod middleware;
pub mod query;
pub mod routes;

use crate::application::pipeline::DashboardPipeline;
use axum::{middleware::from_fn, routing::get, Router};
use middleware::{logging_middleware, request_id_middleware};
use routes::paths;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the router with its middleware stack.
///
/// Layers run outer to inner: request id, request logging, tower-http trace.
pub fn router(pipeline: Arc<DashboardPipeline>) -> Router {
    Router::new()
        .route(paths::HEALTH, get(routes::health))
        .route(paths::ENTITIES, get(routes::entities))
        .route(paths::SNAPSHOT, get(routes::snapshot))
        .route(paths::SERIES, get(routes::series))
        .with_state(pipeline)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(logging_middleware))
        .layer(from_fn(request_id_middleware))
}
