//! HTTP API application wiring (axum router + service wiring).
//!
//! - `services.rs`: stores, outbound clients and application services
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: query-string DTOs and their mapping to filters
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: JSON body/query extractors with JSON rejections

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router around already-wired services.
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    // Protected routes: require a bearer token.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
