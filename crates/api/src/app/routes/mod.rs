use axum::Router;

pub mod dashboard;
pub mod orders;
pub mod products;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/orders", orders::router())
        .nest("/products", products::router())
        .nest("/dashboard", dashboard::router())
}
