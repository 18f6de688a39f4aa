use std::sync::Arc;

use axum::{Json, Router, extract::Extension, response::IntoResponse, routing::get};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", get(dashboard))
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.dashboard.build().await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
