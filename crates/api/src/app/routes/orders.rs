use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockline_core::OrderId;
use stockline_orders::{NewOrder, OrderPatch};

use crate::app::services::AppServices;
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/status/:status", get(list_by_status))
        .route("/:id", get(get_order).patch(update_order))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewOrder>,
) -> axum::response::Response {
    match services.placement.place_order(body).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<dto::OrderListQuery>,
) -> axum::response::Response {
    let (filter, page) = match query.into_parts() {
        Ok(parts) => parts,
        Err(e) => return errors::service_error_to_response(e),
    };
    match services.orders.query_orders(&filter, page).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_by_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(status): Path<String>,
) -> axum::response::Response {
    let status = match dto::parse_status(&status) {
        Ok(status) => status,
        Err(e) => return errors::service_error_to_response(e),
    };
    match services.orders.list_by_status(status).await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.orders.get_order(&OrderId::from_raw(id)).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Status and field edits. Stock is never touched here.
pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<OrderPatch>,
) -> axum::response::Response {
    match services
        .orders
        .update_order(&OrderId::from_raw(id), body)
        .await
    {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
