//! Catalog endpoints.
//!
//! Prices are integer minor units (cents): `"price": 1999` is 19.99. Decimal
//! prices are rejected as a `validation_error`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockline_catalog::{NewProduct, ProductPatch};
use stockline_core::ProductId;

use crate::app::services::AppServices;
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewProduct>,
) -> axum::response::Response {
    match services.catalog.create_product(body).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<dto::ProductListQuery>,
) -> axum::response::Response {
    let (filter, page) = match query.into_parts() {
        Ok(parts) => parts,
        Err(e) => return errors::service_error_to_response(e),
    };
    match services.catalog.list_products(&filter, page).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.catalog.get_product(&ProductId::from_raw(id)).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProductPatch>,
) -> axum::response::Response {
    match services
        .catalog
        .update_product(&ProductId::from_raw(id), body)
        .await
    {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
