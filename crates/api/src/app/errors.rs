use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockline_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        ServiceError::NotFound { entity, id } => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{entity} not found: {id}"),
        ),
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::ExternalService(msg) => {
            json_error(StatusCode::BAD_GATEWAY, "external_service_error", msg)
        }
        ServiceError::PartialInconsistency {
            order_id,
            product_id,
            quantity,
            reason,
        } => {
            tracing::error!(
                order_id = %order_id,
                product_id = %product_id,
                quantity,
                "order placement left stock unreconciled"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(json!({
                    "error": "partial_inconsistency",
                    "message": reason,
                    "reconciliation": {
                        "orderId": order_id.as_str(),
                        "productId": product_id.as_str(),
                        "quantity": quantity,
                    },
                })),
            )
                .into_response()
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
