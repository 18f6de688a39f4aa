use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::app::errors::json_error;

/// Require an `Authorization: Bearer <token>` header.
///
/// The token is opaque; only its presence is checked.
pub async fn auth_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Err(status) = extract_bearer(req.headers()) {
        tracing::debug!(path = %req.uri().path(), "rejected request without bearer token");
        return json_error(status, "unauthorized", "missing or malformed bearer token");
    }

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
