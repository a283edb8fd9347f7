use axum::extract::{RawPathParams, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;

pub async fn require_tenant(params: RawPathParams, request: Request, next: Next) -> Response {
    let tenant_id = params
        .iter()
        .find(|(name, _)| *name == "tenant_id")
        .map(|(_, value)| value)
        .unwrap_or("");
    if tenant_id.is_empty() {
        return ApiError::bad_request("Must provide tenant_id parameter").into_response();
    }
    next.run(request).await
}
