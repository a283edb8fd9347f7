use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::error::ApiError;
use super::router::AppState;
use crate::config::Route;

pub async fn modify(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let route: Route = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("error unmarshalling route: {e}")))?;
    tracing::info!(%tenant_id, "update route");

    state.am.modify_tenant_route(&tenant_id, route)?;
    state.reloader.reload().await?;
    Ok(StatusCode::OK)
}

pub async fn get(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Route>, ApiError> {
    Ok(Json(state.am.get_route(&tenant_id)?))
}
