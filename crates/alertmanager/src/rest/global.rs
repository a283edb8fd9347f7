use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::error::ApiError;
use super::router::AppState;
use crate::config::GlobalConfig;

pub async fn get(
    State(state): State<AppState>,
) -> Result<Json<Option<GlobalConfig>>, ApiError> {
    Ok(Json(state.am.get_global_config()?))
}

pub async fn set(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let global: GlobalConfig = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("error unmarshalling payload: {e}")))?;
    tracing::info!("update global config");

    state.am.set_global_config(global)?;
    state.reloader.reload().await?;
    Ok(StatusCode::OK)
}
