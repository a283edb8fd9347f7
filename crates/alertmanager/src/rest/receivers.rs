use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::ApiError;
use super::router::AppState;
use crate::config::Receiver;

#[derive(Deserialize)]
pub struct ReceiverQuery {
    #[serde(default)]
    pub receiver: String,
}

pub async fn create(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let receiver = decode_receiver(&body)?;
    tracing::info!(%tenant_id, receiver = %receiver.name, "configure receiver");

    state.am.create_receiver(&tenant_id, receiver)?;
    state.reloader.reload().await?;
    Ok(StatusCode::OK)
}

pub async fn list(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<Receiver>>, ApiError> {
    Ok(Json(state.am.get_receivers(&tenant_id)?))
}

pub async fn get_by_name(
    State(state): State<AppState>,
    Path((tenant_id, receiver_name)): Path<(String, String)>,
) -> Result<Json<Receiver>, ApiError> {
    let receivers = state.am.get_receivers(&tenant_id)?;
    receivers
        .into_iter()
        .find(|r| r.name == receiver_name)
        .map(Json)
        .ok_or_else(|| ApiError::bad_request(format!("Receiver {receiver_name} not found")))
}

pub async fn update(
    State(state): State<AppState>,
    Path((tenant_id, receiver_name)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let receiver = decode_receiver(&body)?;
    tracing::info!(%tenant_id, receiver = %receiver_name, "update receiver");

    state
        .am
        .update_receiver(&tenant_id, &receiver_name, receiver)?;
    state.reloader.reload().await?;
    Ok(StatusCode::OK)
}

pub async fn delete_by_query(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ReceiverQuery>,
) -> Result<StatusCode, ApiError> {
    delete(&state, &tenant_id, &query.receiver).await
}

pub async fn delete_by_path(
    State(state): State<AppState>,
    Path((tenant_id, receiver_name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    delete(&state, &tenant_id, &receiver_name).await
}

async fn delete(
    state: &AppState,
    tenant_id: &str,
    receiver_name: &str,
) -> Result<StatusCode, ApiError> {
    tracing::info!(%tenant_id, receiver = %receiver_name, "delete receiver");
    state.am.delete_receiver(tenant_id, receiver_name)?;
    state.reloader.reload().await?;
    Ok(StatusCode::OK)
}

fn decode_receiver(body: &[u8]) -> Result<Receiver, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("error unmarshalling payload: {e}")))
}
