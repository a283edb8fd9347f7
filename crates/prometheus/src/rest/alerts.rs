use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use promcfg_common::TenancyConfig;

use super::error::ApiError;
use super::router::AppState;
use crate::rule::{validate_rule, Rule, RuleJsonWrapper};

#[derive(Deserialize)]
pub struct AlertQuery {
    #[serde(default)]
    pub alert_name: String,
}

pub async fn create(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let rule = decode_rule(&body)?;
    validate_rule(&rule)?;

    if state.alerts.rule_exists(&tenant_id, rule.name()) {
        return Err(ApiError::bad_request(format!(
            "Rule '{}' already exists",
            rule.name()
        )));
    }

    tracing::info!(%tenant_id, rule = rule.name(), "writing alert rule");
    state.alerts.write_rule(&tenant_id, rule)?;
    state.reloader.reload().await?;
    Ok(StatusCode::OK)
}

pub async fn list(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<AlertQuery>,
) -> Result<Json<Vec<RuleJsonWrapper>>, ApiError> {
    let rules = state.alerts.read_rules(&tenant_id, &query.alert_name)?;
    Ok(Json(rules.into_iter().map(RuleJsonWrapper::from).collect()))
}

pub async fn get_by_name(
    State(state): State<AppState>,
    Path((tenant_id, alert_name)): Path<(String, String)>,
) -> Result<Json<Vec<RuleJsonWrapper>>, ApiError> {
    let rules = state.alerts.read_rules(&tenant_id, &alert_name)?;
    Ok(Json(rules.into_iter().map(RuleJsonWrapper::from).collect()))
}

pub async fn update(
    State(state): State<AppState>,
    Path((tenant_id, alert_name)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if !state.alerts.rule_exists(&tenant_id, &alert_name) {
        return Err(ApiError::bad_request(format!(
            "Rule '{alert_name}' does not exist"
        )));
    }

    let rule = decode_rule(&body)?;
    validate_rule(&rule)?;

    tracing::info!(%tenant_id, rule = %alert_name, "updating alert rule");
    state.alerts.update_rule(&tenant_id, rule)?;
    state.reloader.reload().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_by_query(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<AlertQuery>,
) -> Result<StatusCode, ApiError> {
    delete(&state, &tenant_id, &query.alert_name).await
}

pub async fn delete_by_path(
    State(state): State<AppState>,
    Path((tenant_id, alert_name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    delete(&state, &tenant_id, &alert_name).await
}

async fn delete(state: &AppState, tenant_id: &str, alert_name: &str) -> Result<StatusCode, ApiError> {
    if alert_name.is_empty() {
        return Err(ApiError::bad_request("No rule name provided"));
    }

    tracing::info!(%tenant_id, rule = %alert_name, "deleting alert rule");
    state.alerts.delete_rule(tenant_id, alert_name)?;
    state.reloader.reload().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    body: Bytes,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let rules = decode_bulk_rules(&body)?;

    tracing::info!(%tenant_id, count = rules.len(), "bulk updating alert rules");
    let (results, err) = state.alerts.bulk_update(&tenant_id, rules);
    if let Some(err) = err {
        return Err(err.into());
    }

    state.reloader.reload().await?;
    Ok(Json(results))
}

pub async fn tenancy(State(state): State<AppState>) -> Json<TenancyConfig> {
    Json(state.alerts.tenancy().clone())
}

// the canonical rule shape is tried first, then the wrapper shape with
// its plain-string duration
fn decode_rule(body: &[u8]) -> Result<Rule, ApiError> {
    if let Ok(rule) = serde_json::from_slice::<Rule>(body) {
        return Ok(rule);
    }
    let wrapper: RuleJsonWrapper = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("error unmarshalling payload: {e}")))?;
    wrapper.into_rule().map_err(ApiError::from)
}

fn decode_bulk_rules(body: &[u8]) -> Result<Vec<Rule>, ApiError> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("error unmarshalling payload: {e}")))?;
    values
        .into_iter()
        .map(|value| decode_rule(value.to_string().as_bytes()))
        .collect()
}
