use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::error::ApiError;
use super::router::AppState;
use crate::template::TEMPLATE_FILE_POSTFIX;

pub async fn get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<String>, ApiError> {
    require_registered(&state, &filename, &format!(
        "error getting file {filename}: file does not exist"
    ))?;
    let text = state
        .templates
        .get_template_file(&filename)
        .map_err(|e| ApiError::internal(format!("error getting template file: {e}")))?;
    Ok(Json(text))
}

pub async fn create_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), ApiError> {
    if file_registered(&state, &filename)? {
        return Err(ApiError::bad_request(format!(
            "file {filename} already exists"
        )));
    }
    let text = body_string(body)?;

    tracing::info!(file = %filename, "create template file");
    state
        .templates
        .create_template_file(&filename, &text)
        .map_err(|e| ApiError::internal(format!("error creating template file: {e}")))?;
    state
        .am
        .add_template_path(&full_file_path(&state, &filename))
        .map_err(|e| ApiError::internal(format!("error creating template file: {e}")))?;
    Ok((StatusCode::OK, "Created"))
}

pub async fn edit_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    require_registered(&state, &filename, &format!(
        "error editing file {filename}: file does not exist"
    ))?;
    let text = body_string(body)?;

    tracing::info!(file = %filename, "edit template file");
    state
        .templates
        .edit_template_file(&filename, &text)
        .map_err(|e| ApiError::internal(format!("error editing template file: {e}")))?;
    Ok(StatusCode::OK)
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_registered(&state, &filename, &format!(
        "error deleting file: file {filename} does not exist"
    ))?;

    tracing::info!(file = %filename, "delete template file");
    state
        .templates
        .delete_template_file(&filename)
        .map_err(|e| ApiError::internal(format!("error deleting template file: {e}")))?;
    state
        .am
        .remove_template_path(&full_file_path(&state, &filename))
        .map_err(|e| ApiError::internal(format!("error deleting template file: {e}")))?;
    Ok(StatusCode::OK)
}

pub async fn get_templates(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    require_registered(&state, &filename, &format!(
        "error getting file: file {filename} does not exist"
    ))?;
    let templates = state
        .templates
        .get_templates(&filename)
        .map_err(|e| ApiError::internal(format!("error getting templates: {e}")))?;
    Ok(Json(templates))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path((filename, tmpl_name)): Path<(String, String)>,
) -> Result<String, ApiError> {
    require_registered(&state, &filename, &format!(
        "error getting template: file {filename} does not exist"
    ))?;
    Ok(state.templates.get_template(&filename, &tmpl_name)?)
}

pub async fn add_template(
    State(state): State<AppState>,
    Path((filename, tmpl_name)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let text = body_string(body)?;
    require_registered(&state, &filename, &format!(
        "error getting template: file {filename} does not exist"
    ))?;

    tracing::info!(file = %filename, template = %tmpl_name, "add template");
    state.templates.add_template(&filename, &tmpl_name, &text)?;
    Ok(StatusCode::OK)
}

pub async fn edit_template(
    State(state): State<AppState>,
    Path((filename, tmpl_name)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let text = body_string(body)?;
    require_registered(&state, &filename, &format!(
        "error getting template: file {filename} does not exist"
    ))?;

    tracing::info!(file = %filename, template = %tmpl_name, "edit template");
    state
        .templates
        .edit_template(&filename, &tmpl_name, &text)?;
    Ok(StatusCode::OK)
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path((filename, tmpl_name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    require_registered(&state, &filename, &format!(
        "error getting template: file {filename} does not exist"
    ))?;

    tracing::info!(file = %filename, template = %tmpl_name, "delete template");
    state
        .templates
        .delete_template(&filename, &tmpl_name)?;
    Ok(StatusCode::OK)
}

// a file is visible only once its absolute path is registered with the
// dispatcher's configuration document
fn file_registered(state: &AppState, filename: &str) -> Result<bool, ApiError> {
    let files = state.am.get_template_file_list()?;
    Ok(files.contains(&full_file_path(state, filename)))
}

fn require_registered(state: &AppState, filename: &str, message: &str) -> Result<(), ApiError> {
    if !file_registered(state, filename)? {
        return Err(ApiError::bad_request(message));
    }
    Ok(())
}

fn full_file_path(state: &AppState, filename: &str) -> String {
    format!(
        "{}{}{}",
        state.templates.root(),
        filename,
        TEMPLATE_FILE_POSTFIX
    )
}

fn body_string(body: Bytes) -> Result<String, ApiError> {
    String::from_utf8(body.to_vec())
        .map_err(|e| ApiError::bad_request(format!("error reading request body: {e}")))
}
