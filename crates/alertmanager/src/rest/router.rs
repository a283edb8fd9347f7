use std::sync::Arc;

use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use promcfg_common::{Reloader, TenancyConfig};

use super::error::ApiError;
use super::{global, receivers, routes, templates, tenancy};
use crate::client::AmClient;
use crate::template::TemplateClient;

#[derive(Clone)]
pub struct AppState {
    pub am: Arc<AmClient>,
    pub templates: Arc<TemplateClient>,
    pub reloader: Arc<Reloader>,
}

pub fn router(state: AppState) -> Router {
    let v0_tenant = Router::new()
        .route(
            "/:tenant_id/receiver",
            post(receivers::create)
                .get(receivers::list)
                .delete(receivers::delete_by_query),
        )
        .route(
            "/:tenant_id/receiver/:receiver_name",
            put(receivers::update),
        )
        .route(
            "/:tenant_id/receiver/route",
            post(routes::modify).get(routes::get),
        )
        .route_layer(middleware::from_fn(tenancy::require_tenant));

    let v1_tenant = Router::new()
        .route(
            "/v1/:tenant_id/receiver",
            post(receivers::create).get(receivers::list),
        )
        .route(
            "/v1/:tenant_id/receiver/:receiver_name",
            get(receivers::get_by_name)
                .put(receivers::update)
                .delete(receivers::delete_by_path),
        )
        .route(
            "/v1/:tenant_id/route",
            post(routes::modify).get(routes::get),
        )
        .route_layer(middleware::from_fn(tenancy::require_tenant));

    // template files share the tenant path position; the segment is the
    // file name for these routes
    let v1_templates = Router::new()
        .route(
            "/v1/:tenant_id/template",
            get(templates::get_file)
                .post(templates::create_file)
                .put(templates::edit_file)
                .delete(templates::delete_file),
        )
        .route("/v1/:tenant_id/templates", get(templates::get_templates))
        .route(
            "/v1/:tenant_id/template/:tmpl_name",
            get(templates::get_template)
                .post(templates::add_template)
                .put(templates::edit_template)
                .delete(templates::delete_template),
        );

    Router::new()
        .route("/", get(status))
        .route("/v1/tenants", get(tenants))
        .route("/v1/tenancy", get(tenancy_config))
        .route("/v1/global", post(global::set).get(global::get))
        .merge(v0_tenant)
        .merge(v1_tenant)
        .merge(v1_templates)
        .with_state(state)
}

async fn status() -> &'static str {
    "Alertmanager Config server"
}

async fn tenants(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.am.get_tenants()?))
}

async fn tenancy_config(State(state): State<AppState>) -> Json<TenancyConfig> {
    Json(state.am.tenancy().clone())
}
