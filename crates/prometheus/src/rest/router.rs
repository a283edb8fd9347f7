use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;

use promcfg_common::Reloader;

use super::{alerts, tenancy};
use crate::rule::AlertClient;

#[derive(Clone)]
pub struct AppState {
    pub alerts: Arc<AlertClient>,
    pub reloader: Arc<Reloader>,
}

pub fn router(state: AppState) -> Router {
    let v0_tenant = Router::new()
        .route(
            "/:tenant_id/alert",
            post(alerts::create)
                .get(alerts::list)
                .delete(alerts::delete_by_query),
        )
        .route("/:tenant_id/alert/bulk", put(alerts::bulk))
        .route("/:tenant_id/alert/:alert_name", put(alerts::update))
        .route_layer(middleware::from_fn(tenancy::require_tenant));

    let v1_tenant = Router::new()
        .route(
            "/v1/:tenant_id/alert",
            post(alerts::create).get(alerts::list),
        )
        .route("/v1/:tenant_id/alert/bulk", post(alerts::bulk))
        .route(
            "/v1/:tenant_id/alert/:alert_name",
            get(alerts::get_by_name)
                .put(alerts::update)
                .delete(alerts::delete_by_path),
        )
        .route_layer(middleware::from_fn(tenancy::require_tenant));

    Router::new()
        .route("/", get(status))
        .route("/v1/tenancy", get(alerts::tenancy))
        .merge(v0_tenant)
        .merge(v1_tenant)
        .with_state(state)
}

async fn status() -> &'static str {
    "Prometheus Config server"
}
