use std::path::Path;
use std::sync::Arc;

use promcfg_common::{DiskClient, FileLocker, Reloader, TenancyConfig};
use promcfg_prometheus::cli;
use promcfg_prometheus::rest::{self, AppState};
use promcfg_prometheus::rule::AlertClient;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = cli::parse();
    if !args.rules_dir.ends_with('/') {
        args.rules_dir.push('/');
    }
    if std::fs::metadata(&args.rules_dir).is_err() {
        std::fs::create_dir_all(&args.rules_dir).expect("could not create rules directory");
    }

    let locks = Arc::new(
        FileLocker::from_dir(Path::new(&args.rules_dir)).expect("could not read rules directory"),
    );
    let tenancy = TenancyConfig {
        restrictor_label: args.multitenant_label.clone(),
        restrict_queries: args.restrict_queries,
    };
    let state = AppState {
        alerts: Arc::new(AlertClient::new(
            locks,
            Arc::new(DiskClient::new(args.rules_dir.clone())),
            tenancy,
        )),
        reloader: Arc::new(Reloader::new("prometheus", args.prometheus_url.clone())),
    };

    let app = rest::router(state);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("could not bind listen port");
    tracing::info!(%addr, "Prometheus config server listening");
    axum::serve(listener, app).await.unwrap();
}
