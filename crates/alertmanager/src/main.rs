use std::path::Path;
use std::sync::Arc;

use promcfg_alertmanager::cli;
use promcfg_alertmanager::client::AmClient;
use promcfg_alertmanager::rest::{self, AppState};
use promcfg_alertmanager::template::TemplateClient;
use promcfg_common::{DiskClient, FileLocker, Reloader, TenancyConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = cli::parse();
    if !args.template_dir.ends_with('/') {
        args.template_dir.push('/');
    }

    let tenancy = TenancyConfig {
        restrictor_label: args.multitenant_label.clone(),
        restrict_queries: false,
    };

    let file_locks = Arc::new(
        FileLocker::from_dir(Path::new(&args.template_dir))
            .expect("could not read template directory"),
    );
    let state = AppState {
        am: Arc::new(AmClient::new(
            args.alertmanager_conf.clone(),
            Arc::new(DiskClient::new(String::new())),
            tenancy,
            args.delete_route_with_receiver,
        )),
        templates: Arc::new(TemplateClient::new(
            Arc::new(DiskClient::new(args.template_dir.clone())),
            file_locks,
        )),
        reloader: Arc::new(Reloader::new("alertmanager", args.alertmanager_url.clone())),
    };

    let app = rest::router(state);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("could not bind listen port");
    tracing::info!(%addr, "Alertmanager config server listening");
    axum::serve(listener, app).await.unwrap();
}
