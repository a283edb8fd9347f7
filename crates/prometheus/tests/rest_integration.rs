use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::Router;
use tower::ServiceExt;

use promcfg_common::{DiskClient, FileLocker, Reloader, TenancyConfig};
use promcfg_prometheus::rest::{router, AppState};
use promcfg_prometheus::rule::AlertClient;

async fn reload_stub() -> String {
    let app = Router::new().route("/-/reload", post(|| async { StatusCode::OK }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

async fn test_app() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let root = format!("{}/", dir.path().display());
    let state = AppState {
        alerts: Arc::new(AlertClient::new(
            Arc::new(FileLocker::new()),
            Arc::new(DiskClient::new(root)),
            TenancyConfig {
                restrictor_label: "tenant".into(),
                restrict_queries: true,
            },
        )),
        reloader: Arc::new(Reloader::new("prometheus", reload_stub().await)),
    };
    (dir, router(state))
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn liveness_string_served_at_root() {
    let (_dir, app) = test_app().await;
    let resp = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"Prometheus Config server");
}

#[tokio::test]
async fn create_then_read_returns_secured_rule() {
    let (_dir, app) = test_app().await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/acme/alert",
            serde_json::json!({"alert": "HostDown", "expr": "up == 0"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(get_request("/acme/alert?alert_name=HostDown"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rules = body_json(resp).await;
    assert_eq!(
        rules,
        serde_json::json!([{
            "alert": "HostDown",
            "expr": "up{tenant=\"acme\"} == 0",
            "for": "0s",
            "labels": {"tenant": "acme"},
            "annotations": {},
        }])
    );
}

#[tokio::test]
async fn create_duplicate_rule_rejected() {
    let (_dir, app) = test_app().await;
    let body = serde_json::json!({"alert": "HostDown", "expr": "up == 0"});

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/acme/alert", body.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(json_request("POST", "/acme/alert", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["message"],
        "Rule 'HostDown' already exists"
    );
}

#[tokio::test]
async fn create_invalid_rule_rejected_before_write() {
    let (dir, app) = test_app().await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/acme/alert",
            serde_json::json!({"alert": "Bad", "expr": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let message = body_json(resp).await["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Rule Validation Error"));
    assert!(!dir.path().join("acme_rules.yml").exists());
}

#[tokio::test]
async fn update_missing_rule_rejected() {
    let (_dir, app) = test_app().await;
    let resp = app
        .oneshot(json_request(
            "PUT",
            "/acme/alert/Missing",
            serde_json::json!({"alert": "Missing", "expr": "up"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["message"],
        "Rule 'Missing' does not exist"
    );
}

#[tokio::test]
async fn update_existing_rule_round_trips() {
    let (_dir, app) = test_app().await;
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/acme/alert",
            serde_json::json!({"alert": "HostDown", "expr": "up == 0"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/v1/acme/alert/HostDown",
            serde_json::json!({"alert": "HostDown", "expr": "up == 1", "for": "5s"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(get_request("/v1/acme/alert/HostDown"))
        .await
        .unwrap();
    let rules = body_json(resp).await;
    assert_eq!(rules[0]["expr"], "up{tenant=\"acme\"} == 1");
    assert_eq!(rules[0]["for"], "5s");
}

#[tokio::test]
async fn bulk_collects_statuses_and_errors() {
    let (_dir, app) = test_app().await;
    let resp = app
        .oneshot(json_request(
            "PUT",
            "/acme/alert/bulk",
            serde_json::json!([
                {"alert": "A", "expr": "up"},
                {"alert": "B", "expr": "malformed{."},
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let results = body_json(resp).await;
    assert_eq!(results["statuses"], serde_json::json!({"A": "created"}));
    assert_eq!(
        results["errors"]["B"],
        "error parsing query: 1:11: parse error: unexpected character inside braces: '.'"
    );
}

#[tokio::test]
async fn bulk_updates_existing_rules() {
    let (_dir, app) = test_app().await;
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/acme/alert/bulk",
            serde_json::json!([{"alert": "A", "expr": "up"}]),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/v1/acme/alert/bulk",
            serde_json::json!([{"alert": "A", "expr": "up == 0"}]),
        ))
        .await
        .unwrap();
    let results = body_json(resp).await;
    assert_eq!(results["statuses"], serde_json::json!({"A": "updated"}));
}

#[tokio::test]
async fn delete_by_query_and_by_path() {
    let (_dir, app) = test_app().await;
    for name in ["A", "B"] {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/acme/alert",
                serde_json::json!({"alert": name, "expr": "up"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/acme/alert?alert_name=A")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/v1/acme/alert/B")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(get_request("/acme/alert")).await.unwrap();
    assert_eq!(body_json(resp).await, serde_json::json!([]));
}

#[tokio::test]
async fn delete_without_name_rejected() {
    let (_dir, app) = test_app().await;
    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/acme/alert")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "No rule name provided");
}

#[tokio::test]
async fn read_missing_tenant_is_empty_list() {
    let (_dir, app) = test_app().await;
    let resp = app.oneshot(get_request("/ghost/alert")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!([]));
}

#[tokio::test]
async fn tenancy_endpoint_reports_config() {
    let (_dir, app) = test_app().await;
    let resp = app.oneshot(get_request("/v1/tenancy")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        serde_json::json!({"restrictor_label": "tenant", "restrict_queries": true})
    );
}
