#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use rentdesk_backend::{AppState, config::Config};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        redis_url: String::new(),
        jwt_secret: "integration-test-secret".into(),
        server_host: "::".into(),
        server_port: 0,
        api_base_uri: "/api".into(),
        session_ttl_days: 180,
        otp_ttl_secs: 600,
        rate_limit_window_secs: 60,
        rate_limit_requests: 100,
        enable_test_otp: false,
        expose_dev_otp: false,
        invalidate_prior_otps: false,
    }
}

/// State whose pool never connects. Only usable for request paths that
/// fail before any store call.
pub fn lazy_state(config: Config) -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://postgres@127.0.0.1:1/unreachable")
        .expect("lazy pool");
    let redis = redis::Client::open("redis://127.0.0.1:1").expect("redis client");
    AppState {
        pool,
        config,
        redis: Arc::new(redis),
    }
}

/// State over the database named by DATABASE_URL. The schema must be
/// migrated; the ignored tests that use this say so.
pub async fn db_state(config: Config) -> AppState {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");
    let redis = redis::Client::open("redis://127.0.0.1:1").expect("redis client");
    AppState {
        pool,
        config,
        redis: Arc::new(redis),
    }
}

pub async fn post_json(
    router: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub async fn get_with_token(
    router: &Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(router, builder.body(Body::empty()).unwrap()).await
}

pub async fn put_json(
    router: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
