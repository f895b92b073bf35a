//! Sends a few requests through the logging layer and prints what it logs.
//!
//! An in-process Axum router plays the part of the HTTP transport, so the demo
//! runs without network access:
//!
//! ```sh
//! RUST_LOG=reqlog=debug cargo run --example demo
//! ```

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use reqlog::{InterceptorConfig, LogInterceptorLayer};
use tower::{ServiceBuilder, ServiceExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn users() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "application/json")],
        r#"[{"id":1,"name":"alice"},{"id":2,"name":"bob"}]"#,
    )
}

async fn avatar() -> impl IntoResponse {
    ([(CONTENT_TYPE, "image/png")], Bytes::from_static(&[0x89, b'P', b'N', b'G']))
}

async fn login(body: Bytes) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "application/json")],
        format!(r#"{{"token":"t-{}"}}"#, body.len()),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let transport = Router::new()
        .route("/users", get(users))
        .route("/avatar.png", get(avatar))
        .route("/login", post(login));

    let client = ServiceBuilder::new()
        .layer(LogInterceptorLayer::tracing(
            InterceptorConfig::new("OK_HTTP").show_response(true),
        ))
        .service(transport);

    let requests = vec![
        Request::builder()
            .uri("http://api.local/users")
            .header("accept", "application/json")
            .body(Body::empty())?,
        Request::builder()
            .uri("http://api.local/avatar.png")
            .body(Body::empty())?,
        Request::builder()
            .method(Method::POST)
            .uri("http://api.local/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"user":"alice","password":"hunter2"}"#))?,
    ];

    for request in requests {
        let uri = request.uri().clone();
        let response = client.clone().oneshot(request).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        info!(%uri, %status, bytes = body.len(), "Caller read the full response body");
    }

    Ok(())
}
