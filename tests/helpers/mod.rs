#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use petplates::{AppState, config::Config};
use tower::ServiceExt;

pub fn test_app() -> anyhow::Result<Router> {
    test_app_with(|_| {})
}

pub fn test_app_with(configure: impl FnOnce(&mut Config)) -> anyhow::Result<Router> {
    let mut config = Config::load(Some("config/missing.toml".to_string()))?;
    config.generation.seed = Some(21);
    configure(&mut config);

    Ok(petplates::router(AppState::load(config)?))
}

pub async fn get_json(app: Router, uri: &str) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;

    read_json(response).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: impl Into<Body>,
) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())?,
        )
        .await?;

    read_json(response).await
}

pub async fn post_json_as(
    app: Router,
    uri: &str,
    client_id: &str,
    body: impl Into<Body>,
) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-client-id", client_id)
                .body(body.into())?,
        )
        .await?;

    read_json(response).await
}

async fn read_json(
    response: axum::response::Response,
) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();

    Ok((status, serde_json::from_slice(&bytes)?))
}
