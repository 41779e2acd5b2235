//! Integration tests for the liveness and readiness endpoints.

mod common;

use common::{test_config, TestApp};
use std::time::Duration;

#[tokio::test]
async fn health_check_returns_ok() {
    // Upstream is never contacted by the probes.
    let app = TestApp::spawn(test_config("http://127.0.0.1:9")).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "analysis-relay");
}

#[tokio::test]
async fn readiness_check_returns_ok_when_configured() {
    let app = TestApp::spawn(test_config("http://127.0.0.1:9")).await;

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["provider"], "gemini");
}

#[tokio::test]
async fn readiness_check_fails_without_api_key() {
    let mut config = test_config("http://127.0.0.1:9");
    config.gemini.api_key = String::new();
    let app = TestApp::spawn(config).await;

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 503);
}
