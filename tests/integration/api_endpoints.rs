//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - `/execute` fetches one target and reports what it wrote
//! - Invalid `/execute` requests never reach the PageSpeed API
//! - `/metrics` serves the Prometheus text format
//! - Upstream failures map to 502

use crate::helpers::{fetcher_for, mount_report, psi_body};
use pretty_assertions::assert_eq;
use psi_exporter::api::{ApiConfig, ApiState, ExecuteResponse, spawn_api_server};
use psi_exporter::{Fetcher, Strategy};
use reqwest::StatusCode;
use serde_json::Value;
use std::net::SocketAddr;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

// Helper to create test API server on a random port
async fn spawn_test_api(fetcher: Fetcher) -> SocketAddr {
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    };

    spawn_api_server(config, ApiState::new(fetcher)).await.unwrap()
}

#[tokio::test]
async fn test_execute_then_scrape() {
    let server = MockServer::start().await;
    mount_report(
        &server,
        "https://example.com/a?b=c",
        "mobile",
        psi_body(0.81, 1100.0, 2100.0, 0.01, 90.0),
    )
    .await;
    let (fetcher, _) = fetcher_for(&server, 1);
    let addr = spawn_test_api(fetcher).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/execute"))
        .query(&[("url", "https://example.com/a?b=c"), ("strategy", "mobile")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: ExecuteResponse = response.json().await.unwrap();
    assert_eq!(body.url, "https://example.com/a?b=c");
    assert_eq!(body.strategy, Strategy::Mobile);
    assert_eq!(body.metrics.len(), 5);
    assert_eq!(body.metrics["lcp"], 2100.0);

    let response = client
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        prometheus::TEXT_FORMAT
    );
    let text = response.text().await.unwrap();
    assert!(text.contains("# TYPE psi_cumulative_layout_shift gauge"));
    assert!(text.contains(
        "psi_total_blocking_time{site=\"https://example.com/a?b=c\",strategy=\"mobile\"} 90"
    ));
}

#[tokio::test]
async fn test_execute_without_strategy_never_calls_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (fetcher, _) = fetcher_for(&server, 1);
    let addr = spawn_test_api(fetcher).await;

    let response = reqwest::get(format!("http://{addr}/execute?url=https://example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "Missing URL or strategy");
}

#[tokio::test]
async fn test_execute_reports_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;
    let (fetcher, _) = fetcher_for(&server, 2);
    let addr = spawn_test_api(fetcher).await;

    let response = reqwest::get(format!(
        "http://{addr}/execute?url=https://example.com&strategy=desktop"
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("429"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let (fetcher, _) = fetcher_for(&server, 1);
    let addr = spawn_test_api(fetcher).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}
