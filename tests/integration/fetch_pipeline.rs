//! Integration tests for the fetch pipeline
//!
//! These tests verify that:
//! - A successful report updates all five gauges of its series
//! - Server errors are retried until the API recovers
//! - Exhausted fetches leave previously published values untouched
//! - Missing audits only skip their own gauge

use crate::helpers::{API_KEY, fetcher_for, mount_report, psi_body};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use psi_exporter::{PsiMetric, Strategy, Target, psi::FetchError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_publishes_all_metrics() {
    let server = MockServer::start().await;
    mount_report(
        &server,
        "https://example.com/",
        "mobile",
        psi_body(0.87, 1200.0, 2400.0, 0.05, 150.0),
    )
    .await;
    let (fetcher, store) = fetcher_for(&server, 3);

    let report = fetcher
        .fetch(&Target::new("https://example.com/", Strategy::Mobile))
        .await
        .unwrap();

    assert_eq!(report.attempts, 1);
    assert_eq!(report.samples.len(), 5);

    let site = "https://example.com/";
    assert_eq!(store.get(PsiMetric::PerformanceScore, site, Strategy::Mobile), Some(0.87));
    assert_eq!(store.get(PsiMetric::FirstContentfulPaint, site, Strategy::Mobile), Some(1200.0));
    assert_eq!(store.get(PsiMetric::LargestContentfulPaint, site, Strategy::Mobile), Some(2400.0));
    assert_eq!(store.get(PsiMetric::CumulativeLayoutShift, site, Strategy::Mobile), Some(0.05));
    assert_eq!(store.get(PsiMetric::TotalBlockingTime, site, Strategy::Mobile), Some(150.0));

    // the other strategy is a separate series and was never fetched
    assert_eq!(store.get(PsiMetric::PerformanceScore, site, Strategy::Desktop), None);

    let text = store.encode().unwrap();
    assert!(text.contains(
        "psi_performance_score{site=\"https://example.com/\",strategy=\"mobile\"} 0.87"
    ));
}

#[tokio::test]
async fn test_fetch_recovers_after_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runPagespeed"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_report(
        &server,
        "https://example.com/",
        "desktop",
        psi_body(0.5, 900.0, 1800.0, 0.1, 300.0),
    )
    .await;
    let (fetcher, store) = fetcher_for(&server, 5);

    let report = fetcher
        .fetch_on_demand("https://example.com/", Strategy::Desktop)
        .await
        .unwrap();

    assert_eq!(report.attempts, 3);
    assert_eq!(
        store.get(PsiMetric::PerformanceScore, "https://example.com/", Strategy::Desktop),
        Some(0.5)
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_exhausted_fetch_keeps_previous_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runPagespeed"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    let (fetcher, store) = fetcher_for(&server, 3);
    let target = Target::new("https://example.com/", Strategy::Mobile);
    store.set(PsiMetric::PerformanceScore, &target, 0.42);

    let result = fetcher.fetch(&target).await;

    assert_matches!(
        result,
        Err(FetchError::Exhausted { attempts: 3, ref last }) if matches!(**last, FetchError::Status(_))
    );
    assert_eq!(
        store.get(PsiMetric::PerformanceScore, "https://example.com/", Strategy::Mobile),
        Some(0.42)
    );
}

#[tokio::test]
async fn test_malformed_body_is_a_failed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runPagespeed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>quota page</html>"))
        .expect(2)
        .mount(&server)
        .await;
    let (fetcher, store) = fetcher_for(&server, 2);

    let result = fetcher
        .fetch(&Target::new("https://example.com/", Strategy::Mobile))
        .await;

    assert_matches!(
        result,
        Err(FetchError::Exhausted { attempts: 2, ref last }) if matches!(**last, FetchError::Decode(_))
    );
    assert_eq!(
        store.get(PsiMetric::PerformanceScore, "https://example.com/", Strategy::Mobile),
        None
    );
}

#[tokio::test]
async fn test_missing_audit_keeps_its_previous_value() {
    let server = MockServer::start().await;
    let mut body = psi_body(0.9, 1000.0, 2000.0, 0.2, 100.0);
    body["lighthouseResult"]["audits"]
        .as_object_mut()
        .unwrap()
        .remove("cumulative-layout-shift");
    mount_report(&server, "https://example.com/", "mobile", body).await;
    let (fetcher, store) = fetcher_for(&server, 1);
    let target = Target::new("https://example.com/", Strategy::Mobile);
    store.set(PsiMetric::CumulativeLayoutShift, &target, 0.33);

    let report = fetcher.fetch(&target).await.unwrap();

    assert_eq!(report.samples.len(), 4);
    assert_eq!(report.value(PsiMetric::CumulativeLayoutShift), None);
    assert_eq!(
        store.get(PsiMetric::CumulativeLayoutShift, "https://example.com/", Strategy::Mobile),
        Some(0.33)
    );
    assert_eq!(
        store.get(PsiMetric::TotalBlockingTime, "https://example.com/", Strategy::Mobile),
        Some(100.0)
    );
}
