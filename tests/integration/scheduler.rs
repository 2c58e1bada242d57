//! Integration tests for scheduled sweeps
//!
//! These tests verify that:
//! - A sweep fetches every (url, strategy) pair once
//! - One failing site does not stop the rest of the sweep
//! - The startup sweep runs without waiting for a trigger minute

use crate::helpers::{fetcher_for, mount_report, psi_body};
use pretty_assertions::assert_eq;
use psi_exporter::{
    PsiMetric, SchedulerConfig, SchedulerHandle, Strategy, TriggerMinutes, expand_targets,
};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(urls: &[&str]) -> SchedulerConfig {
    let mut config = SchedulerConfig::new(expand_targets(urls), TriggerMinutes::parse(""));
    config.pacing = Duration::ZERO;
    config
}

#[tokio::test]
async fn test_sweep_now_fetches_every_target() {
    let server = MockServer::start().await;
    for url in ["https://a.com", "https://b.com"] {
        for strategy in ["mobile", "desktop"] {
            mount_report(&server, url, strategy, psi_body(0.7, 1.0, 2.0, 0.0, 3.0)).await;
        }
    }
    let (fetcher, store) = fetcher_for(&server, 1);
    let scheduler = SchedulerHandle::spawn(config(&["https://a.com", "https://b.com"]), fetcher);

    let summary = scheduler.sweep_now().await.unwrap();

    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
    for site in ["https://a.com", "https://b.com"] {
        for strategy in Strategy::ALL {
            assert_eq!(store.get(PsiMetric::PerformanceScore, site, strategy), Some(0.7));
        }
    }

    scheduler.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failing_site_does_not_abort_sweep() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runPagespeed"))
        .and(query_param("url", "https://down.com"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;
    for strategy in ["mobile", "desktop"] {
        mount_report(&server, "https://up.com", strategy, psi_body(0.9, 1.0, 2.0, 0.0, 3.0))
            .await;
    }
    let (fetcher, store) = fetcher_for(&server, 2);
    let scheduler = SchedulerHandle::spawn(config(&["https://down.com", "https://up.com"]), fetcher);

    let summary = scheduler.sweep_now().await.unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.total(), 4);
    assert_eq!(
        store.get(PsiMetric::PerformanceScore, "https://up.com", Strategy::Desktop),
        Some(0.9)
    );
    assert_eq!(
        store.get(PsiMetric::PerformanceScore, "https://down.com", Strategy::Mobile),
        None
    );
}

#[tokio::test]
async fn test_startup_sweep_runs_immediately() {
    let server = MockServer::start().await;
    for strategy in ["mobile", "desktop"] {
        mount_report(&server, "https://a.com", strategy, psi_body(0.6, 1.0, 2.0, 0.0, 3.0)).await;
    }
    let (fetcher, store) = fetcher_for(&server, 1);
    let mut config = config(&["https://a.com"]);
    config.run_on_start = true;

    let scheduler = SchedulerHandle::spawn(config, fetcher);

    tokio::time::timeout(Duration::from_secs(5), async {
        while store.get(PsiMetric::PerformanceScore, "https://a.com", Strategy::Desktop).is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("startup sweep did not publish metrics in time");

    assert_eq!(
        store.get(PsiMetric::PerformanceScore, "https://a.com", Strategy::Mobile),
        Some(0.6)
    );
    scheduler.shutdown().await.unwrap();
}
