//! Request and response bodies of the HTTP API

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actors::fetcher::FetchReport;
use crate::target::Strategy;

/// Query string of `GET /execute`
///
/// Both fields are optional here so a missing parameter can be answered with a JSON
/// error instead of axum's plain-text rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteQuery {
    pub url: Option<String>,
    pub strategy: Option<String>,
}

/// Acknowledgement of a completed on-demand fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub url: String,
    pub strategy: Strategy,

    /// Attempt on which the fetch succeeded
    pub attempts: u32,

    /// Values written by this fetch, keyed by short metric name (`performance_score`,
    /// `fcp`, `lcp`, `cls`, `tbt`)
    pub metrics: BTreeMap<String, f64>,
}

impl From<FetchReport> for ExecuteResponse {
    fn from(report: FetchReport) -> Self {
        Self {
            metrics: report
                .samples
                .iter()
                .map(|(metric, value)| (metric.key().to_string(), *value))
                .collect(),
            url: report.target.url,
            strategy: report.target.strategy,
            attempts: report.attempts,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
