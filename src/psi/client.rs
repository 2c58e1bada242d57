//! HTTP client for the PageSpeed Insights API

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::trace;

use crate::target::Target;
use crate::util::PSI_ENDPOINT;

use super::error::{FetchError, FetchResult};
use super::response::PsiResponse;

/// One measurement call against the PageSpeed API
///
/// The fetcher only talks to the API through this trait, so the transport can be
/// replaced in tests.
#[async_trait]
pub trait PageSpeedApi: Send + Sync {
    /// Run a single measurement, without retries
    async fn run_pagespeed(&self, target: &Target) -> FetchResult<PsiResponse>;
}

/// reqwest-backed [`PageSpeedApi`]
#[derive(Clone)]
pub struct HttpPsiClient {
    /// HTTP client (reused across requests)
    client: reqwest::Client,

    /// Full URL of the `runPagespeed` endpoint
    endpoint: String,

    api_key: String,
}

impl HttpPsiClient {
    /// Create a client for the public PageSpeed endpoint
    ///
    /// `timeout` bounds every single call, including reading the body.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: PSI_ENDPOINT.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Point the client at a different endpoint (mock servers, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl std::fmt::Debug for HttpPsiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPsiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl PageSpeedApi for HttpPsiClient {
    async fn run_pagespeed(&self, target: &Target) -> FetchResult<PsiResponse> {
        trace!("requesting {} for {target}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", target.url.as_str()),
                ("strategy", target.strategy.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        let report = PsiResponse::from_slice(&body)?;

        trace!("decoded PageSpeed report for {target}");

        Ok(report)
    }
}
