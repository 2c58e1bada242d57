//! On-demand fetch endpoint

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::info;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{ExecuteQuery, ExecuteResponse},
};
use crate::target::Strategy;

/// GET /execute?url=...&strategy=mobile|desktop
///
/// Runs one fetch for the given target, retries included, and answers once it is done.
/// Parameters are validated before anything is sent to the PageSpeed API. The fetch runs
/// in its own task and completes even if the caller disconnects.
pub async fn execute(
    State(state): State<ApiState>,
    Query(query): Query<ExecuteQuery>,
) -> ApiResult<Json<ExecuteResponse>> {
    let url = query.url.as_deref().map(str::trim).unwrap_or_default();
    let strategy = query.strategy.as_deref().map(str::trim).unwrap_or_default();

    if url.is_empty() || strategy.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Missing URL or strategy".to_string(),
        ));
    }

    let strategy: Strategy = strategy
        .parse()
        .map_err(|e| ApiError::InvalidRequest(format!("{e}")))?;

    info!("on-demand fetch requested for {url} ({strategy})");

    // detached so a caller hanging up does not abort the retry sequence
    let fetcher = state.fetcher.clone();
    let url = url.to_string();
    let report = tokio::spawn(async move { fetcher.fetch_on_demand(url, strategy).await })
        .await
        .map_err(|e| ApiError::Internal(format!("on-demand fetch task failed: {e}")))??;

    Ok(Json(report.into()))
}
