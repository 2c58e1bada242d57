//! Prometheus scrape endpoint

use axum::{extract::State, http::header, response::IntoResponse};

use crate::api::{error::ApiResult, state::ApiState};

/// GET /metrics
///
/// Renders the latest value of every series in the text exposition format
pub async fn scrape(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    let body = state.store.encode()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
