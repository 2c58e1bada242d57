//! API shared state

use crate::actors::fetcher::Fetcher;
use crate::store::MetricStore;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Store rendered by the scrape endpoint
    pub store: MetricStore,

    /// Fetcher used for on-demand requests
    pub fetcher: Fetcher,
}

impl ApiState {
    /// Create API state serving the fetcher's own store
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            store: fetcher.store().clone(),
            fetcher,
        }
    }
}
