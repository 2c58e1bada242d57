//! PageSpeed Insights exporter
//!
//! Periodically measures a set of URLs with the PageSpeed Insights API and republishes
//! the performance score and the Core Web Vitals as Prometheus gauges.

pub mod actors;
pub mod api;
pub mod config;
pub mod psi;
pub mod store;
pub mod target;
pub mod util;

pub use actors::fetcher::{FetchReport, Fetcher, RetryPolicy};
pub use actors::scheduler::{SchedulerConfig, SchedulerHandle, TriggerMinutes};
pub use store::{MetricStore, PsiMetric};
pub use target::{Strategy, Target, expand_targets};
