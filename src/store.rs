//! Metric store for the latest PageSpeed readings
//!
//! Each [`PsiMetric`] is backed by a Prometheus `GaugeVec` labeled by `site` and
//! `strategy`. Only the most recent value per series is kept; writes to the same series
//! are last-write-wins.
//!
//! The store owns its own [`Registry`] instead of using the process-wide default, so
//! tests and multiple exporters in one process never share state. Cloning a store is
//! cheap and every clone refers to the same gauges.

use std::fmt;

use anyhow::{Context, Result};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::target::{Strategy, Target};

/// Label names shared by every gauge
const LABELS: [&str; 2] = ["site", "strategy"];

/// The five values republished from a PageSpeed report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PsiMetric {
    PerformanceScore,
    FirstContentfulPaint,
    LargestContentfulPaint,
    CumulativeLayoutShift,
    TotalBlockingTime,
}

impl PsiMetric {
    pub const ALL: [PsiMetric; 5] = [
        PsiMetric::PerformanceScore,
        PsiMetric::FirstContentfulPaint,
        PsiMetric::LargestContentfulPaint,
        PsiMetric::CumulativeLayoutShift,
        PsiMetric::TotalBlockingTime,
    ];

    /// Exported gauge name
    pub fn name(&self) -> &'static str {
        match self {
            PsiMetric::PerformanceScore => "psi_performance_score",
            PsiMetric::FirstContentfulPaint => "psi_first_contentful_paint",
            PsiMetric::LargestContentfulPaint => "psi_largest_contentful_paint",
            PsiMetric::CumulativeLayoutShift => "psi_cumulative_layout_shift",
            PsiMetric::TotalBlockingTime => "psi_total_blocking_time",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            PsiMetric::PerformanceScore => "Performance score from PSI (0-1 scale)",
            PsiMetric::FirstContentfulPaint => "First Contentful Paint in milliseconds",
            PsiMetric::LargestContentfulPaint => "Largest Contentful Paint in milliseconds",
            PsiMetric::CumulativeLayoutShift => "Cumulative Layout Shift score",
            PsiMetric::TotalBlockingTime => "Total Blocking Time in milliseconds",
        }
    }

    /// Short key used in JSON responses
    pub fn key(&self) -> &'static str {
        match self {
            PsiMetric::PerformanceScore => "performance_score",
            PsiMetric::FirstContentfulPaint => "fcp",
            PsiMetric::LargestContentfulPaint => "lcp",
            PsiMetric::CumulativeLayoutShift => "cls",
            PsiMetric::TotalBlockingTime => "tbt",
        }
    }

    /// Lighthouse audit id the value is read from, if it comes from an audit
    pub fn audit_id(&self) -> Option<&'static str> {
        match self {
            PsiMetric::PerformanceScore => None,
            PsiMetric::FirstContentfulPaint => Some("first-contentful-paint"),
            PsiMetric::LargestContentfulPaint => Some("largest-contentful-paint"),
            PsiMetric::CumulativeLayoutShift => Some("cumulative-layout-shift"),
            PsiMetric::TotalBlockingTime => Some("total-blocking-time"),
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PsiMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thread-safe store of the latest value per (metric, site, strategy)
#[derive(Clone)]
pub struct MetricStore {
    registry: Registry,

    /// Indexed by `PsiMetric as usize`
    gauges: [GaugeVec; 5],
}

impl MetricStore {
    /// Create a store and register all five gauges in a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let gauges = [
            register_gauge(&registry, PsiMetric::PerformanceScore)?,
            register_gauge(&registry, PsiMetric::FirstContentfulPaint)?,
            register_gauge(&registry, PsiMetric::LargestContentfulPaint)?,
            register_gauge(&registry, PsiMetric::CumulativeLayoutShift)?,
            register_gauge(&registry, PsiMetric::TotalBlockingTime)?,
        ];

        Ok(Self { registry, gauges })
    }

    /// Overwrite the value of one series
    pub fn set(&self, metric: PsiMetric, target: &Target, value: f64) {
        self.gauges[metric.index()]
            .with_label_values(&[target.url.as_str(), target.strategy.as_str()])
            .set(value);
    }

    /// Read the latest value of one series, `None` if it was never written
    pub fn get(&self, metric: PsiMetric, site: &str, strategy: Strategy) -> Option<f64> {
        self.registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == metric.name())?
            .get_metric()
            .iter()
            .find(|sample| {
                let labels = sample.get_label();
                labels
                    .iter()
                    .any(|l| l.get_name() == "site" && l.get_value() == site)
                    && labels
                        .iter()
                        .any(|l| l.get_name() == "strategy" && l.get_value() == strategy.as_str())
            })
            .map(|sample| sample.get_gauge().get_value())
    }

    /// Render every series in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .context("failed to encode metrics")?;
        String::from_utf8(buffer).context("metrics output is not valid UTF-8")
    }
}

fn register_gauge(registry: &Registry, metric: PsiMetric) -> Result<GaugeVec> {
    let gauge = GaugeVec::new(Opts::new(metric.name(), metric.help()), &LABELS)
        .with_context(|| format!("failed to create gauge {metric}"))?;
    registry
        .register(Box::new(gauge.clone()))
        .with_context(|| format!("failed to register gauge {metric}"))?;
    Ok(gauge)
}

impl fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricStore")
            .field("families", &self.registry.gather().len())
            .finish()
    }
}
