//! Typed subset of the PageSpeed Insights v5 response
//!
//! Only the fields the exporter republishes are modelled. The structural fields
//! (`lighthouseResult`, `categories.performance.score`, `audits`) are required and a
//! response lacking them fails to decode, and so does one where any of them is not a
//! JSON object. Individual audits are lenient: a missing audit, a non-object audit or a
//! non-numeric `numericValue` decodes to `None`.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::store::PsiMetric;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsiResponse {
    #[serde(deserialize_with = "object")]
    pub lighthouse_result: LighthouseResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LighthouseResult {
    #[serde(deserialize_with = "object")]
    pub categories: Categories,

    #[serde(deserialize_with = "object")]
    pub audits: Audits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Categories {
    #[serde(deserialize_with = "object")]
    pub performance: PerformanceCategory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceCategory {
    pub score: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Audits {
    #[serde(
        rename = "first-contentful-paint",
        default,
        deserialize_with = "numeric_value"
    )]
    pub first_contentful_paint: Option<f64>,

    #[serde(
        rename = "largest-contentful-paint",
        default,
        deserialize_with = "numeric_value"
    )]
    pub largest_contentful_paint: Option<f64>,

    #[serde(
        rename = "cumulative-layout-shift",
        default,
        deserialize_with = "numeric_value"
    )]
    pub cumulative_layout_shift: Option<f64>,

    #[serde(
        rename = "total-blocking-time",
        default,
        deserialize_with = "numeric_value"
    )]
    pub total_blocking_time: Option<f64>,
}

/// Decode `T` only from a JSON object
///
/// Derived struct deserializers also accept arrays, which would let `[0.9]` pass as a
/// performance category.
fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Err(D::Error::custom(format!(
            "expected a JSON object, found {}",
            json_type(&value)
        )));
    }
    T::deserialize(value).map_err(D::Error::custom)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Accept any JSON for an audit and keep `numericValue` only if it is a number
fn numeric_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let audit = Value::deserialize(deserializer)?;
    Ok(audit.get("numericValue").and_then(Value::as_f64))
}

impl PsiResponse {
    /// Decode a raw response body, which must itself be a JSON object
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        object(value)
    }

    /// Value of a single metric, `None` if the audit carried no usable number
    pub fn reading(&self, metric: PsiMetric) -> Option<f64> {
        let result = &self.lighthouse_result;
        match metric {
            PsiMetric::PerformanceScore => Some(result.categories.performance.score),
            PsiMetric::FirstContentfulPaint => result.audits.first_contentful_paint,
            PsiMetric::LargestContentfulPaint => result.audits.largest_contentful_paint,
            PsiMetric::CumulativeLayoutShift => result.audits.cumulative_layout_shift,
            PsiMetric::TotalBlockingTime => result.audits.total_blocking_time,
        }
    }

    /// Every metric paired with its reading
    pub fn readings(&self) -> [(PsiMetric, Option<f64>); 5] {
        PsiMetric::ALL.map(|metric| (metric, self.reading(metric)))
    }
}
