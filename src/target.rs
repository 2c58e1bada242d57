//! Monitoring targets
//!
//! A [`Target`] is one (URL, strategy) pair the exporter measures. Targets are built once
//! at startup by [`expand_targets`] and never change afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Measurement profile used by the PageSpeed API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    /// Every strategy, in the order targets are expanded
    pub const ALL: [Strategy; 2] = [Strategy::Mobile, Strategy::Desktop];

    /// Get the string representation (lowercase)
    ///
    /// This matches both the serde format and the API's `strategy` query value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a strategy string is neither `mobile` nor `desktop`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrategyError(String);

impl fmt::Display for ParseStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown strategy '{}' (expected 'mobile' or 'desktop')",
            self.0
        )
    }
}

impl std::error::Error for ParseStrategyError {}

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(Strategy::Mobile),
            "desktop" => Ok(Strategy::Desktop),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// A single URL measured with a single strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    pub strategy: Strategy,
}

impl Target {
    pub fn new(url: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            url: url.into(),
            strategy,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.strategy)
    }
}

/// Expand raw URLs into one target per URL and strategy
///
/// URLs are trimmed and blank entries dropped. Input order is preserved and each URL
/// yields its mobile target before its desktop target.
pub fn expand_targets<I, S>(urls: I) -> Vec<Target>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    urls.into_iter()
        .filter_map(|url| {
            let url = url.as_ref().trim();
            (!url.is_empty()).then(|| url.to_string())
        })
        .flat_map(|url| {
            Strategy::ALL
                .into_iter()
                .map(move |strategy| Target::new(url.clone(), strategy))
        })
        .collect()
}

/// Split a comma separated URL list and expand it
pub fn expand_url_list(list: &str) -> Vec<Target> {
    expand_targets(list.split(','))
}
