//! Error types for PageSpeed fetches

use std::fmt;

use reqwest::StatusCode;

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while fetching a PageSpeed report
///
/// Every variant except [`FetchError::Exhausted`] is transient and retried by the
/// fetcher.
#[derive(Debug)]
pub enum FetchError {
    /// Connection failure, timeout or body read error
    Request(reqwest::Error),

    /// The API answered with a non-success status
    Status(StatusCode),

    /// The body is not JSON or lacks the required structure
    Decode(serde_json::Error),

    /// Every attempt failed; carries the last failure
    Exhausted {
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Request(err) if err.is_timeout() => {
                write!(f, "PageSpeed request timed out: {}", err)
            }
            FetchError::Request(err) => write!(f, "PageSpeed request failed: {}", err),
            FetchError::Status(status) => write!(f, "PageSpeed API returned {}", status),
            FetchError::Decode(err) => write!(f, "invalid PageSpeed response: {}", err),
            FetchError::Exhausted { attempts, last } => {
                write!(f, "giving up after {} attempts: {}", attempts, last)
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Request(err) => Some(err),
            FetchError::Decode(err) => Some(err),
            FetchError::Exhausted { last, .. } => Some(last.as_ref()),
            FetchError::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Request(err)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err)
    }
}
