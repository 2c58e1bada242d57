//! PageSpeed Insights API access
//!
//! - [`response`]: the typed subset of the report that gets republished
//! - [`client`]: the [`PageSpeedApi`] seam and its reqwest implementation
//! - [`error`]: [`FetchError`], shared by the client and the fetcher

pub mod client;
pub mod error;
pub mod response;

pub use client::{HttpPsiClient, PageSpeedApi};
pub use error::{FetchError, FetchResult};
pub use response::PsiResponse;
