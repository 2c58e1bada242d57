//! Fetch and scheduling core
//!
//! ## Architecture Overview
//!
//! ```text
//!     SchedulerHandle ──commands──→ SchedulerActor (minute loop)
//!            │                            │
//!            └── startup sweep task       │ sweep
//!                        │                │
//!                        └──────┬─────────┘
//!                               ▼
//!                 Fetcher ←──── /execute (on-demand)
//!                    │
//!                    ▼
//!               MetricStore ──→ /metrics
//! ```
//!
//! - **Fetcher**: one measurement for one target, with exponential backoff
//! - **SchedulerActor**: sweeps every target at the configured minutes of the hour
//!
//! The startup sweep, the minute loop and on-demand fetches run concurrently. The only
//! state they share is the [`MetricStore`](crate::store::MetricStore), which is
//! internally synchronized.

pub mod fetcher;
pub mod messages;
pub mod scheduler;
