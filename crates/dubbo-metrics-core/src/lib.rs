//! dubbo-metrics core: the per-second rate counter, attribute types, and the
//! metrics backend seam.
//!
//! This crate carries no backend of its own. The registry crate composes these
//! pieces with an injected [`backend::MeterProvider`].
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Instrumentation must never take down the process that records it, so every
//! degraded path is a silent no-op or a `Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod attributes;
pub mod backend;
pub mod error;
pub mod rate;

pub use attributes::{AttrValue, Attributes};
/// Shared result type.
pub use error::{MetricsError, Result};
pub use rate::{Clock, ManualClock, RateCounter, SystemClock};
