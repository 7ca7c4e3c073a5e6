//! dubbo-metrics registry library entry.
//!
//! This crate wires the core rate counter into a memoizing instrument
//! registry and exposes the provider/consumer request metrics built on it,
//! plus the config loader, the SDK lifecycle wrapper, and an in-memory
//! backend. It is consumed by the demo binary (`main.rs`) and by integration
//! tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod obs;
pub mod registry;
pub mod role;
pub mod sdk;

pub use registry::MetricsRegistry;
pub use role::{MetricNames, Role, RoleMetrics};
pub use sdk::Sdk;
