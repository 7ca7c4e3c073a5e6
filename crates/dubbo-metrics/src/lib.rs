//! Top-level facade crate for dubbo-metrics.
//!
//! Re-exports the core primitives and the registry library so users can depend on a single crate.

pub mod core {
    pub use dubbo_metrics_core::*;
}

pub mod registry {
    pub use dubbo_metrics_registry::*;
}
