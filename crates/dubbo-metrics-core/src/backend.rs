//! Metrics backend seam.
//!
//! The backend owns storage, aggregation, and export. This crate only needs
//! to create two kinds of instruments and push values into them, so the seam
//! is a handful of object-safe traits. A provider is injected into the
//! registry at construction; nothing is resolved from global state.

use std::sync::Arc;

use crate::attributes::Attributes;
use crate::error::Result;

/// Instrumentation scope: identifies which component registered a metric.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope {
    pub name: String,
    pub version: String,
}

pub const DEFAULT_SCOPE_NAME: &str = "dubbo-js";
pub const DEFAULT_SCOPE_VERSION: &str = "0.0.1";

impl Scope {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new(DEFAULT_SCOPE_NAME, DEFAULT_SCOPE_VERSION)
    }
}

/// Descriptive options passed through to the backend on instrument creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentOptions {
    pub description: Option<String>,
    pub unit: Option<String>,
}

impl InstrumentOptions {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Value producer polled by the backend.
///
/// The backend may call this from any thread, at any cadence, concurrently
/// with every other operation. Implementations must only read state.
pub type ObserveCallback = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Monotonic counter handle.
pub trait Counter: Send + Sync {
    fn add(&self, delta: u64, attrs: &Attributes);
}

/// Counter whose value is sampled from registered callbacks.
pub trait ObservableCounter: Send + Sync {
    fn register_callback(&self, callback: ObserveCallback);
}

/// Meter bound to one instrumentation scope.
pub trait Meter: Send + Sync {
    fn create_counter(&self, name: &str, opts: &InstrumentOptions) -> Result<Arc<dyn Counter>>;

    fn create_observable_counter(
        &self,
        name: &str,
        opts: &InstrumentOptions,
    ) -> Result<Arc<dyn ObservableCounter>>;
}

/// Entry point of a backend. Returns `None` when no meter can be bound.
pub trait MeterProvider: Send + Sync {
    fn meter(&self, scope: &Scope) -> Option<Arc<dyn Meter>>;
}

/// Provider for headless operation: never binds a meter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMeterProvider;

impl MeterProvider for NoopMeterProvider {
    fn meter(&self, _scope: &Scope) -> Option<Arc<dyn Meter>> {
        None
    }
}
