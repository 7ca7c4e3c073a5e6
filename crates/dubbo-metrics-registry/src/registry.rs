//! Memoizing instrument registry.
//!
//! Binds one meter for its instrumentation scope at construction and hands
//! out instrument handles on demand. Each `(kind, name)` pair is created at
//! most once against the backend; later calls return the cached `Arc`.
//!
//! Every lookup degrades to `None` instead of failing: no bound meter, a
//! backend error, or a shut-down registry all read as "instrument absent", so
//! callers only need an `if let`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use dubbo_metrics_core::backend::{
    Counter, InstrumentOptions, Meter, MeterProvider, ObservableCounter, Scope,
};
use dubbo_metrics_core::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Counter,
    ObservableCounter,
}

impl Kind {
    fn as_str(self) -> &'static str {
        match self {
            Kind::Counter => "counter",
            Kind::ObservableCounter => "observable-counter",
        }
    }

    fn cache_key(self, name: &str) -> String {
        format!("{}-{}", self.as_str(), name)
    }
}

#[derive(Clone)]
enum Handle {
    Counter(Arc<dyn Counter>),
    Observable(Arc<dyn ObservableCounter>),
}

pub struct MetricsRegistry {
    scope: Scope,
    meter: Option<Arc<dyn Meter>>,
    cache: DashMap<String, Handle>,
    closed: AtomicBool,
}

impl MetricsRegistry {
    /// Bind a meter for `scope` from the injected provider.
    pub fn new(provider: &dyn MeterProvider, scope: Scope) -> Self {
        let meter = provider.meter(&scope);
        if meter.is_none() {
            tracing::warn!(
                scope = %scope.name,
                version = %scope.version,
                "no meter bound; metrics disabled"
            );
        }
        Self {
            scope,
            meter,
            cache: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Whether a backend meter was bound at construction.
    pub fn has_meter(&self) -> bool {
        self.meter.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of cached handles.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Cumulative counter `name`, created on first request.
    pub fn counter(&self, name: &str, opts: &InstrumentOptions) -> Option<Arc<dyn Counter>> {
        let handle = self.get_or_create(Kind::Counter, name, |m| {
            m.create_counter(name, opts).map(Handle::Counter)
        })?;
        match handle {
            Handle::Counter(c) => Some(c),
            Handle::Observable(_) => None,
        }
    }

    /// Observable counter `name`, created on first request.
    pub fn observable_counter(
        &self,
        name: &str,
        opts: &InstrumentOptions,
    ) -> Option<Arc<dyn ObservableCounter>> {
        let handle = self.get_or_create(Kind::ObservableCounter, name, |m| {
            m.create_observable_counter(name, opts).map(Handle::Observable)
        })?;
        match handle {
            Handle::Observable(o) => Some(o),
            Handle::Counter(_) => None,
        }
    }

    /// Drop every cached handle. Later lookups return `None`.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cache.clear();
        tracing::debug!(scope = %self.scope.name, "metrics registry shut down");
    }

    fn get_or_create<F>(&self, kind: Kind, name: &str, create: F) -> Option<Handle>
    where
        F: FnOnce(&dyn Meter) -> Result<Handle>,
    {
        if self.is_shut_down() {
            return None;
        }
        let meter = self.meter.as_deref()?;

        // Creation runs under the shard lock so concurrent first calls
        // register with the backend only once.
        match self.cache.entry(kind.cache_key(name)) {
            Entry::Occupied(e) => Some(e.get().clone()),
            Entry::Vacant(v) => match create(meter) {
                Ok(handle) => {
                    tracing::debug!(kind = kind.as_str(), %name, "instrument registered");
                    v.insert(handle.clone());
                    Some(handle)
                }
                Err(e) => {
                    tracing::warn!(
                        kind = kind.as_str(),
                        %name,
                        error = %e,
                        "instrument creation failed"
                    );
                    None
                }
            },
        }
    }
}
