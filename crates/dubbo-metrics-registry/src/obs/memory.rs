//! In-memory metrics backend.
//!
//! Counters keep one `AtomicU64` per label set. Labels are flattened into
//! sorted key vectors to keep deterministic ordering. Observable counters hold
//! their callbacks and are only sampled by [`InMemoryMeterProvider::collect`]
//! or [`InMemoryMeterProvider::render`], standing in for an exporter's poll.
//!
//! Every instrument is keyed by `(scope, name)`: meters bound under different
//! instrumentation scopes never share storage, even for equal names.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use dubbo_metrics_core::attributes::{label_pairs, Attributes};
use dubbo_metrics_core::backend::{
    Counter, InstrumentOptions, Meter, MeterProvider, ObservableCounter, ObserveCallback, Scope,
};
use dubbo_metrics_core::{MetricsError, Result};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Instruments are owned by the scope that created them.
pub type InstrumentKey = (Scope, String);

fn key(scope: &Scope, name: &str) -> InstrumentKey {
    (scope.clone(), name.to_string())
}

fn scope_labels(scope: &Scope) -> String {
    label_str(&[
        ("otel_scope_name".to_string(), scope.name.clone()),
        ("otel_scope_version".to_string(), scope.version.clone()),
    ])
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Add to the series for an already-sorted label key.
    pub fn add(&self, key: Vec<(String, String)>, v: u64) {
        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, key: &[(String, String)]) -> u64 {
        self.map
            .get(key)
            .map(|c| c.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Sum across all label sets.
    pub fn total(&self) -> u64 {
        self.map
            .iter()
            .map(|r| r.value().load(Ordering::Relaxed))
            .sum()
    }

    /// Render sample lines in Prometheus text format, scope labels first.
    fn render(&self, name: &str, scope: &Scope, out: &mut String) {
        let scope_part = scope_labels(scope);
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| (label_str(r.key()), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (labels, val) in rows {
            if labels.is_empty() {
                let _ = writeln!(out, "{}{{{}}} {}", name, scope_part, val);
            } else {
                let _ = writeln!(out, "{}{{{},{}}} {}", name, scope_part, labels, val);
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryCounter {
    series: CounterVec,
}

impl Counter for MemoryCounter {
    fn add(&self, delta: u64, attrs: &Attributes) {
        self.series.add(label_pairs(attrs), delta);
    }
}

#[derive(Default)]
pub struct MemoryObservableCounter {
    callbacks: RwLock<Vec<ObserveCallback>>,
}

impl MemoryObservableCounter {
    /// Sample every callback. `None` when nothing is registered.
    fn poll(&self) -> Option<u64> {
        let cbs = self.callbacks.read().ok()?;
        if cbs.is_empty() {
            return None;
        }
        Some(cbs.iter().map(|cb| cb()).sum())
    }

    fn len(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl ObservableCounter for MemoryObservableCounter {
    fn register_callback(&self, callback: ObserveCallback) {
        if let Ok(mut cbs) = self.callbacks.write() {
            cbs.push(callback);
        }
    }
}

#[derive(Default)]
struct Shared {
    unavailable: bool,
    fail_creation: AtomicBool,
    meters_bound: AtomicU64,
    counters: DashMap<InstrumentKey, Arc<MemoryCounter>>,
    observables: DashMap<InstrumentKey, Arc<MemoryObservableCounter>>,
    registrations: DashMap<InstrumentKey, AtomicU64>,
}

impl Shared {
    fn check_create(&self, scope: &Scope, name: &str) -> Result<()> {
        if self.fail_creation.load(Ordering::Relaxed) {
            return Err(MetricsError::Instrument {
                name: name.to_string(),
                reason: "creation disabled".into(),
            });
        }
        self.registrations
            .entry(key(scope, name))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

struct InMemoryMeter {
    scope: Scope,
    shared: Arc<Shared>,
}

impl Meter for InMemoryMeter {
    fn create_counter(&self, name: &str, _opts: &InstrumentOptions) -> Result<Arc<dyn Counter>> {
        self.shared.check_create(&self.scope, name)?;
        tracing::trace!(scope = %self.scope.name, %name, "memory counter created");
        let c = Arc::clone(
            self.shared
                .counters
                .entry(key(&self.scope, name))
                .or_default()
                .value(),
        );
        Ok(c as Arc<dyn Counter>)
    }

    fn create_observable_counter(
        &self,
        name: &str,
        _opts: &InstrumentOptions,
    ) -> Result<Arc<dyn ObservableCounter>> {
        self.shared.check_create(&self.scope, name)?;
        tracing::trace!(scope = %self.scope.name, %name, "memory observable counter created");
        let o = Arc::clone(
            self.shared
                .observables
                .entry(key(&self.scope, name))
                .or_default()
                .value(),
        );
        Ok(o as Arc<dyn ObservableCounter>)
    }
}

/// Process-local backend. Cloning shares the same storage.
#[derive(Clone, Default)]
pub struct InMemoryMeterProvider {
    shared: Arc<Shared>,
}

impl InMemoryMeterProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that never binds a meter.
    pub fn unavailable() -> Self {
        Self {
            shared: Arc::new(Shared {
                unavailable: true,
                ..Shared::default()
            }),
        }
    }

    /// Make every subsequent instrument creation fail (or succeed again).
    pub fn set_fail_creation(&self, fail: bool) {
        self.shared.fail_creation.store(fail, Ordering::Relaxed);
    }

    /// How many meters have been bound.
    pub fn meters_bound(&self) -> u64 {
        self.shared.meters_bound.load(Ordering::Relaxed)
    }

    /// How many times `scope` created an instrument named `name`.
    pub fn registrations(&self, scope: &Scope, name: &str) -> u64 {
        self.shared
            .registrations
            .get(&key(scope, name))
            .map(|r| r.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Counter sum across label sets; `None` if `scope` never created it.
    pub fn counter_total(&self, scope: &Scope, name: &str) -> Option<u64> {
        self.shared
            .counters
            .get(&key(scope, name))
            .map(|c| c.series.total())
    }

    /// Counter value for one exact attribute set.
    pub fn counter_value(&self, scope: &Scope, name: &str, attrs: &Attributes) -> u64 {
        self.shared
            .counters
            .get(&key(scope, name))
            .map(|c| c.series.get(&label_pairs(attrs)))
            .unwrap_or(0)
    }

    /// Callbacks registered on observable counter `name` of `scope`.
    pub fn callbacks(&self, scope: &Scope, name: &str) -> usize {
        self.shared
            .observables
            .get(&key(scope, name))
            .map(|o| o.len())
            .unwrap_or(0)
    }

    /// Poll one observable counter. `None` if absent or without callbacks.
    pub fn observed(&self, scope: &Scope, name: &str) -> Option<u64> {
        let o = self
            .shared
            .observables
            .get(&key(scope, name))
            .map(|r| Arc::clone(r.value()))?;
        o.poll()
    }

    /// Poll every observable counter. Instruments without a callback are
    /// left out.
    pub fn collect(&self) -> BTreeMap<InstrumentKey, u64> {
        let observables: Vec<(InstrumentKey, Arc<MemoryObservableCounter>)> = self
            .shared
            .observables
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        // Callbacks run outside the map guards.
        observables
            .into_iter()
            .filter_map(|(k, o)| o.poll().map(|v| (k, v)))
            .collect()
    }

    /// Render counters and sampled observables as Prometheus-style text.
    /// Each sample carries `otel_scope_name` / `otel_scope_version` labels.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let mut counters: Vec<(InstrumentKey, Arc<MemoryCounter>)> = self
            .shared
            .counters
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        counters.sort_by(|(a, _), (b, _)| (&a.1, &a.0).cmp(&(&b.1, &b.0)));
        let mut last: Option<String> = None;
        for ((scope, name), c) in counters {
            if last.as_deref() != Some(name.as_str()) {
                let _ = writeln!(out, "# TYPE {} counter", name);
                last = Some(name.clone());
            }
            c.series.render(&name, &scope, &mut out);
        }

        // Sampled values go up and down, so they are exposed as gauges.
        let mut sampled: Vec<(InstrumentKey, u64)> = self.collect().into_iter().collect();
        sampled.sort_by(|(a, _), (b, _)| (&a.1, &a.0).cmp(&(&b.1, &b.0)));
        let mut last: Option<String> = None;
        for ((scope, name), v) in sampled {
            if last.as_deref() != Some(name.as_str()) {
                let _ = writeln!(out, "# TYPE {} gauge", name);
                last = Some(name.clone());
            }
            let _ = writeln!(out, "{}{{{}}} {}", name, scope_labels(&scope), v);
        }
        out
    }
}

impl MeterProvider for InMemoryMeterProvider {
    fn meter(&self, scope: &Scope) -> Option<Arc<dyn Meter>> {
        if self.shared.unavailable {
            return None;
        }
        self.shared.meters_bound.fetch_add(1, Ordering::Relaxed);
        Some(Arc::new(InMemoryMeter {
            scope: scope.clone(),
            shared: Arc::clone(&self.shared),
        }))
    }
}
