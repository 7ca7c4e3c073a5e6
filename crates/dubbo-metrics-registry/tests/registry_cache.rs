//! Handle memoization and degraded-backend behaviour.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use dubbo_metrics_core::attributes::EMPTY;
use dubbo_metrics_core::backend::{InstrumentOptions, NoopMeterProvider, Scope};
use dubbo_metrics_registry::obs::InMemoryMeterProvider;
use dubbo_metrics_registry::MetricsRegistry;

fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[test]
fn meter_is_bound_once_for_the_scope() {
    let backend = InMemoryMeterProvider::new();
    let reg = MetricsRegistry::new(&backend, Scope::default());
    assert!(reg.has_meter());
    assert_eq!(reg.scope().name, "dubbo-js");
    assert_eq!(reg.scope().version, "0.0.1");

    let opts = InstrumentOptions::default();
    reg.counter("a", &opts);
    reg.counter("b", &opts);
    assert_eq!(backend.meters_bound(), 1);
}

#[test]
fn same_name_returns_the_cached_handle() {
    let backend = InMemoryMeterProvider::new();
    let reg = MetricsRegistry::new(&backend, Scope::default());
    let opts = InstrumentOptions::default().with_unit("{request}");

    let a = reg.counter("requests_total", &opts).unwrap();
    let b = reg.counter("requests_total", &opts).unwrap();
    assert!(same(&a, &b));
    assert_eq!(backend.registrations(&Scope::default(), "requests_total"), 1);
    assert_eq!(reg.cached(), 1);

    a.add(2, &EMPTY);
    b.add(3, &EMPTY);
    assert_eq!(backend.counter_total(&Scope::default(), "requests_total"), Some(5));
}

#[test]
fn kinds_are_cached_separately() {
    let backend = InMemoryMeterProvider::new();
    let reg = MetricsRegistry::new(&backend, Scope::default());
    let opts = InstrumentOptions::default();

    assert!(reg.counter("qps", &opts).is_some());
    assert!(reg.observable_counter("qps", &opts).is_some());
    assert!(reg.observable_counter("qps", &opts).is_some());
    assert_eq!(reg.cached(), 2);
    assert_eq!(backend.registrations(&Scope::default(), "qps"), 2);
}

#[test]
fn headless_registry_returns_none() {
    let reg = MetricsRegistry::new(&NoopMeterProvider, Scope::default());
    let opts = InstrumentOptions::default();
    assert!(!reg.has_meter());
    assert!(reg.counter("requests_total", &opts).is_none());
    assert!(reg.observable_counter("qps", &opts).is_none());
    assert_eq!(reg.cached(), 0);

    let backend = InMemoryMeterProvider::unavailable();
    let reg = MetricsRegistry::new(&backend, Scope::default());
    assert!(reg.counter("requests_total", &opts).is_none());
    assert_eq!(backend.meters_bound(), 0);
}

#[test]
fn failed_creation_is_not_cached_and_is_retried() {
    let backend = InMemoryMeterProvider::new();
    let reg = MetricsRegistry::new(&backend, Scope::default());
    let opts = InstrumentOptions::default();

    backend.set_fail_creation(true);
    assert!(reg.counter("requests_total", &opts).is_none());
    assert!(reg.observable_counter("qps", &opts).is_none());
    assert_eq!(reg.cached(), 0);

    backend.set_fail_creation(false);
    assert!(reg.counter("requests_total", &opts).is_some());
    assert_eq!(backend.registrations(&Scope::default(), "requests_total"), 1);
    assert_eq!(reg.cached(), 1);
}

#[test]
fn shutdown_drops_handles_and_is_idempotent() {
    let backend = InMemoryMeterProvider::new();
    let reg = MetricsRegistry::new(&backend, Scope::default());
    let opts = InstrumentOptions::default();
    reg.counter("requests_total", &opts).unwrap();

    reg.shutdown();
    assert!(reg.is_shut_down());
    assert_eq!(reg.cached(), 0);

    reg.shutdown();
    assert!(reg.is_shut_down());
    assert_eq!(reg.cached(), 0);
    assert!(reg.counter("requests_total", &opts).is_none());
    assert_eq!(backend.registrations(&Scope::default(), "requests_total"), 1);
}

#[test]
fn concurrent_first_lookups_register_once() {
    let backend = InMemoryMeterProvider::new();
    let reg = Arc::new(MetricsRegistry::new(&backend, Scope::default()));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || {
                let opts = InstrumentOptions::default();
                for _ in 0..100 {
                    reg.counter("requests_total", &opts).unwrap().add(1, &EMPTY);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(backend.registrations(&Scope::default(), "requests_total"), 1);
    assert_eq!(backend.counter_total(&Scope::default(), "requests_total"), Some(800));
}
