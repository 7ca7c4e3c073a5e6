//! Provider/consumer request metrics.
//!
//! One component serves both sides of a call; the `Role` only decides metric
//! names and the event label used in logs. Each instance owns:
//! - a [`MetricsRegistry`] for the four fixed instruments,
//! - at most one [`RateCounter`], built on the first request event and
//!   wired into the qps observable counter exactly once.
//!
//! If no request ever arrives, no rate counter exists and the qps instrument
//! reports nothing at all (absent, not zero).

use std::sync::{Arc, OnceLock};

use dubbo_metrics_core::attributes::{Attributes, EMPTY};
use dubbo_metrics_core::backend::{InstrumentOptions, MeterProvider, Scope};
use dubbo_metrics_core::rate::{Clock, RateCounter, SystemClock};

use crate::registry::MetricsRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Provider,
    Consumer,
}

impl Role {
    /// Metric name prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            Role::Provider => "dubbo_provider",
            Role::Consumer => "dubbo_consumer",
        }
    }

    /// Name of the event that counts as a request on this side.
    pub fn request_event(self) -> &'static str {
        match self {
            Role::Provider => "provider_request",
            Role::Consumer => "consumer_request",
        }
    }

    pub fn metric_names(self) -> MetricNames {
        let p = self.prefix();
        MetricNames {
            requests: format!("{p}_requests_total"),
            succeeded: format!("{p}_requests_succeeded_total"),
            failed: format!("{p}_requests_failed_total"),
            qps: format!("{p}_qps"),
        }
    }
}

/// The four instrument names owned by a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNames {
    pub requests: String,
    pub succeeded: String,
    pub failed: String,
    pub qps: String,
}

struct Instruments {
    requests: InstrumentOptions,
    succeeded: InstrumentOptions,
    failed: InstrumentOptions,
    qps: InstrumentOptions,
}

impl Instruments {
    fn for_role(role: Role) -> Self {
        let side = match role {
            Role::Provider => "served",
            Role::Consumer => "sent",
        };
        Self {
            requests: InstrumentOptions::default()
                .with_description(format!("Total requests {side}"))
                .with_unit("{request}"),
            succeeded: InstrumentOptions::default()
                .with_description(format!("Requests {side} successfully"))
                .with_unit("{request}"),
            failed: InstrumentOptions::default()
                .with_description(format!("Requests {side} that failed"))
                .with_unit("{request}"),
            qps: InstrumentOptions::default()
                .with_description(format!("Requests {side} during the last completed second"))
                .with_unit("{request}/s"),
        }
    }
}

pub struct RoleMetrics {
    role: Role,
    names: MetricNames,
    instruments: Instruments,
    registry: MetricsRegistry,
    clock: Arc<dyn Clock>,
    rate: OnceLock<Arc<RateCounter>>,
}

impl RoleMetrics {
    /// Build metrics for `role` and register all four instruments up front.
    pub fn new(role: Role, provider: &dyn MeterProvider, scope: Scope) -> Self {
        Self::with_clock(role, provider, scope, Arc::new(SystemClock))
    }

    pub fn provider(provider: &dyn MeterProvider, scope: Scope) -> Self {
        Self::new(Role::Provider, provider, scope)
    }

    pub fn consumer(provider: &dyn MeterProvider, scope: Scope) -> Self {
        Self::new(Role::Consumer, provider, scope)
    }

    /// Same as [`RoleMetrics::new`] with an explicit clock for the rate counter.
    pub fn with_clock(
        role: Role,
        provider: &dyn MeterProvider,
        scope: Scope,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let this = Self {
            role,
            names: role.metric_names(),
            instruments: Instruments::for_role(role),
            registry: MetricsRegistry::new(provider, scope),
            clock,
            rate: OnceLock::new(),
        };
        this.register_all();
        this
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn names(&self) -> &MetricNames {
        &self.names
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// A request happened on this side of the call.
    pub fn on_request(&self, attrs: Option<&Attributes>) {
        if self.registry.is_shut_down() {
            return;
        }
        if let Some(c) = self
            .registry
            .counter(&self.names.requests, &self.instruments.requests)
        {
            c.add(1, attrs.unwrap_or(&EMPTY));
        }
        self.rate
            .get_or_init(|| self.install_rate_counter())
            .increment();
    }

    pub fn on_succeeded(&self, attrs: Option<&Attributes>) {
        if let Some(c) = self
            .registry
            .counter(&self.names.succeeded, &self.instruments.succeeded)
        {
            c.add(1, attrs.unwrap_or(&EMPTY));
        }
    }

    pub fn on_failed(&self, attrs: Option<&Attributes>) {
        if let Some(c) = self
            .registry
            .counter(&self.names.failed, &self.instruments.failed)
        {
            c.add(1, attrs.unwrap_or(&EMPTY));
        }
    }

    /// Rate of the last completed second, or `None` before the first request.
    pub fn qps(&self) -> Option<u64> {
        self.rate.get().map(|r| r.rate())
    }

    /// The rate counter, once the first request has installed it.
    pub fn rate_counter(&self) -> Option<&Arc<RateCounter>> {
        self.rate.get()
    }

    /// Release cached handles and stop the rate counter's sweep. Idempotent.
    pub fn shutdown(&self) {
        self.registry.shutdown();
        if let Some(r) = self.rate.get() {
            r.stop();
        }
    }

    fn register_all(&self) {
        let reg = &self.registry;
        let ok = [
            reg.counter(&self.names.requests, &self.instruments.requests).is_some(),
            reg.counter(&self.names.succeeded, &self.instruments.succeeded).is_some(),
            reg.counter(&self.names.failed, &self.instruments.failed).is_some(),
            reg.observable_counter(&self.names.qps, &self.instruments.qps).is_some(),
        ];
        let registered = ok.iter().filter(|b| **b).count();
        tracing::debug!(role = self.role.prefix(), registered, "role instruments registered");
    }

    fn install_rate_counter(&self) -> Arc<RateCounter> {
        let counter = Arc::new(RateCounter::with_clock(Arc::clone(&self.clock)));
        if let Some(qps) = self
            .registry
            .observable_counter(&self.names.qps, &self.instruments.qps)
        {
            let reader = Arc::clone(&counter);
            qps.register_callback(Arc::new(move || reader.rate()));
        }
        tracing::debug!(
            role = self.role.prefix(),
            event = self.role.request_event(),
            "rate counter installed"
        );
        counter
    }
}

impl Drop for RoleMetrics {
    fn drop(&mut self) {
        self.shutdown();
    }
}
