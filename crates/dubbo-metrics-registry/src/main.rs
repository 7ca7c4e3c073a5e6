//! dubbo-metrics demo
//!
//! Loads the config, starts the SDK, and drives provider and consumer
//! metrics over the in-memory backend for a few seconds, printing what an
//! exporter would scrape once per second.

use std::path::Path;
use std::time::Duration;

use dubbo_metrics_core::attributes::attrs;
use dubbo_metrics_core::Result;
use dubbo_metrics_registry::obs::InMemoryMeterProvider;
use dubbo_metrics_registry::{config, RoleMetrics, Sdk};

const DEFAULT_CONFIG: &str = "dubbo-metrics.yaml";
const RUN_FOR_SECS: u64 = 4;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = if Path::new(&path).exists() {
        config::load_from_file(&path)?
    } else {
        config::MetricsConfig::default()
    };

    let sdk = Sdk::new(cfg.sdk.clone());
    sdk.start()?;
    if !Path::new(&path).exists() {
        tracing::warn!(%path, "config not found; using defaults");
    }

    let backend = InMemoryMeterProvider::new();
    let scope = cfg.scope.to_scope();
    let provider = RoleMetrics::provider(&backend, scope.clone());
    let consumer = RoleMetrics::consumer(&backend, scope);

    let call = attrs([
        ("service", "org.apache.dubbo.demo.GreeterService"),
        ("method", "sayHello"),
    ]);

    let mut tick = tokio::time::interval(Duration::from_millis(50));
    let mut report = tokio::time::interval(Duration::from_secs(1));
    let deadline = tokio::time::sleep(Duration::from_secs(RUN_FOR_SECS));
    tokio::pin!(deadline);

    let mut n: u64 = 0;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tick.tick() => {
                n += 1;
                consumer.on_request(Some(&call));
                provider.on_request(Some(&call));
                if n % 7 == 0 {
                    provider.on_failed(Some(&call));
                    consumer.on_failed(Some(&call));
                } else {
                    provider.on_succeeded(Some(&call));
                    consumer.on_succeeded(Some(&call));
                }
            }
            _ = report.tick() => {
                println!("{}", backend.render());
            }
        }
    }

    tracing::info!(
        requests = n,
        provider_qps = ?provider.qps(),
        consumer_qps = ?consumer.qps(),
        "demo finished"
    );

    provider.shutdown();
    consumer.shutdown();
    sdk.shutdown();
    Ok(())
}
