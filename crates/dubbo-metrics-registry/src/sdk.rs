//! SDK lifecycle wrapper.
//!
//! Thin start/shutdown shell around process-wide telemetry setup: installs
//! the `tracing` subscriber and records the service identity. Metrics
//! registries do not depend on it; they work with or without a started SDK.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use dubbo_metrics_core::error::{MetricsError, Result};

use crate::config::SdkConfig;

pub struct Sdk {
    config: SdkConfig,
    running: AtomicBool,
}

impl Sdk {
    pub fn new(config: SdkConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Defaults with caller overrides merged on top (overrides win).
    pub fn with_overrides(overrides: Value) -> Result<Self> {
        Ok(Self::new(SdkConfig::default().with_overrides(overrides)?))
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Install logging and mark the SDK running. Calling it again is a no-op.
    ///
    /// `RUST_LOG` takes precedence over `log_filter`. If another subscriber is
    /// already installed globally, it is kept.
    pub fn start(&self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let filter = match EnvFilter::try_from_default_env() {
            Ok(f) => f,
            Err(_) => EnvFilter::try_new(&self.config.log_filter)
                .map_err(|e| MetricsError::BadConfig(format!("sdk.log_filter invalid: {e}")))?,
        };
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if fmt().with_env_filter(filter).try_init().is_err() {
            tracing::debug!("global subscriber already installed; keeping it");
        }
        tracing::info!(
            service = %self.config.service_name,
            options = self.config.extra.len(),
            "metrics sdk started"
        );
        Ok(())
    }

    /// Mark the SDK stopped. Safe to call repeatedly or before `start`.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::info!(service = %self.config.service_name, "metrics sdk stopped");
        }
    }
}

impl Default for Sdk {
    fn default() -> Self {
        Self::new(SdkConfig::default())
    }
}
