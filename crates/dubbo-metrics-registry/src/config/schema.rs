use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use dubbo_metrics_core::backend::{Scope, DEFAULT_SCOPE_NAME, DEFAULT_SCOPE_VERSION};
use dubbo_metrics_core::error::{MetricsError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    pub version: u32,

    #[serde(default)]
    pub scope: ScopeSection,

    #[serde(default)]
    pub sdk: SdkConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            scope: ScopeSection::default(),
            sdk: SdkConfig::default(),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::UnsupportedVersion);
        }
        self.scope.validate()?;
        self.sdk.validate()?;
        Ok(())
    }
}

/// Instrumentation scope the registries bind their meter under.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeSection {
    #[serde(default = "default_scope_name")]
    pub name: String,

    #[serde(default = "default_scope_version")]
    pub version: String,
}

impl Default for ScopeSection {
    fn default() -> Self {
        Self {
            name: default_scope_name(),
            version: default_scope_version(),
        }
    }
}

impl ScopeSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MetricsError::BadConfig("scope.name must not be empty".into()));
        }
        if self.version.trim().is_empty() {
            return Err(MetricsError::BadConfig("scope.version must not be empty".into()));
        }
        Ok(())
    }

    pub fn to_scope(&self) -> Scope {
        Scope::new(self.name.clone(), self.version.clone())
    }
}

fn default_scope_name() -> String {
    DEFAULT_SCOPE_NAME.into()
}
fn default_scope_version() -> String {
    DEFAULT_SCOPE_VERSION.into()
}

/// Options for the SDK lifecycle wrapper.
///
/// Only `service_name` and `log_filter` are interpreted here. Any other key
/// is kept in `extra` and handed through to whatever the SDK wraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_filter: default_log_filter(),
            extra: Map::new(),
        }
    }
}

impl SdkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(MetricsError::BadConfig("sdk.service_name must not be empty".into()));
        }
        EnvFilter::try_new(&self.log_filter)
            .map_err(|e| MetricsError::BadConfig(format!("sdk.log_filter invalid: {e}")))?;
        Ok(())
    }

    /// Merge a JSON object over this config. Keys in `overrides` win;
    /// nested objects merge recursively.
    pub fn with_overrides(&self, overrides: Value) -> Result<Self> {
        if !overrides.is_object() {
            return Err(MetricsError::BadConfig("sdk overrides must be an object".into()));
        }
        let mut base = serde_json::to_value(self)
            .map_err(|e| MetricsError::Internal(format!("sdk config encode failed: {e}")))?;
        merge(&mut base, overrides);
        let merged: SdkConfig = serde_json::from_value(base)
            .map_err(|e| MetricsError::BadConfig(format!("invalid sdk overrides: {e}")))?;
        merged.validate()?;
        Ok(merged)
    }
}

fn merge(base: &mut Value, over: Value) {
    match (base, over) {
        (Value::Object(b), Value::Object(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

fn default_service_name() -> String {
    "Dubbo".into()
}
fn default_log_filter() -> String {
    "info".into()
}
