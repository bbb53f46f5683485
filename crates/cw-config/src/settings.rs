//! Typed view of the effective config. Every field has a default, so an empty
//! config is a valid one.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;

/// Env var that overrides `server.bind_addr`.
pub const ENV_BIND_ADDR_OVERRIDE: &str = "CW_DAEMON_ADDR";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub metrics: MetricsSection,
    pub sweep: SweepSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerSection {
    /// `override_addr` (normally `CW_DAEMON_ADDR`) wins when non-blank.
    pub fn effective_bind_addr(&self, override_addr: Option<&str>) -> Result<SocketAddr> {
        let raw = match override_addr.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => self.bind_addr.trim(),
        };
        raw.parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address: {raw}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// NAME of the env var holding the connection URL.
    pub url_env: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url_env: "CW_DATABASE_URL".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    pub unfinished_lookback_secs: u64,
    pub stale_lookback_secs: u64,
    pub stale_min_age_secs: u64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            unfinished_lookback_secs: 2 * 3600,
            stale_lookback_secs: 2 * 3600,
            stale_min_age_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSection {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
        }
    }
}

impl ServiceConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: ServiceConfig = serde_json::from_value(config_json.clone())
            .context("config does not match the service config shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.server.effective_bind_addr(None)?;
        if self.database.url_env.trim().is_empty() {
            bail!("CONFIG_INVALID database.url_env must name an env var");
        }
        if self.database.max_connections == 0 {
            bail!("CONFIG_INVALID database.max_connections must be >= 1");
        }
        if self.sweep.enabled && self.sweep.interval_secs == 0 {
            bail!("CONFIG_INVALID sweep.interval_secs must be >= 1 when the sweep is enabled");
        }
        if self.metrics.stale_min_age_secs >= self.metrics.stale_lookback_secs {
            bail!(
                "CONFIG_INVALID metrics.stale_min_age_secs ({}) must be below \
                 metrics.stale_lookback_secs ({})",
                self.metrics.stale_min_age_secs,
                self.metrics.stale_lookback_secs
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_yields_defaults() {
        let cfg = ServiceConfig::from_json(&json!({})).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.metrics.stale_min_age_secs, 3600);
        assert_eq!(cfg.database.url_env, "CW_DATABASE_URL");
    }

    #[test]
    fn override_wins_over_configured_addr() {
        let server = ServerSection::default();
        let addr = server.effective_bind_addr(Some("0.0.0.0:9000")).unwrap();
        assert_eq!(addr.port(), 9000);

        let addr = server.effective_bind_addr(Some("   ")).unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn inverted_stale_window_is_refused() {
        let err = ServiceConfig::from_json(&json!({
            "metrics": {"stale_lookback_secs": 600, "stale_min_age_secs": 600}
        }))
        .unwrap_err();
        assert!(format!("{err:#}").contains("stale_min_age_secs"));
    }

    #[test]
    fn wrong_type_is_a_shape_error() {
        let err = ServiceConfig::from_json(&json!({"sweep": {"enabled": "yes"}})).unwrap_err();
        assert!(format!("{err:#}").contains("service config shape"));
    }
}
