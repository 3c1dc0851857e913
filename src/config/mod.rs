use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_TTL_SECS: u64 = 600;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Upper bound on the sweep cadence — expired entries must never linger more
/// than five minutes past a sweep opportunity, whatever the config says.
const MAX_SWEEP_INTERVAL_SECS: u64 = 300;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── RelayConfig ─────────────────────────────────────────────────────────────

/// Relay daemon configuration (`config.toml`).
///
/// Every field has a default, so a missing file or an empty table is a valid
/// configuration. CLI flags and environment variables override file values
/// (see `apply_overrides`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Bind address for the HTTP server. Default: 127.0.0.1; use 0.0.0.0 to
    /// accept connections from other hosts.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// HTTP listen port. Default: 8080.
    pub port: u16,
    /// Maximum accepted request body size in bytes. Default: 10 MiB.
    pub max_body_bytes: usize,
    /// Entry time-to-live in seconds, relative to last write. Default: 600.
    pub ttl_secs: u64,
    /// Expiration sweep interval in seconds. Default: 300. Clamped at five
    /// minutes and at the TTL, so expiry stays timely without busy-looping.
    pub sweep_interval_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            ttl_secs: DEFAULT_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl RelayConfig {
    /// Load from a TOML file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config file {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", p.display()))?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    /// Fold CLI flag / env var overrides into the file-loaded values.
    pub fn apply_overrides(
        &mut self,
        bind_address: Option<String>,
        port: Option<u16>,
        max_body_bytes: Option<usize>,
        ttl_secs: Option<u64>,
        sweep_interval_secs: Option<u64>,
    ) {
        if let Some(v) = bind_address {
            self.bind_address = v;
        }
        if let Some(v) = port {
            self.port = v;
        }
        if let Some(v) = max_body_bytes {
            self.max_body_bytes = v;
        }
        if let Some(v) = ttl_secs {
            self.ttl_secs = v;
        }
        if let Some(v) = sweep_interval_secs {
            self.sweep_interval_secs = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            bail!("ttl_secs must be greater than zero");
        }
        if self.sweep_interval_secs == 0 {
            bail!("sweep_interval_secs must be greater than zero");
        }
        if self.max_body_bytes == 0 {
            bail!("max_body_bytes must be greater than zero");
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Effective sweep cadence: the configured interval, clamped to
    /// `MAX_SWEEP_INTERVAL_SECS` and to the TTL itself.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_secs
                .min(MAX_SWEEP_INTERVAL_SECS)
                .min(self.ttl_secs),
        )
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
