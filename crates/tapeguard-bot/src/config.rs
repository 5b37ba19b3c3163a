//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tapeguard_gate::TapeGateConfig;
use tapeguard_journal::JournalConfig;

/// Default configuration file path, overridable via the
/// `TAPEGUARD_CONFIG` environment variable or the CLI.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Observe and classify market data only; nothing is journaled.
    #[default]
    Observation,
    /// Journal every decision (taken or suppressed) for replay and audit.
    Shadow,
}

impl OperatingMode {
    pub fn journaling_enabled(self) -> bool {
        matches!(self, Self::Shadow)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: OperatingMode,

    /// Tape freshness gate thresholds.
    #[serde(default)]
    pub gate: TapeGateConfig,

    /// Journal file settings.
    #[serde(default)]
    pub journal: JournalConfig,

    /// Heartbeat journaling interval (ms).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

fn default_heartbeat_interval_ms() -> u64 {
    5_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            gate: TapeGateConfig::default(),
            journal: JournalConfig::default(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Uses `TAPEGUARD_CONFIG` when set, falling back to built-in
    /// defaults when no file exists at the resolved path.
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("TAPEGUARD_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if Path::new(&path).exists() {
            Self::from_file(&path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load and sanitize configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {path}: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("cannot parse {path}: {e}")))?;
        Ok(config.sanitized())
    }

    /// Clamp out-of-range values; invalid thresholds are never fatal.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.gate = self.gate.sanitized();
        self.heartbeat_interval_ms = self.heartbeat_interval_ms.max(1);
        self
    }
}
