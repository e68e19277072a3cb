//! Capture configuration loaded from TOML
//!
//! ```toml
//! patterns = ["app.*", "db"]
//! minimum_level = "info"
//! render_limit = 20
//!
//! [wait]
//! timeout_ms = 2000
//! poll_interval_ms = 5
//! ```
//!
//! `LOGCAP_PATTERNS` (comma-separated) and `LOGCAP_MIN_LEVEL` override the
//! file values when set.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assertions::DEFAULT_RENDER_LIMIT;
use crate::errors::{CaptureError, Result};
use crate::pattern::PatternSet;
use crate::record::Level;
use crate::session::WaitPolicy;

pub const ENV_PATTERNS: &str = "LOGCAP_PATTERNS";
pub const ENV_MIN_LEVEL: &str = "LOGCAP_MIN_LEVEL";

fn default_minimum_level() -> String {
    "trace".to_string()
}

fn default_render_limit() -> usize {
    DEFAULT_RENDER_LIMIT
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    10
}

/// `[wait]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default = "default_minimum_level")]
    pub minimum_level: String,
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default = "default_render_limit")]
    pub render_limit: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            minimum_level: default_minimum_level(),
            wait: WaitConfig::default(),
            render_limit: default_render_limit(),
        }
    }
}

impl CaptureConfig {
    /// # Errors
    ///
    /// Returns a configuration error if the TOML is malformed or has unknown keys.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CaptureError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PATTERNS) {
            self.patterns = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(level) = lookup(ENV_MIN_LEVEL) {
            self.minimum_level = level.trim().to_string();
        }
        self
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Parse patterns and level
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty or malformed pattern set, an
    /// unknown level, or a zero wait timeout.
    pub fn validate(&self) -> Result<(PatternSet, Level)> {
        let patterns = PatternSet::parse(&self.patterns)?;
        let level: Level = self.minimum_level.parse()?;
        if self.wait.timeout_ms == 0 {
            return Err(CaptureError::configuration(
                "wait.timeout_ms must be greater than zero",
            ));
        }
        Ok((patterns, level))
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.wait.timeout_ms),
            Duration::from_millis(self.wait.poll_interval_ms),
        )
    }
}
