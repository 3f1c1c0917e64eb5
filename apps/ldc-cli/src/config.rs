//! `ldc.toml` configuration: default capability scopes, evaluator limits
//! and the HMAC key material used to sign an outcome. Mirrors the
//! flat, serde-deserialized, environment-overridable config structs the
//! server binaries load, scaled down to what a single-document CLI host
//! actually needs.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Capability scopes granted to every evaluation (§3.1). A document
    /// whose directives need a scope not listed here gets a diagnostic,
    /// not a panic.
    pub capabilities: Vec<String>,
    pub decimal_precision: u32,
    pub max_fixpoint_iterations: usize,
    pub cancellation_poll_granularity: usize,
    /// Wall-clock budget for one evaluation, in milliseconds. `None`
    /// (the default) means no timeout.
    pub timeout_ms: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        let defaults = ldc_eval::EvalOptions::default();
        EvalConfig {
            capabilities: Vec::new(),
            decimal_precision: defaults.decimal_precision,
            max_fixpoint_iterations: defaults.max_fixpoint_iterations,
            cancellation_poll_granularity: defaults.cancellation_poll_granularity,
            timeout_ms: None,
        }
    }
}

impl EvalConfig {
    pub fn to_options(&self) -> ldc_eval::EvalOptions {
        ldc_eval::EvalOptions {
            decimal_precision: self.decimal_precision,
            max_fixpoint_iterations: self.max_fixpoint_iterations,
            cancellation_poll_granularity: self.cancellation_poll_granularity,
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}

/// `[signing]`: HMAC key material for `ldc eval --sign`. The key itself
/// is never stored in `ldc.toml` — only the name of the environment
/// variable that carries it, so the config file stays safe to commit.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SigningConfig {
    pub key_env: Option<String>,
    pub kid: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub eval: EvalConfig,
    pub signing: SigningConfig,
}

impl Config {
    /// Loads `path` if it exists, otherwise returns all-default config —
    /// an `ldc.toml` is convenience, not a requirement (§6: the host
    /// contract only needs capabilities, units, a clock and a loader).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}
