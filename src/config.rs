//! Detector configuration.
//!
//! Layered the usual way: built-in defaults, then an optional JSON file,
//! then `IDS_*` environment variables. The monitor binary applies its CLI
//! flags last and calls [`DetectorConfig::validate`] before starting a run.

use crate::error::{IdsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_ACTIVITY_THRESHOLD: u8 = 70;
pub const DEFAULT_SIGMA_MULTIPLIER: f64 = 2.0;

/// Highest value a sample can take.
pub const MAX_SAMPLE: u8 = 99;

/// How the activity window retains samples once `window_size` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Never evict; every scan covers the whole run history.
    #[default]
    Growing,
    /// Keep the most recent `window_size` samples (FIFO).
    Sliding,
}

impl WindowPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "growing" => Some(Self::Growing),
            "sliding" => Some(Self::Sliding),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub tick_interval_ms: u64,
    /// Samples required before the first anomaly scan.
    pub window_size: usize,
    /// Samples strictly above this value are classified as intrusions.
    pub activity_threshold: u8,
    pub sigma_multiplier: f64,
    pub window_policy: WindowPolicy,
    /// Fixed seed for the signal source and classifier (reproducible runs).
    pub seed: Option<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            window_size: DEFAULT_WINDOW_SIZE,
            activity_threshold: DEFAULT_ACTIVITY_THRESHOLD,
            sigma_multiplier: DEFAULT_SIGMA_MULTIPLIER,
            window_policy: WindowPolicy::Growing,
            seed: None,
        }
    }
}

impl DetectorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Apply `IDS_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("IDS_TICK_INTERVAL_MS") {
            self.tick_interval_ms = parse_var("IDS_TICK_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("IDS_WINDOW_SIZE") {
            self.window_size = parse_var("IDS_WINDOW_SIZE", &v)?;
        }
        if let Some(v) = lookup("IDS_ACTIVITY_THRESHOLD") {
            self.activity_threshold = parse_var("IDS_ACTIVITY_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("IDS_SIGMA_MULTIPLIER") {
            self.sigma_multiplier = parse_var("IDS_SIGMA_MULTIPLIER", &v)?;
        }
        if let Some(v) = lookup("IDS_WINDOW_POLICY") {
            self.window_policy = WindowPolicy::parse(&v).ok_or_else(|| {
                IdsError::InvalidConfig(format!("IDS_WINDOW_POLICY: unknown policy '{}'", v))
            })?;
        }
        if let Some(v) = lookup("IDS_SEED") {
            self.seed = Some(parse_var("IDS_SEED", &v)?);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(IdsError::InvalidConfig("window_size must be at least 1".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(IdsError::InvalidConfig("tick_interval_ms must be positive".into()));
        }
        if self.activity_threshold > MAX_SAMPLE {
            return Err(IdsError::InvalidConfig(format!(
                "activity_threshold must be within 0..={}, got {}",
                MAX_SAMPLE, self.activity_threshold
            )));
        }
        if !self.sigma_multiplier.is_finite() || self.sigma_multiplier < 0.0 {
            return Err(IdsError::InvalidConfig(format!(
                "sigma_multiplier must be a non-negative number, got {}",
                self.sigma_multiplier
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| IdsError::InvalidConfig(format!("{}: cannot parse '{}'", key, raw)))
}
