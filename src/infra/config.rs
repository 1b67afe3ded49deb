//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! Every section has defaults, so a missing file falls back to a fully
//! usable configuration.

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

/// What to do when a single profile lookup fails during aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupFailurePolicy {
    /// Drop the failed lookup silently (logged at debug)
    Skip,
    /// Keep failures in the batch for the caller to inspect
    Collect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum distance between fix and event at which admission is allowed
    #[serde(default = "default_radius_meters")]
    pub radius_meters: f64,
    /// How many times to retry the whole validation when no fix is available
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before each retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            radius_meters: default_radius_meters(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_radius_meters() -> f64 {
    // 1 mile
    1_609.344
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Document collection holding check-in records
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { collection: default_collection() }
    }
}

fn default_collection() -> String {
    "checkins".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendeesConfig {
    #[serde(default = "default_lookup_failure")]
    pub lookup_failure: LookupFailurePolicy,
}

impl Default for AttendeesConfig {
    fn default() -> Self {
        Self { lookup_failure: default_lookup_failure() }
    }
}

fn default_lookup_failure() -> LookupFailurePolicy {
    LookupFailurePolicy::Skip
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CompatConfig {
    /// Legacy quirk: is_checked_in returns false on store errors instead
    /// of propagating them
    #[serde(default)]
    pub degrade_is_checked_in: bool,
}

/// TOML file structure
#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    admission: AdmissionConfig,
    #[serde(default)]
    store: StoreConfig,
    #[serde(default)]
    attendees: AttendeesConfig,
    #[serde(default)]
    compat: CompatConfig,
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    radius_meters: f64,
    max_retries: u32,
    retry_delay_ms: u64,
    collection: String,
    lookup_failure: LookupFailurePolicy,
    degrade_is_checked_in: bool,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        let admission = AdmissionConfig::default();
        Self {
            radius_meters: admission.radius_meters,
            max_retries: admission.max_retries,
            retry_delay_ms: admission.retry_delay_ms,
            collection: default_collection(),
            lookup_failure: default_lookup_failure(),
            degrade_is_checked_in: false,
            config_file: "(defaults)".to_string(),
        }
    }
}

impl Config {
    /// Resolve the config file path from args/env, with a default fallback
    pub fn resolve_config_path(args: &[String]) -> String {
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if arg == "--config" {
                if let Some(path) = iter.next() {
                    return path.to_string();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            radius_meters: toml_config.admission.radius_meters,
            max_retries: toml_config.admission.max_retries,
            retry_delay_ms: toml_config.admission.retry_delay_ms,
            collection: toml_config.store.collection,
            lookup_failure: toml_config.attendees.lookup_failure,
            degrade_is_checked_in: toml_config.compat.degrade_is_checked_in,
            config_file: path.display().to_string(),
        })
    }

    /// Load from a path, falling back to defaults if the file is unusable
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path, error = %e, "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    /// Load configuration - resolves the path then tries the file, with
    /// fallback to defaults
    pub fn load(args: &[String]) -> Self {
        let path = Self::resolve_config_path(args);
        Self::load_from_path(&path)
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn lookup_failure(&self) -> LookupFailurePolicy {
        self.lookup_failure
    }

    pub fn degrade_is_checked_in(&self) -> bool {
        self.degrade_is_checked_in
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    // Test/override helpers

    pub fn with_radius_meters(mut self, radius_meters: f64) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn with_lookup_failure(mut self, policy: LookupFailurePolicy) -> Self {
        self.lookup_failure = policy;
        self
    }

    pub fn with_degrade_is_checked_in(mut self, degrade: bool) -> Self {
        self.degrade_is_checked_in = degrade;
        self
    }
}
