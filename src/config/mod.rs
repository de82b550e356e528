//! Configuration loading and management for the ADR dashboard
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to typed settings
//! - Defaults match the local development API
//! - Validation runs before any network client is built

use crate::domain::violations::{DashboardError, DashboardResult};
use crate::state::DASHBOARD_SENTINEL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// File names probed in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILES: [&str; 3] =
    ["adr_dashboard.yaml", "adr_dashboard.yml", ".adr_dashboard.yaml"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Configuration format version
    pub version: String,
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Refresh cadence for the live view
    #[serde(default)]
    pub polling: PollingConfig,
    /// Selection id that opens the insights page instead of an ADR
    #[serde(default = "default_dashboard_sentinel")]
    pub dashboard_sentinel: String,
}

/// Where and how to reach the dashboard API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Repository key used in manifest and violation paths
    #[serde(default = "default_repo_key")]
    pub repo_key: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Timer periods for the two refresh loops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_manifest_interval")]
    pub manifest_interval_secs: u64,
    #[serde(default = "default_violation_interval")]
    pub violation_interval_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            repo_key: default_repo_key(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            manifest_interval_secs: default_manifest_interval(),
            violation_interval_secs: default_violation_interval(),
        }
    }
}

impl PollingConfig {
    pub fn manifest_interval(&self) -> Duration {
        Duration::from_secs(self.manifest_interval_secs)
    }

    pub fn violation_interval(&self) -> Duration {
        Duration::from_secs(self.violation_interval_secs)
    }
}

impl DashboardConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DashboardResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            DashboardError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            DashboardError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> DashboardResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| DashboardError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the first default config file found in `dir`, or fall back to defaults
    pub fn discover<P: AsRef<Path>>(dir: P) -> DashboardResult<Self> {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.as_ref().join(name);
            if candidate.exists() {
                tracing::debug!("Using config file {}", candidate.display());
                return Self::load_from_file(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Get default configuration for a local API
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            api: ApiConfig::default(),
            polling: PollingConfig::default(),
            dashboard_sentinel: default_dashboard_sentinel(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> DashboardResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(DashboardError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        let url = reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            DashboardError::config(format!("Invalid base_url '{}': {}", self.api.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DashboardError::config(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.api.repo_key.trim().is_empty() {
            return Err(DashboardError::config("repo_key must not be empty"));
        }

        if self.api.timeout_secs == 0 {
            return Err(DashboardError::config("timeout_secs must be greater than zero"));
        }

        if self.polling.manifest_interval_secs == 0 || self.polling.violation_interval_secs == 0 {
            return Err(DashboardError::config("polling intervals must be greater than zero"));
        }

        if self.dashboard_sentinel.trim().is_empty() {
            return Err(DashboardError::config("dashboard_sentinel must not be empty"));
        }

        Ok(())
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Convert to YAML for display
    pub fn to_yaml(&self) -> DashboardResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| DashboardError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_repo_key() -> String {
    "mySpace".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_manifest_interval() -> u64 {
    10
}

fn default_violation_interval() -> u64 {
    5
}

fn default_dashboard_sentinel() -> String {
    DASHBOARD_SENTINEL.to_string()
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: DashboardConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self { config: DashboardConfig::default() }
    }

    /// Start from an existing configuration
    pub fn from_config(config: DashboardConfig) -> Self {
        Self { config }
    }

    /// Set the API base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    /// Set the repository key
    pub fn repo_key(mut self, key: impl Into<String>) -> Self {
        self.config.api.repo_key = key.into();
        self
    }

    /// Set both polling intervals, in seconds
    pub fn intervals(mut self, manifest_secs: u64, violation_secs: u64) -> Self {
        self.config.polling.manifest_interval_secs = manifest_secs;
        self.config.polling.violation_interval_secs = violation_secs;
        self
    }

    /// Set the selection id that opens the insights page
    pub fn dashboard_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.config.dashboard_sentinel = sentinel.into();
        self
    }

    /// Build the final configuration
    pub fn build(self) -> DashboardResult<DashboardConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.repo_key, "mySpace");
        assert_eq!(config.polling.manifest_interval(), Duration::from_secs(10));
        assert_eq!(config.polling.violation_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = DashboardConfig::load_from_str(
            "version: \"1.0\"\napi:\n  repo_key: platform\n",
        )
        .unwrap();

        assert_eq!(config.api.repo_key, "platform");
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.polling, PollingConfig::default());
        assert_eq!(config.dashboard_sentinel, DASHBOARD_SENTINEL);
    }

    #[test]
    fn test_dashboard_sentinel_is_configurable() {
        let config =
            DashboardConfig::load_from_str("version: \"1.0\"\ndashboard_sentinel: overview\n").unwrap();
        assert_eq!(config.dashboard_sentinel, "overview");

        assert!(DashboardConfig::load_from_str("version: \"1.0\"\ndashboard_sentinel: \" \"\n").is_err());
        assert!(ConfigBuilder::new().dashboard_sentinel("").build().is_err());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = DashboardConfig::load_from_str("version: \"2.0\"\n").unwrap_err();
        assert!(err.to_string().contains("Unsupported configuration version"));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = ConfigBuilder::new().intervals(0, 5).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(ConfigBuilder::new().base_url("not a url").build().is_err());
        assert!(ConfigBuilder::new().base_url("ftp://example.com").build().is_err());
        assert!(ConfigBuilder::new().repo_key("  ").build().is_err());
    }

    #[test]
    fn test_load_from_file_and_discover() {
        let temp_dir = TempDir::new().unwrap();

        // Nothing on disk falls back to defaults
        let config = DashboardConfig::discover(temp_dir.path()).unwrap();
        assert_eq!(config, DashboardConfig::default());

        let custom = ConfigBuilder::new()
            .base_url("http://adr.internal:9000")
            .intervals(30, 2)
            .build()
            .unwrap();
        std::fs::write(temp_dir.path().join("adr_dashboard.yml"), custom.to_yaml().unwrap())
            .unwrap();

        let discovered = DashboardConfig::discover(temp_dir.path()).unwrap();
        assert_eq!(discovered, custom);
    }
}
