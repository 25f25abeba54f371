use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{DvDebugError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// CDP endpoint configuration
    #[serde(default)]
    pub cdp: CdpConfig,

    /// URL allow-list
    #[serde(default)]
    pub origins: OriginsConfig,

    /// Page-local storage key names
    #[serde(default)]
    pub keys: StorageKeys,

    /// Timers and timeouts (milliseconds)
    #[serde(default)]
    pub timing: TimingConfig,

    /// Agent control channel
    #[serde(default)]
    pub control: ControlConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cdp: CdpConfig::default(),
            origins: OriginsConfig::default(),
            keys: StorageKeys::default(),
            timing: TimingConfig::default(),
            control: ControlConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpConfig {
    /// Browser remote debugging port
    #[serde(default = "default_cdp_port")]
    pub port: u16,

    /// Pin a specific tab by page id (default: first page)
    pub tab: Option<String>,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            port: default_cdp_port(),
            tab: None,
        }
    }
}

fn default_cdp_port() -> u16 {
    9222
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginsConfig {
    /// Local development host, including port
    #[serde(default = "default_dev_host")]
    pub dev_host: String,

    /// Production domain; a www prefix is also accepted
    #[serde(default = "default_production_domain")]
    pub production_domain: String,
}

impl Default for OriginsConfig {
    fn default() -> Self {
        Self {
            dev_host: default_dev_host(),
            production_domain: default_production_domain(),
        }
    }
}

fn default_dev_host() -> String {
    "localhost:8080".to_string()
}

fn default_production_domain() -> String {
    "dragvertising.com".to_string()
}

/// Key names in the page's localStorage. These must stay stable within one
/// deployment - the host app reads the visibility and tool keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageKeys {
    #[serde(default = "default_presence_key")]
    pub presence: String,

    #[serde(default = "default_timestamp_key")]
    pub timestamp: String,

    #[serde(default = "default_visibility_key")]
    pub visibility: String,

    #[serde(default = "default_tool_key")]
    pub tool: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            presence: default_presence_key(),
            timestamp: default_timestamp_key(),
            visibility: default_visibility_key(),
            tool: default_tool_key(),
        }
    }
}

fn default_presence_key() -> String {
    "dv_ext_present".to_string()
}

fn default_timestamp_key() -> String {
    "dv_ext_timestamp".to_string()
}

fn default_visibility_key() -> String {
    "dv_debug_visible".to_string()
}

fn default_tool_key() -> String {
    "dv_debug_active_tool".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Presence heartbeat cadence
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,

    /// Poll interval while waiting for page globals
    #[serde(default = "default_dependency_poll_ms")]
    pub dependency_poll_ms: u64,

    /// How long to wait for the debug component namespace
    #[serde(default = "default_component_timeout_ms")]
    pub component_timeout_ms: u64,

    /// How long to wait for the rendering library
    #[serde(default = "default_renderer_timeout_ms")]
    pub renderer_timeout_ms: u64,

    /// Delay before the first injection attempt while the document is
    /// still loading
    #[serde(default = "default_initial_delay_loading_ms")]
    pub initial_delay_loading_ms: u64,

    /// Delay before the first injection attempt once the document settled
    #[serde(default = "default_initial_delay_ready_ms")]
    pub initial_delay_ready_ms: u64,

    /// Delay between requesting injection and reading state
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Delay before re-attempting injection after SPA navigation
    #[serde(default = "default_navigation_delay_ms")]
    pub navigation_delay_ms: u64,

    /// Watch view refresh cadence
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: default_heartbeat_ms(),
            dependency_poll_ms: default_dependency_poll_ms(),
            component_timeout_ms: default_component_timeout_ms(),
            renderer_timeout_ms: default_renderer_timeout_ms(),
            initial_delay_loading_ms: default_initial_delay_loading_ms(),
            initial_delay_ready_ms: default_initial_delay_ready_ms(),
            settle_ms: default_settle_ms(),
            navigation_delay_ms: default_navigation_delay_ms(),
            refresh_ms: default_refresh_ms(),
        }
    }
}

fn default_heartbeat_ms() -> u64 {
    5000
}

fn default_dependency_poll_ms() -> u64 {
    100
}

fn default_component_timeout_ms() -> u64 {
    15_000
}

fn default_renderer_timeout_ms() -> u64 {
    10_000
}

fn default_initial_delay_loading_ms() -> u64 {
    2000
}

fn default_initial_delay_ready_ms() -> u64 {
    1000
}

fn default_settle_ms() -> u64 {
    500
}

fn default_navigation_delay_ms() -> u64 {
    500
}

fn default_refresh_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Loopback port the agent's control channel listens on
    #[serde(default = "default_control_port")]
    pub port: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            port: default_control_port(),
        }
    }
}

fn default_control_port() -> u16 {
    9777
}

impl Config {
    /// Load configuration from all sources (file, env, defaults)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Merge config file if exists
            .merge(Toml::file(&config_path))
            // Merge environment variables (DVDEBUG_*)
            .merge(Env::prefixed("DVDEBUG_").split("_"))
            .extract()
            .map_err(|e| DvDebugError::ConfigError(e.to_string()))?;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dvdebug")
            .join("config.toml")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| DvDebugError::ConfigError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_standard_cdp_port() {
        let config = Config::default();

        assert_eq!(config.cdp.port, 9222);
        assert!(config.cdp.tab.is_none());
    }

    #[test]
    fn default_origins_cover_dev_and_production() {
        let origins = OriginsConfig::default();

        assert_eq!(origins.dev_host, "localhost:8080");
        assert_eq!(origins.production_domain, "dragvertising.com");
    }

    #[test]
    fn default_storage_keys_match_host_app() {
        let keys = StorageKeys::default();

        assert_eq!(keys.presence, "dv_ext_present");
        assert_eq!(keys.timestamp, "dv_ext_timestamp");
        assert_eq!(keys.visibility, "dv_debug_visible");
        assert_eq!(keys.tool, "dv_debug_active_tool");
    }

    #[test]
    fn default_timing_has_expected_cadence() {
        let timing = TimingConfig::default();

        assert_eq!(timing.heartbeat_ms, 5000);
        assert_eq!(timing.dependency_poll_ms, 100);
        assert_eq!(timing.component_timeout_ms, 15_000);
        assert_eq!(timing.renderer_timeout_ms, 10_000);
        assert_eq!(timing.initial_delay_loading_ms, 2000);
        assert_eq!(timing.initial_delay_ready_ms, 1000);
        assert_eq!(timing.settle_ms, 500);
        assert_eq!(timing.refresh_ms, 2000);
    }
}
