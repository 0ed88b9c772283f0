/*!
 * Configuration support for the revest library
 *
 * Provides runtime configuration options for customizing library behavior.
 */

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// Global configuration for the revest library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Whether to show progress bars while loading ledgers
    #[serde(default = "default_enable_progress_bar")]
    pub enable_progress_bar: bool,

    /// Whether to log a capped sample of skipped rows to stderr
    #[serde(default)]
    pub log_skipped_rows: bool,

    /// Number of threads for parallel operations (None = use all available)
    #[serde(default)]
    pub parallel_threads: Option<usize>,

    /// Default export format
    #[serde(default)]
    pub default_export_format: crate::ExportFormat,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: default_enable_progress_bar(),
            log_skipped_rows: false,
            parallel_threads: None,
            default_export_format: crate::ExportFormat::Json,
        }
    }
}

// Default value functions for serde
fn default_enable_progress_bar() -> bool {
    true
}

impl LedgerConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `REVEST_PROGRESS_BAR`: "true" or "false"
    /// - `REVEST_LOG_SKIPPED`: "true" or "false"
    /// - `REVEST_PARALLEL_THREADS`: number or "auto"
    /// - `REVEST_EXPORT_FORMAT`: "json", "jsonl", or "csv"
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REVEST_PROGRESS_BAR") {
            config.enable_progress_bar = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("REVEST_LOG_SKIPPED") {
            config.log_skipped_rows = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("REVEST_PARALLEL_THREADS") {
            config.parallel_threads = match val.to_lowercase().as_str() {
                "auto" | "0" => None,
                num => num.parse().ok(),
            };
        }

        if let Ok(val) = std::env::var("REVEST_EXPORT_FORMAT") {
            config.default_export_format = match val.to_lowercase().as_str() {
                "jsonl" | "json_lines" => crate::ExportFormat::JsonLines,
                "csv" => crate::ExportFormat::Csv,
                _ => crate::ExportFormat::Json,
            };
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::LedgerError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML format".to_string()),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::LedgerError::Configuration {
                message: format!("Failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/revest/config.toml` on Unix-like systems
    /// or `%APPDATA%\revest\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "revest")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, environment, or defaults
    ///
    /// Priority order:
    /// 1. Default config file (if exists)
    /// 2. Environment variables
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                if let Ok(config) = Self::from_file(&config_path) {
                    return config;
                }
            }
        }

        Self::from_env()
    }

    /// Create a configuration suited to scripted, non-interactive use
    pub fn quiet() -> Self {
        Self {
            enable_progress_bar: false,
            log_skipped_rows: false,
            parallel_threads: None,
            default_export_format: crate::ExportFormat::Json,
        }
    }

    /// Create a configuration that surfaces every ingestion detail
    pub fn verbose() -> Self {
        Self {
            enable_progress_bar: true,
            log_skipped_rows: true,
            parallel_threads: Some(1),
            default_export_format: crate::ExportFormat::Json,
        }
    }
}

// Global configuration support
use std::sync::RwLock;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<Option<LedgerConfig>> = RwLock::new(None);
}

/// Set the global configuration
pub fn set_global_config(config: LedgerConfig) {
    *GLOBAL_CONFIG.write().unwrap() = Some(config);
}

/// Get the global configuration (or default if not set)
pub fn global_config() -> LedgerConfig {
    GLOBAL_CONFIG.read().unwrap()
        .as_ref()
        .cloned()
        .unwrap_or_else(LedgerConfig::load)
}

/// Clear the global configuration
pub fn clear_global_config() {
    *GLOBAL_CONFIG.write().unwrap() = None;
}

/// Builder for customizing configuration
pub struct ConfigBuilder {
    config: LedgerConfig,
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self {
            config: LedgerConfig::default(),
        }
    }

    /// Set progress bar enabled
    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.enable_progress_bar = enabled;
        self
    }

    /// Set skipped-row logging
    pub fn log_skipped_rows(mut self, log: bool) -> Self {
        self.config.log_skipped_rows = log;
        self
    }

    /// Set number of parallel threads
    pub fn parallel_threads(mut self, threads: Option<usize>) -> Self {
        self.config.parallel_threads = threads;
        self
    }

    /// Set default export format
    pub fn default_export_format(mut self, format: crate::ExportFormat) -> Self {
        self.config.default_export_format = format;
        self
    }

    /// Build the configuration
    pub fn build(self) -> LedgerConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
