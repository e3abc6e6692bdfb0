//! Configuration module for stagegraph
//!
//! Engine settings that are not part of any particular graph:
//! - Which cycle detection strategy new graphs use
//! - How many worker threads a parallel manager may spawn
//! - Where and how log output goes
//!
//! # Config Location
//!
//! The default config file lives in the platform config directory:
//! - **Linux**: `~/.config/stagegraph/stagegraph.toml`
//! - **macOS**: `~/Library/Application Support/stagegraph/stagegraph.toml`
//! - **Windows**: `%APPDATA%\stagegraph\stagegraph.toml`
//!
//! Files ending in `.toml` are read and written as TOML; anything else as JSON.
//!
//! # Example
//!
//! ```ignore
//! use stagegraph::config::EngineConfig;
//!
//! let config = EngineConfig::load_or_default(EngineConfig::default_path());
//! let _guard = stagegraph::logging::init(&config.logging)?;
//! let graph = stagegraph::DiGraph::from_config(&config.graph);
//! ```

use crate::error::{Result, ResultExt, StageGraphError};
use crate::graph::CycleStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "stagegraph";

/// Default config filename
pub const CONFIG_FILE: &str = "stagegraph.toml";

/// Default tracing filter when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "info,stagegraph=debug";

/// Default file name prefix for rolling log files
pub const DEFAULT_LOG_PREFIX: &str = "stagegraph.log";

// ==================== Config Directory ====================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().ok_or_else(|| {
        StageGraphError::Config("Could not determine config directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            StageGraphError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    Ok(dir)
}

// ==================== Sections ====================

/// Settings for graphs built from config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Cycle detection algorithm
    #[serde(default)]
    pub cycle_strategy: CycleStrategy,
}

/// Settings for parallel managers built from config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Upper bound on worker threads; 0 spawns one per component
    #[serde(default)]
    pub max_workers: usize,
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Directory for daily rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log file name prefix
    #[serde(default = "default_log_prefix")]
    pub file_prefix: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_log_prefix() -> String {
    DEFAULT_LOG_PREFIX.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            log_dir: None,
            file_prefix: default_log_prefix(),
        }
    }
}

// ==================== Engine Config ====================

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub parallel: ParallelConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

impl EngineConfig {
    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|p| p.join(CONFIG_FILE))
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| StageGraphError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Parse a config from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| StageGraphError::Config(format!("Failed to parse JSON config: {}", e)))
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StageGraphError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config = if is_toml(path) {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        };
        config.with_context(|| format!("Loading {:?}", path))
    }

    /// Load a config file, returning defaults if it is missing or invalid
    pub fn load_or_default(path: Option<impl AsRef<Path>>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config to disk, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| {
                StageGraphError::Config(format!("Failed to serialize config: {}", e))
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| {
                StageGraphError::Config(format!("Failed to serialize config: {}", e))
            })?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StageGraphError::Config(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }

        std::fs::write(path, content).map_err(|e| {
            StageGraphError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })?;

        tracing::debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Save config to the default location
    pub fn save_default(&self) -> Result<PathBuf> {
        let path = ensure_config_dir()?.join(CONFIG_FILE);
        self.save(&path)?;
        Ok(path)
    }
}
