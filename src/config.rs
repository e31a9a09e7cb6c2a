//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$SKYPESHELL_CONFIG` (environment variable)
//! 2. `~/.config/skypeshell/config.toml` (Linux/macOS)
//!    `%APPDATA%\skypeshell\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! The loaded [`Config`] is passed by value to each command; nothing here
//! is global.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Conversation paging defaults.
    pub view: ViewConfig,
    /// Search defaults and cache sizing.
    pub search: SearchConfig,
    /// Export defaults.
    pub export: ExportConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// `strftime` format string for message timestamps.
    pub date_format: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Conversation paging defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Messages per page.
    pub page_size: usize,
    /// Show the newest messages first.
    pub newest_first: bool,
    /// Include system (thread activity / control) messages.
    pub show_system: bool,
}

/// Search defaults and cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default maximum number of results (0 = unlimited).
    pub limit: usize,
    /// Characters of context on each side of a content match.
    pub context_chars: usize,
    /// Maximum number of cached result sets, at most 100 (0 disables the cache).
    pub cache_capacity: usize,
    /// Search message content by default.
    pub search_in_content: bool,
    /// Search sender names by default.
    pub search_in_sender: bool,
}

/// Export defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for auto-named exports (current directory if unset).
    pub default_output_dir: Option<PathBuf>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            newest_first: false,
            show_system: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            context_chars: crate::search::matcher::DEFAULT_CONTEXT_CHARS,
            cache_capacity: crate::search::cache::DEFAULT_CAPACITY,
            search_in_content: true,
            search_in_sender: true,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("SKYPESHELL_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("skypeshell").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skypeshell")
}
