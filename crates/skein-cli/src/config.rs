//! Configuration for the Skein CLI.
//!
//! Provides the [`SkeinConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `SKEIN_CONFIG` environment variable
//! 3. XDG default: `~/.config/skein/config.toml`
//! 4. Built-in defaults
//!
//! `SKEIN_<SECTION>_<KEY>` environment variables overlay the file. Env values
//! arrive as strings, so only string-typed fields can be overridden this way.

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use skein_core::{Error, Result};
use skein_vector::{EmbeddingConfig, SearchConfig};
use std::path::PathBuf;

/// Env var naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SKEIN_CONFIG";

/// Main configuration for the Skein CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeinConfig {
    /// Embedding model, caching and batching.
    pub embedding: EmbeddingConfig,

    /// Search defaults.
    pub search: SearchConfig,
}

impl SkeinConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// A config path that does not exist is not an error; defaults apply.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("SKEIN");
        env_opts.add_section("embedding");
        env_opts.add_section("search");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("skein").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
