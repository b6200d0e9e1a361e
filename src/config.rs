//! Configuration management for the artifact registry
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (registry.toml)
//! - Environment variables (REGISTRY__*)
//!
//! ## Example config file (registry.toml):
//! ```toml
//! # Serve documents from disk instead of the compiled-in tree
//! data_dir = "./data"
//! default_mapping_version = "v1.1.0"
//! log_filter = "artifact_registry=debug"
//! ```

use std::path::{Path, PathBuf};

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Registry configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// On-disk data root laid out as `<category>/<version>/<name>`.
    /// When unset the compiled-in catalog is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Mapping version used when a caller does not name one.
    /// When unset the mapping document's own default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mapping_version: Option<String>,

    /// `tracing` filter directive for the CLI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl RegistryConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["registry.toml", ".registry.toml", "config/registry.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(xdg_config) = Self::user_config_path() {
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // REGISTRY__DATA_DIR, REGISTRY__DEFAULT_MAPPING_VERSION, ...
        builder = builder.add_source(
            Environment::with_prefix("REGISTRY")
                .prefix_separator("__")
                .separator("__"),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Per-user config file location (XDG on Linux)
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "artifact-registry", "registry")
            .map(|dirs| dirs.config_dir().join("registry.toml"))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            RegistryError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Data root resolved against the working directory
    pub fn data_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}
