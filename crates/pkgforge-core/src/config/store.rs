//! Persisted configuration file
//!
//! The file lives in the standard per-user configuration directory
//! (`~/.config/<product>/config.yaml` on Linux) unless the product's config
//! environment variable points elsewhere.

use super::tree::ConfigTree;
use crate::error::{ForgeError, Result};
use crate::product::ProductConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default filename for the YAML payload
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Load/save access to the configuration file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the path from the product's environment override or the
    /// user's config directory
    pub fn from_config<C: ProductConfig>(config: &C) -> Self {
        if let Ok(path) = std::env::var(config.config_path_env()) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Self::new(trimmed);
            }
        }

        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(config.config_dir_name())
            .join(CONFIG_FILE_NAME);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing or empty file is an empty tree; content that
    /// is not a YAML mapping is a `ConfigParseFailure`.
    pub fn load(&self) -> Result<ConfigTree> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no config file, using empty tree");
            return Ok(ConfigTree::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigTree::new());
        }

        serde_yaml::from_str(&content).map_err(|e| ForgeError::ConfigParseFailure {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Write the tree, creating the parent directory if needed
    pub fn save(&self, tree: &ConfigTree) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_yaml::to_string(tree).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), "saved config file");
        Ok(())
    }
}
