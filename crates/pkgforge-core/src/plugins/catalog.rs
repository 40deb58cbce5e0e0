//! Plugin catalog discovery
//!
//! The catalog is a YAML manifest listing every plugin kind with its fields,
//! their types and defaults, plus the file templates the engine renders.
//! A manifest is embedded in the binary; the product's catalog environment
//! variable points at a replacement on disk.

use super::details::{FieldType, PluginDetails};
use crate::config::tree::ConfigValue;
use crate::error::{ForgeError, Result};
use crate::product::ProductConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Catalog shipped with the binary
pub const BUILTIN_CATALOG: &str = include_str!("../../catalog/plugins.yaml");

/// Where the catalog manifest comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Builtin,
    Local(PathBuf),
}

impl CatalogSource {
    /// Pick the source from the product's catalog environment variable,
    /// falling back to the embedded catalog
    pub fn from_config<C: ProductConfig>(config: &C) -> Self {
        match std::env::var(config.catalog_path_env()) {
            Ok(path) if !path.trim().is_empty() => Self::Local(PathBuf::from(path.trim())),
            _ => Self::Builtin,
        }
    }
}

/// Root catalog manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Oldest CLI version the catalog is written for
    pub version: String,

    pub plugins: Vec<PluginManifest>,
}

/// One plugin entry of the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub fields: Vec<FieldManifest>,

    #[serde(default)]
    pub files: Vec<FileTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldManifest {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Absent or null means the field has no default
    #[serde(default)]
    pub default: ConfigValue,
}

/// A file a plugin contributes to the generated package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTemplate {
    /// Destination path, relative to the package root; may use placeholders
    pub path: String,

    #[serde(default)]
    pub template: String,
}

/// Read access to the set of known plugin kinds
pub trait PluginCatalog {
    /// Every plugin kind, in catalog order
    fn list_plugins(&self) -> &[PluginDetails];

    /// Case-insensitive exact lookup
    fn find(&self, name: &str) -> Option<&PluginDetails> {
        self.list_plugins()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// True iff the plugin exists and has no fields
    fn is_argumentless(&self, name: &str) -> bool {
        self.find(name).is_some_and(PluginDetails::is_argumentless)
    }

    /// Comma-separated plugin names, for error messages
    fn available(&self) -> String {
        self.list_plugins()
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Catalog built from a [`CatalogManifest`]
#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    version: String,
    plugins: Vec<PluginDetails>,
    /// Keyed by lower-cased plugin name
    templates: IndexMap<String, Vec<FileTemplate>>,
}

impl ManifestCatalog {
    /// Load and validate the catalog. Any failure is fatal for the run.
    pub fn load(source: &CatalogSource) -> Result<Self> {
        let content = match source {
            CatalogSource::Builtin => BUILTIN_CATALOG.to_string(),
            CatalogSource::Local(path) => std::fs::read_to_string(path).map_err(|e| {
                ForgeError::CatalogUnavailable(format!("failed to read {}: {}", path.display(), e))
            })?,
        };
        debug!(?source, "loading plugin catalog");
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: CatalogManifest = serde_yaml::from_str(content)
            .map_err(|e| ForgeError::CatalogUnavailable(format!("invalid manifest: {}", e)))?;
        Self::from_manifest(manifest)
    }

    pub fn from_manifest(manifest: CatalogManifest) -> Result<Self> {
        if manifest.plugins.is_empty() {
            return Err(ForgeError::CatalogUnavailable(
                "catalog lists no plugins".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut plugins = Vec::with_capacity(manifest.plugins.len());
        let mut templates = IndexMap::new();

        for entry in manifest.plugins {
            let key = entry.name.to_lowercase();
            if !seen.insert(key.clone()) {
                return Err(ForgeError::CatalogUnavailable(format!(
                    "plugin '{}' is listed twice",
                    entry.name
                )));
            }

            let details = details_from_manifest(&entry)?;
            debug!(plugin = %details.name, fields = details.fields.len(), "discovered plugin");
            plugins.push(details);
            templates.insert(key, entry.files);
        }

        Ok(Self {
            version: manifest.version,
            plugins,
            templates,
        })
    }

    /// Version string declared by the manifest
    pub fn version(&self) -> &str {
        &self.version
    }

    /// File templates of a plugin (case-insensitive)
    pub fn templates(&self, name: &str) -> &[FileTemplate] {
        self.templates
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All templates keyed by lower-cased plugin name
    pub fn all_templates(&self) -> &IndexMap<String, Vec<FileTemplate>> {
        &self.templates
    }
}

impl PluginCatalog for ManifestCatalog {
    fn list_plugins(&self) -> &[PluginDetails] {
        &self.plugins
    }
}

fn details_from_manifest(entry: &PluginManifest) -> Result<PluginDetails> {
    let mut fields = Vec::with_capacity(entry.fields.len());
    let mut types = Vec::with_capacity(entry.fields.len());
    let mut defaults = Vec::with_capacity(entry.fields.len());

    for field in &entry.fields {
        let default = field.default.to_option_value().map_err(|received| {
            ForgeError::CatalogUnavailable(format!(
                "plugin '{}' field '{}' has unsupported default {}",
                entry.name, field.name, received
            ))
        })?;
        fields.push(field.name.clone());
        types.push(field.field_type.clone());
        defaults.push(default);
    }

    PluginDetails::new(&entry.name, &entry.description, fields, types, defaults)
}
