//! Error types for pkgforge
//!
//! Every failure the core can produce is a variant of [`ForgeError`]. The
//! dispatcher turns these into a failing `CommandResult`; nothing below it
//! prints or exits.

use thiserror::Error;

/// The primary error type for pkgforge operations.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// A plugin option token without a `key=value` shape
    #[error("Malformed option '{0}': expected KEY=VALUE")]
    MalformedOptionToken(String),

    /// A requested plugin that the catalog does not know about
    #[error("Plugin '{name}' not found. Available plugins: {available}")]
    UnknownPlugin { name: String, available: String },

    /// A supplied field that the plugin does not declare
    #[error("Plugin '{plugin}' has no field '{field}'. Known fields: {known}")]
    UnknownPluginField {
        plugin: String,
        field: String,
        known: String,
    },

    /// A supplied value whose type does not fit the declared field type
    #[error("Plugin '{plugin}' field '{field}' expects {expected}, got {received}")]
    PluginFieldTypeMismatch {
        plugin: String,
        field: String,
        expected: String,
        received: String,
    },

    /// The template engine could not generate the package
    #[error("Package generation failed: {0}")]
    PackageGenerationFailure(String),

    /// The persisted configuration file could not be parsed
    #[error("Failed to parse config file {path}: {reason}")]
    ConfigParseFailure { path: String, reason: String },

    /// The plugin catalog is missing or malformed
    #[error("Plugin catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// A built-in config key given a value of the wrong type
    #[error("Config key '{key}' expects {expected}, got {received}")]
    ConfigValueMismatch {
        key: String,
        expected: String,
        received: String,
    },

    /// A dotted config key that cannot be applied to the tree
    #[error("Invalid config key '{0}'")]
    InvalidConfigKey(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for pkgforge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;
