//! Plugin discovery, option parsing and instantiation
//!
//! This module provides:
//! - The plugin catalog (descriptors with field names, types and defaults)
//! - `key=value` option token parsing with type inference
//! - Collection of per-plugin options from parsed CLI arguments
//! - Type-checked instantiation of configured plugins
//! - Catalog version compatibility checking

pub mod catalog;
pub mod collector;
pub mod details;
pub mod instantiate;
pub mod value;
pub mod version;

pub use catalog::{CatalogSource, FileTemplate, ManifestCatalog, PluginCatalog};
pub use collector::{collect_plugin_options, options_from_tree, options_to_tree, FieldMap, PluginOptions};
pub use details::{FieldType, PluginDetails};
pub use instantiate::{Plugin, PluginInstantiator};
pub use value::{infer_value, parse_option, split_option, OptionValue};
pub use version::check_compatibility;
