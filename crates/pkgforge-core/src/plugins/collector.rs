//! Collecting plugin options out of the parsed argument map

use super::catalog::PluginCatalog;
use super::value::{infer_value, split_option, OptionValue};
use crate::cli::{RawArg, RawArgs};
use crate::config::tree::{ConfigTree, ConfigValue};
use crate::error::{ForgeError, Result};
use indexmap::IndexMap;
use tracing::debug;

/// Field name → typed value for one plugin
pub type FieldMap = IndexMap<String, OptionValue>;

/// Lower-cased plugin name → its field map, in request order
pub type PluginOptions = IndexMap<String, FieldMap>;

/// Pull the plugin options out of `args`.
///
/// Only `--<plugin>` keys naming a catalog plugin are considered. Tokens are
/// applied in order, so a repeated field keeps its last value. A plugin
/// requested without tokens still gets an (empty) entry. Values of declared
/// string fields are kept exactly as typed; `version=1.10` stays `"1.10"`.
pub fn collect_plugin_options<C>(args: &RawArgs, catalog: &C) -> Result<PluginOptions>
where
    C: PluginCatalog + ?Sized,
{
    let mut options = PluginOptions::new();

    for (key, arg) in args {
        let Some(name) = key.strip_prefix("--") else {
            continue;
        };
        let Some(details) = catalog.find(name) else {
            continue;
        };

        let tokens: &[String] = match arg {
            RawArg::Flag(false) => continue,
            RawArg::Flag(true) => &[],
            RawArg::Value(token) => std::slice::from_ref(token),
            RawArg::Values(tokens) => tokens,
        };

        let fields = options.entry(name.to_lowercase()).or_default();
        for token in tokens {
            let (field, raw) = split_option(token)?;
            // Undeclared fields are inferred and rejected at instantiation
            let value = match details.field_index(field) {
                Some(idx) => details.types[idx].read(raw),
                None => infer_value(raw),
            };
            fields.insert(field.to_string(), value);
        }
        debug!(plugin = name, fields = fields.len(), "collected plugin options");
    }

    Ok(options)
}

/// Render plugin options as the `plugins` subtree of a configuration layer
pub fn options_to_tree(options: &PluginOptions) -> ConfigTree {
    options
        .iter()
        .map(|(plugin, fields)| {
            let fields: ConfigTree = fields
                .iter()
                .map(|(field, value)| (field.clone(), ConfigValue::from(value.clone())))
                .collect();
            (plugin.clone(), ConfigValue::Tree(fields))
        })
        .collect()
}

/// Read plugin options back from a merged `plugins` subtree.
///
/// A plugin whose entry is `false` is disabled; `true`, null or a mapping
/// enable it. Null fields are left out so catalog defaults apply.
pub fn options_from_tree<C>(tree: &ConfigTree, catalog: &C) -> Result<PluginOptions>
where
    C: PluginCatalog + ?Sized,
{
    let mut options = PluginOptions::new();

    for (plugin, entry) in tree {
        let plugin = plugin.to_lowercase();
        let fields = match entry {
            ConfigValue::Bool(false) => continue,
            ConfigValue::Bool(true) | ConfigValue::Null => FieldMap::new(),
            ConfigValue::Tree(fields) => fields_from_tree(&plugin, fields, catalog)?,
            _ => return Err(ForgeError::InvalidConfigKey(format!("plugins.{}", plugin))),
        };
        options.insert(plugin, fields);
    }

    Ok(options)
}

fn fields_from_tree<C>(plugin: &str, tree: &ConfigTree, catalog: &C) -> Result<FieldMap>
where
    C: PluginCatalog + ?Sized,
{
    let mut fields = FieldMap::new();

    for (field, value) in tree {
        match value.to_option_value() {
            Ok(Some(value)) => {
                fields.insert(field.clone(), value);
            }
            Ok(None) => {}
            Err(received) => {
                let expected = catalog
                    .find(plugin)
                    .and_then(|details| {
                        let idx = details.field_index(field)?;
                        Some(details.types[idx].to_string())
                    })
                    .unwrap_or_else(|| "a scalar or list".to_string());
                return Err(ForgeError::PluginFieldTypeMismatch {
                    plugin: plugin.to_string(),
                    field: field.clone(),
                    expected,
                    received,
                });
            }
        }
    }

    Ok(fields)
}
