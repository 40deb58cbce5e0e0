//! Building configured plugins from collected options

use super::catalog::PluginCatalog;
use super::collector::{FieldMap, PluginOptions};
use super::details::PluginDetails;
use super::value::OptionValue;
use crate::error::{ForgeError, Result};
use tracing::debug;

/// A plugin kind with a concrete, type-checked configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Plugin {
    /// Canonical catalog name
    pub name: String,

    /// Fields in catalog order. Fields without a value are absent.
    pub fields: FieldMap,
}

impl Plugin {
    pub fn get(&self, field: &str) -> Option<&OptionValue> {
        self.fields.get(field)
    }
}

/// Validates option maps against the catalog and builds [`Plugin`] values
pub struct PluginInstantiator<'a, C: PluginCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: PluginCatalog + ?Sized> PluginInstantiator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Build every requested plugin, in request order
    pub fn instantiate(&self, options: &PluginOptions) -> Result<Vec<Plugin>> {
        options
            .iter()
            .map(|(name, fields)| self.instantiate_one(name, fields))
            .collect()
    }

    /// Build one plugin; unsupplied fields take the catalog default
    pub fn instantiate_one(&self, name: &str, supplied: &FieldMap) -> Result<Plugin> {
        let details = self
            .catalog
            .find(name)
            .ok_or_else(|| ForgeError::UnknownPlugin {
                name: name.to_string(),
                available: self.catalog.available(),
            })?;

        if let Some(unknown) = supplied.keys().find(|f| details.field_index(f).is_none()) {
            return Err(ForgeError::UnknownPluginField {
                plugin: details.name.clone(),
                field: unknown.clone(),
                known: details.fields.join(", "),
            });
        }

        let mut fields = FieldMap::new();
        for (field, field_type, default) in details.entries() {
            let value = match (supplied.get(field), default) {
                (Some(value), _) => field_type
                    .coerce(value.clone())
                    .map_err(|received| mismatch(details, field, received))?,
                (None, Some(default)) => default.clone(),
                // No default: leave the field to the plugin itself
                (None, None) => continue,
            };
            fields.insert(field.to_string(), value);
        }

        debug!(plugin = %details.name, fields = fields.len(), "instantiated plugin");
        Ok(Plugin {
            name: details.name.clone(),
            fields,
        })
    }
}

pub(crate) fn mismatch(details: &PluginDetails, field: &str, received: OptionValue) -> ForgeError {
    let expected = details
        .field_index(field)
        .map(|idx| details.types[idx].to_string())
        .unwrap_or_default();
    ForgeError::PluginFieldTypeMismatch {
        plugin: details.name.clone(),
        field: field.to_string(),
        expected,
        received: format!("{} ({})", received, received.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::catalog::{CatalogSource, ManifestCatalog};

    fn catalog() -> ManifestCatalog {
        ManifestCatalog::load(&CatalogSource::Builtin).unwrap()
    }

    fn request(plugin: &str, fields: Vec<(&str, OptionValue)>) -> PluginOptions {
        let mut options = PluginOptions::new();
        options.insert(
            plugin.to_string(),
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        );
        options
    }

    #[test]
    fn test_unknown_plugin() {
        let catalog = catalog();
        let err = PluginInstantiator::new(&catalog)
            .instantiate(&request("Nope", vec![]))
            .unwrap_err();
        assert!(matches!(err, ForgeError::UnknownPlugin { ref name, .. } if name == "Nope"));
    }

    #[test]
    fn test_no_options_uses_all_defaults() {
        let catalog = catalog();
        let plugins = PluginInstantiator::new(&catalog)
            .instantiate(&request("formatter", vec![]))
            .unwrap();

        let formatter = &plugins[0];
        assert_eq!(formatter.name, "Formatter");
        assert_eq!(formatter.get("style"), Some(&OptionValue::String("nostyle".into())));
        assert_eq!(formatter.get("indent"), Some(&OptionValue::Integer(4)));
    }

    #[test]
    fn test_fields_without_default_are_omitted() {
        let catalog = catalog();
        let plugins = PluginInstantiator::new(&catalog)
            .instantiate(&request("git", vec![]))
            .unwrap();
        assert!(plugins[0].get("name").is_none());
        assert_eq!(plugins[0].get("ssh"), Some(&OptionValue::Bool(false)));
    }

    #[test]
    fn test_supplied_values_override_defaults() {
        let catalog = catalog();
        let plugins = PluginInstantiator::new(&catalog)
            .instantiate(&request(
                "GIT",
                vec![
                    ("ssh", OptionValue::Bool(true)),
                    ("name", OptionValue::String("Ada".into())),
                ],
            ))
            .unwrap();
        assert_eq!(plugins[0].get("ssh"), Some(&OptionValue::Bool(true)));
        assert_eq!(plugins[0].get("name"), Some(&OptionValue::String("Ada".into())));
    }

    #[test]
    fn test_type_mismatch_names_plugin_and_field() {
        let catalog = catalog();
        let err = PluginInstantiator::new(&catalog)
            .instantiate(&request("git", vec![("ssh", OptionValue::String("yes".into()))]))
            .unwrap_err();

        match err {
            ForgeError::PluginFieldTypeMismatch {
                plugin,
                field,
                expected,
                received,
            } => {
                assert_eq!(plugin, "Git");
                assert_eq!(field, "ssh");
                assert_eq!(expected, "bool");
                assert!(received.contains("yes"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_sequence_field_rejects_scalar() {
        let catalog = catalog();
        let result = PluginInstantiator::new(&catalog)
            .instantiate(&request("git", vec![("ignore", OptionValue::String("a".into()))]));
        assert!(matches!(result, Err(ForgeError::PluginFieldTypeMismatch { .. })));
    }

    #[test]
    fn test_unknown_field() {
        let catalog = catalog();
        let result = PluginInstantiator::new(&catalog)
            .instantiate(&request("git", vec![("colour", OptionValue::Bool(true))]));
        assert!(matches!(result, Err(ForgeError::UnknownPluginField { .. })));
    }

    #[test]
    fn test_own_defaults_round_trip() {
        let catalog = catalog();
        let instantiator = PluginInstantiator::new(&catalog);

        for details in catalog.list_plugins() {
            if details.is_argumentless() {
                continue;
            }
            let explicit: FieldMap = details
                .entries()
                .filter_map(|(field, _, default)| Some((field.to_string(), default?.clone())))
                .collect();

            let implicit = instantiator
                .instantiate_one(&details.name, &FieldMap::new())
                .unwrap();
            let with_defaults = instantiator
                .instantiate_one(&details.name, &explicit)
                .unwrap();
            assert_eq!(implicit, with_defaults, "plugin {}", details.name);
        }
    }

    #[test]
    fn test_output_follows_request_order() {
        let catalog = catalog();
        let mut options = request("tests", vec![]);
        options.insert("license".into(), FieldMap::new());
        options.insert("dependabot".into(), FieldMap::new());

        let names: Vec<String> = PluginInstantiator::new(&catalog)
            .instantiate(&options)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Tests", "License", "Dependabot"]);
    }
}
