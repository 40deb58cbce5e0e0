//! `config show` and `config set`

use super::{CommandResult, Dispatcher};
use crate::cli::RawArgs;
use crate::config::{set_path, ConfigTree, ConfigValue, PLUGINS_KEY, TEXT_KEYS, WITH_MISE_KEY};
use crate::engine::TemplateEngine;
use crate::error::{ForgeError, Result};
use crate::plugins::instantiate::mismatch;
use crate::plugins::{infer_value, split_option, PluginCatalog};
use crate::product::ProductConfig;
use colored::Colorize;
use tracing::info;

impl<P: ProductConfig, E: TemplateEngine> Dispatcher<P, E> {
    pub(super) fn config_show(&self, effective: &ConfigTree) -> Result<CommandResult> {
        let yaml = serde_yaml::to_string(effective).map_err(std::io::Error::other)?;
        let message = format!(
            "{} {}\n\n{}",
            "Config file:".cyan().bold(),
            self.store.path().display(),
            yaml.trim_end()
        );
        Ok(CommandResult::success(message).with_data(effective.clone()))
    }

    pub(super) fn config_set(&self, args: &RawArgs, dry_run: bool) -> Result<CommandResult> {
        // A corrupt file is reported rather than overwritten
        let mut tree = self.store.load()?;

        let entries = match args.get("entries").map(|a| a.values()) {
            Some(tokens) if !tokens.is_empty() => tokens
                .iter()
                .map(|token| {
                    let (key, raw) = split_option(token)?;
                    Ok((key.to_string(), self.read_entry(key, raw)))
                })
                .collect::<Result<Vec<_>>>()?,
            _ => self.prompt_entries(&tree)?,
        };

        if entries.is_empty() {
            return Ok(CommandResult::failure(
                "Nothing to set: pass KEY=VALUE entries, e.g. `config set author=\"Jane Doe\"`",
            ));
        }

        // Every entry is checked before the tree is touched
        let entries = entries
            .into_iter()
            .map(|(key, value)| {
                let value = self.check_entry(&key, value)?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>>>()?;
        for (key, value) in &entries {
            set_path(&mut tree, key, value.clone())?;
        }

        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        let path = self.store.path().display();
        if dry_run {
            return Ok(CommandResult::success(format!(
                "Dry run: would set {} in {}",
                keys.join(", "),
                path
            ))
            .with_data(entries));
        }

        self.store.save(&tree)?;
        info!(keys = ?keys, "configuration updated");
        Ok(CommandResult::success(format!("Set {} in {}", keys.join(", "), path)).with_data(entries))
    }

    #[cfg(feature = "tui")]
    fn prompt_entries(&self, current: &ConfigTree) -> Result<Vec<(String, ConfigValue)>> {
        if !self.interactive {
            return Ok(Vec::new());
        }
        Ok(crate::tui::prompt_config_entries(
            self.product.display_name(),
            current,
        )?)
    }

    #[cfg(not(feature = "tui"))]
    fn prompt_entries(&self, _current: &ConfigTree) -> Result<Vec<(String, ConfigValue)>> {
        Ok(Vec::new())
    }

    /// Text keys and string plugin fields keep the raw text; anything else
    /// is type-inferred
    fn read_entry(&self, key: &str, raw: &str) -> ConfigValue {
        if TEXT_KEYS.contains(&key) {
            return ConfigValue::from(raw);
        }

        let segments: Vec<&str> = key.split('.').map(str::trim).collect();
        let declared = match segments.as_slice() {
            [root, name, field] if *root == PLUGINS_KEY => {
                self.catalog.find(name).and_then(|details| {
                    let idx = details.field_index(field)?;
                    Some(details.types[idx].read(raw))
                })
            }
            _ => None,
        };
        declared.unwrap_or_else(|| infer_value(raw)).into()
    }

    /// Check a key and its value, returning the value to store.
    ///
    /// Keys under `plugins` must name catalog plugins and their fields, and
    /// field values are coerced to the declared type. Built-in keys must
    /// hold a value of their own type.
    fn check_entry(&self, key: &str, value: ConfigValue) -> Result<ConfigValue> {
        let segments: Vec<&str> = key.split('.').map(str::trim).collect();
        match segments.as_slice() {
            [root, rest @ ..] if *root == PLUGINS_KEY => self.check_plugin_entry(key, rest, value),
            [text] if TEXT_KEYS.contains(text) => match value {
                ConfigValue::String(_) | ConfigValue::Null => Ok(value),
                other => Err(value_mismatch(key, "string", &other)),
            },
            [flag] if *flag == WITH_MISE_KEY => match value {
                ConfigValue::Bool(_) | ConfigValue::Null => Ok(value),
                other => Err(value_mismatch(key, "bool", &other)),
            },
            [root, _, ..] if TEXT_KEYS.contains(root) || *root == WITH_MISE_KEY => {
                Err(ForgeError::InvalidConfigKey(key.to_string()))
            }
            _ => Ok(value),
        }
    }

    fn check_plugin_entry(&self, key: &str, path: &[&str], value: ConfigValue) -> Result<ConfigValue> {
        let Some((name, path)) = path.split_first() else {
            return Err(ForgeError::InvalidConfigKey(key.to_string()));
        };
        let details = self
            .catalog
            .find(name)
            .ok_or_else(|| ForgeError::UnknownPlugin {
                name: name.to_string(),
                available: self.catalog.available(),
            })?;

        let field = match path {
            // plugins.<name>=true|false enables or disables the plugin
            [] if matches!(value, ConfigValue::Bool(_)) => return Ok(value),
            [field] => *field,
            _ => return Err(ForgeError::InvalidConfigKey(key.to_string())),
        };
        let Some(idx) = details.field_index(field) else {
            return Err(ForgeError::UnknownPluginField {
                plugin: details.name.clone(),
                field: field.to_string(),
                known: details.fields.join(", "),
            });
        };

        let field_type = &details.types[idx];
        let option = value
            .to_option_value()
            .map_err(|received| ForgeError::PluginFieldTypeMismatch {
                plugin: details.name.clone(),
                field: field.to_string(),
                expected: field_type.to_string(),
                received,
            })?;
        match option {
            // Null clears the field so the catalog default applies
            None => Ok(ConfigValue::Null),
            Some(option) => field_type
                .coerce(option)
                .map(ConfigValue::from)
                .map_err(|received| mismatch(details, field, received)),
        }
    }
}

fn value_mismatch(key: &str, expected: &str, received: &ConfigValue) -> ForgeError {
    ForgeError::ConfigValueMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        received: received.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::config::{get_path, ConfigStore, ConfigValue};
    use crate::error::ForgeError;

    #[tokio::test]
    async fn test_show_merges_defaults_and_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "author: Ada\n").unwrap();
        let d = dispatcher(dir.path());

        let result = d.dispatch(&invoke(&d, &["config", "show"])).await;
        assert!(result.success);

        let message = result.message.unwrap();
        assert!(message.contains("config.yaml"));
        assert!(message.contains("author: Ada"));
        assert!(message.contains("output_dir"));

        let data = result.data.unwrap();
        assert_eq!(data["author"], ConfigValue::from("Ada"));
        assert_eq!(data["with_mise"], ConfigValue::Bool(false));
    }

    #[tokio::test]
    async fn test_bare_config_shows() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());
        let result = d.dispatch(&invoke(&d, &["config"])).await;
        assert!(result.success);
        assert!(result.data.unwrap().contains_key("output_dir"));
    }

    #[tokio::test]
    async fn test_set_persists_dotted_keys() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d
            .dispatch(&invoke(
                &d,
                &["config", "set", "author=Ada Lovelace", "plugins.git.ssh=true", "plugins.formatter.indent=2"],
            ))
            .await;
        assert!(result.success, "{:?}", result.message);

        let saved = ConfigStore::new(dir.path().join("config.yaml")).load().unwrap();
        assert_eq!(saved["author"], ConfigValue::from("Ada Lovelace"));
        assert_eq!(get_path(&saved, "plugins.git.ssh"), Some(&ConfigValue::Bool(true)));
        assert_eq!(
            get_path(&saved, "plugins.formatter.indent"),
            Some(&ConfigValue::Integer(2))
        );
    }

    #[tokio::test]
    async fn test_set_keeps_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "user: ada\n").unwrap();
        let d = dispatcher(dir.path());

        d.dispatch(&invoke(&d, &["config", "set", "author=Ada"])).await;

        let saved = ConfigStore::new(dir.path().join("config.yaml")).load().unwrap();
        assert_eq!(saved["user"], ConfigValue::from("ada"));
        assert_eq!(saved["author"], ConfigValue::from("Ada"));
    }

    #[tokio::test]
    async fn test_set_rejects_unknown_plugin_and_field() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d
            .dispatch(&invoke(&d, &["config", "set", "plugins.nope.x=1"]))
            .await;
        assert!(!result.success);
        assert!(result.message.unwrap().contains("'nope' not found"));

        let result = d
            .dispatch(&invoke(&d, &["config", "set", "plugins.git.colour=red"]))
            .await;
        assert!(!result.success);
        assert!(result.message.unwrap().contains("colour"));
        assert!(!dir.path().join("config.yaml").exists());
    }

    #[tokio::test]
    async fn test_set_can_disable_plugin() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d
            .dispatch(&invoke(&d, &["config", "set", "plugins.git=false"]))
            .await;
        assert!(result.success);

        let saved = ConfigStore::new(dir.path().join("config.yaml")).load().unwrap();
        assert_eq!(get_path(&saved, "plugins.git"), Some(&ConfigValue::Bool(false)));
    }

    #[tokio::test]
    async fn test_set_refuses_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "author: [oops\n").unwrap();
        let d = dispatcher(dir.path());

        let result = d.dispatch(&invoke(&d, &["config", "set", "author=Ada"])).await;
        assert!(!result.success);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "author: [oops\n");
    }

    #[tokio::test]
    async fn test_set_dry_run_does_not_save() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d
            .dispatch(&invoke(&d, &["--dry-run", "config", "set", "author=Ada"]))
            .await;
        assert!(result.success);
        assert!(!dir.path().join("config.yaml").exists());
    }

    #[tokio::test]
    async fn test_set_without_entries_fails_non_interactively() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d.dispatch(&invoke(&d, &["config", "set"])).await;
        assert!(!result.success);
    }

    #[test]
    fn test_check_entry_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        assert!(d.check_entry("author", "x".into()).is_ok());
        assert!(d.check_entry("plugins.Git.ssh", true.into()).is_ok());
        assert!(matches!(
            d.check_entry("plugins", true.into()),
            Err(ForgeError::InvalidConfigKey(_))
        ));
        assert!(matches!(
            d.check_entry("plugins.git", "on".into()),
            Err(ForgeError::InvalidConfigKey(_))
        ));
        assert!(matches!(
            d.check_entry("plugins.git.ssh.deep", true.into()),
            Err(ForgeError::InvalidConfigKey(_))
        ));
        assert!(matches!(
            d.check_entry("author.first", "Ada".into()),
            Err(ForgeError::InvalidConfigKey(_))
        ));
    }

    #[test]
    fn test_check_entry_coerces_field_values() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        assert_eq!(
            d.check_entry("plugins.codecov.threshold", ConfigValue::Integer(2)).unwrap(),
            ConfigValue::Float(2.0)
        );
        assert!(d.check_entry("plugins.git.name", ConfigValue::Null).unwrap().is_null());
        assert!(matches!(
            d.check_entry("with_mise", "yes".into()),
            Err(ForgeError::ConfigValueMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_rejects_mistyped_plugin_field() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d
            .dispatch(&invoke(&d, &["config", "set", "plugins.git.ssh=yes"]))
            .await;
        assert!(!result.success);
        assert!(result.message.unwrap().contains("expects bool"));
        assert!(!dir.path().join("config.yaml").exists());

        let result = d.dispatch(&invoke(&d, &["create", "MyPkg"])).await;
        assert!(result.success, "{:?}", result.message);
    }

    #[tokio::test]
    async fn test_set_stores_text_keys_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d
            .dispatch(&invoke(
                &d,
                &["config", "set", "output_dir=2024", "user=007", "plugins.projectfile.version=1.10"],
            ))
            .await;
        assert!(result.success, "{:?}", result.message);

        let saved = ConfigStore::new(dir.path().join("config.yaml")).load().unwrap();
        assert_eq!(saved["output_dir"], ConfigValue::from("2024"));
        assert_eq!(saved["user"], ConfigValue::from("007"));
        assert_eq!(
            get_path(&saved, "plugins.projectfile.version"),
            Some(&ConfigValue::from("1.10"))
        );

        d.dispatch(&invoke(&d, &["create", "MyPkg"])).await;
        let requests = d.engine.requests.borrow();
        assert!(requests[0].target_dir().starts_with("2024"));
    }
}
