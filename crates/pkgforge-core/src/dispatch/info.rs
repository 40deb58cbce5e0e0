//! `plugin-info` and `completion`

use super::{CommandResult, Dispatcher};
use crate::cli::RawArgs;
use crate::config::{ConfigTree, ConfigValue};
use crate::engine::TemplateEngine;
use crate::error::{ForgeError, Result};
use crate::plugins::{PluginCatalog, PluginDetails};
use crate::product::ProductConfig;
use clap_complete::Shell;
use colored::Colorize;

impl<P: ProductConfig, E: TemplateEngine> Dispatcher<P, E> {
    pub(super) fn plugin_info(&self, args: &RawArgs) -> Result<CommandResult> {
        let selected: Vec<&PluginDetails> = match args.get("plugin_name").and_then(|a| a.as_value()) {
            Some(name) => {
                let details = self.catalog.find(name).ok_or_else(|| ForgeError::UnknownPlugin {
                    name: name.to_string(),
                    available: self.catalog.available(),
                })?;
                vec![details]
            }
            None => self.catalog.list_plugins().iter().collect(),
        };

        let message = selected
            .iter()
            .map(|details| describe(details))
            .collect::<Vec<_>>()
            .join("\n\n");
        let data = selected
            .iter()
            .map(|details| (details.name.clone(), details_tree(details)));

        Ok(CommandResult::success(message).with_data(data))
    }

    pub(super) fn completion(&self, args: &RawArgs) -> Result<CommandResult> {
        let name = args.get("shell").and_then(|a| a.as_value()).unwrap_or_default();
        let Ok(shell) = name.parse::<Shell>() else {
            return Ok(CommandResult::failure(format!(
                "Unsupported shell '{}': expected bash, zsh or fish",
                name
            )));
        };

        let mut command = self.schema.command.clone();
        let mut script = Vec::new();
        clap_complete::generate(shell, &mut command, self.product.name(), &mut script);

        Ok(CommandResult::success(String::from_utf8_lossy(&script).trim_end().to_string()))
    }
}

fn describe(details: &PluginDetails) -> String {
    let mut lines = vec![format!("{} - {}", details.name.bold(), details.description)];
    if details.is_argumentless() {
        lines.push("  (no options)".dimmed().to_string());
        return lines.join("\n");
    }

    let width = details.fields.iter().map(String::len).max().unwrap_or(0);
    for (field, ty, default) in details.entries() {
        let default = match default {
            Some(value) => format!("default: {}", value),
            None => "no default".to_string(),
        };
        lines.push(format!(
            "  {:<width$}  {} {}",
            field,
            format!("{:<10}", ty.to_string()).cyan(),
            default.dimmed(),
            width = width
        ));
    }
    lines.join("\n")
}

fn details_tree(details: &PluginDetails) -> ConfigValue {
    let fields: ConfigTree = details
        .entries()
        .map(|(field, ty, default)| {
            let mut entry = ConfigTree::new();
            entry.insert("type".into(), ty.to_string().into());
            entry.insert(
                "default".into(),
                default.cloned().map(ConfigValue::from).unwrap_or_default(),
            );
            (field.to_string(), ConfigValue::Tree(entry))
        })
        .collect();

    let mut tree = ConfigTree::new();
    tree.insert("description".into(), details.description.as_str().into());
    tree.insert("fields".into(), ConfigValue::Tree(fields));
    ConfigValue::Tree(tree)
}
