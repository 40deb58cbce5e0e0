//! Configuration trees and layered merging

use crate::error::{ForgeError, Result};
use crate::plugins::value::OptionValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration layer: string keys in insertion order
pub type ConfigTree = IndexMap<String, ConfigValue>;

/// A value in a configuration tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// "Not specified": never overrides a value from a lower layer
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigValue>),
    Tree(ConfigTree),
}

impl ConfigValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            ConfigValue::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// Convert to a plugin option value. `Ok(None)` for Null; nested
    /// structures are rejected.
    pub fn to_option_value(&self) -> std::result::Result<Option<OptionValue>, String> {
        let value = match self {
            ConfigValue::Null => return Ok(None),
            ConfigValue::Bool(b) => OptionValue::Bool(*b),
            ConfigValue::Integer(n) => OptionValue::Integer(*n),
            ConfigValue::Float(f) => OptionValue::Float(*f),
            ConfigValue::String(s) => OptionValue::String(s.clone()),
            ConfigValue::Sequence(items) => {
                let mut strings = Vec::with_capacity(items.len());
                for item in items {
                    match item.to_option_value()? {
                        Some(OptionValue::Sequence(_)) => return Err(self.to_string()),
                        Some(scalar) => strings.push(scalar.as_text()),
                        None => {}
                    }
                }
                OptionValue::Sequence(strings)
            }
            ConfigValue::Tree(_) => return Err(self.to_string()),
        };
        Ok(Some(value))
    }
}

impl From<OptionValue> for ConfigValue {
    fn from(value: OptionValue) -> Self {
        match value {
            OptionValue::Bool(b) => ConfigValue::Bool(b),
            OptionValue::Integer(n) => ConfigValue::Integer(n),
            OptionValue::Float(f) => ConfigValue::Float(f),
            OptionValue::String(s) => ConfigValue::String(s),
            OptionValue::Sequence(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::String).collect())
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<Option<String>> for ConfigValue {
    fn from(value: Option<String>) -> Self {
        value.map(ConfigValue::String).unwrap_or_default()
    }
}

impl From<ConfigTree> for ConfigValue {
    fn from(value: ConfigTree) -> Self {
        ConfigValue::Tree(value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(n) => write!(f, "{}", n),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::String(s) => write!(f, "{:?}", s),
            ConfigValue::Sequence(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            ConfigValue::Tree(tree) => {
                let entries: Vec<String> =
                    tree.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
        }
    }
}

/// Merge `overlay` on top of `base`, returning a new tree.
///
/// Trees on both sides merge recursively. Otherwise the overlay value wins,
/// unless it is Null and `base` already has the key.
pub fn merge(base: &ConfigTree, overlay: &ConfigTree) -> ConfigTree {
    let mut merged = base.clone();

    for (key, value) in overlay {
        let next = match (merged.get(key), value) {
            (Some(ConfigValue::Tree(lower)), ConfigValue::Tree(upper)) => {
                ConfigValue::Tree(merge(lower, upper))
            }
            (Some(_), ConfigValue::Null) => continue,
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }

    merged
}

/// Look up a dotted path such as `plugins.git.ssh`
pub fn get_path<'a>(tree: &'a ConfigTree, path: &str) -> Option<&'a ConfigValue> {
    let mut segments = path.split('.');
    let mut current = tree.get(segments.next()?)?;
    for segment in segments {
        current = current.as_tree()?.get(segment)?;
    }
    Some(current)
}

/// Set a dotted path, creating intermediate trees as needed
pub fn set_path(tree: &mut ConfigTree, path: &str, value: ConfigValue) -> Result<()> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ForgeError::InvalidConfigKey(path.to_string()));
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| ForgeError::InvalidConfigKey(path.to_string()))?;

    let mut current = tree;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| ConfigValue::Tree(ConfigTree::new()));
        current = match entry {
            ConfigValue::Tree(sub) => sub,
            _ => return Err(ForgeError::InvalidConfigKey(path.to_string())),
        };
    }

    current.insert(last.to_string(), value);
    Ok(())
}
