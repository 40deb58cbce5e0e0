//! Layered configuration
//!
//! Three layers make up the effective configuration, lowest first:
//! built-in defaults, the persisted config file, and the command line.

pub mod store;
pub mod tree;

pub use store::ConfigStore;
pub use tree::{get_path, merge, set_path, ConfigTree, ConfigValue};

use tracing::warn;

/// Key of the per-plugin options subtree
pub const PLUGINS_KEY: &str = "plugins";

/// Built-in keys holding free text
pub const TEXT_KEYS: [&str; 3] = ["author", "user", "output_dir"];

/// Built-in flag enabling the mise tool file
pub const WITH_MISE_KEY: &str = "with_mise";

/// Built-in defaults, the lowest layer
pub fn builtin_defaults() -> ConfigTree {
    let mut tree = ConfigTree::new();
    tree.insert("author".into(), ConfigValue::Null);
    tree.insert("user".into(), ConfigValue::Null);
    tree.insert("output_dir".into(), ".".into());
    tree.insert(WITH_MISE_KEY.into(), false.into());
    tree.insert(PLUGINS_KEY.into(), ConfigValue::Tree(ConfigTree::new()));
    tree
}

/// Load the file layer, falling back to an empty tree if the file is corrupt
pub fn load_file_layer(store: &ConfigStore) -> ConfigTree {
    match store.load() {
        Ok(tree) => tree,
        Err(e) => {
            warn!("{}; continuing with default configuration", e);
            ConfigTree::new()
        }
    }
}

/// `merge(merge(defaults, file), cli)`, with plugin keys lower-cased first
pub fn effective_config(file: &ConfigTree, cli: &ConfigTree) -> ConfigTree {
    let layered = merge(&builtin_defaults(), &normalize_plugin_keys(file));
    merge(&layered, &normalize_plugin_keys(cli))
}

/// Lower-case the names in the `plugins` subtree so `Git` and `git` meet
pub fn normalize_plugin_keys(tree: &ConfigTree) -> ConfigTree {
    let mut normalized = tree.clone();
    if let Some(ConfigValue::Tree(plugins)) = tree.get(PLUGINS_KEY) {
        let lowered: ConfigTree = plugins
            .iter()
            .map(|(name, value)| (name.to_lowercase(), value.clone()))
            .collect();
        normalized.insert(PLUGINS_KEY.into(), ConfigValue::Tree(lowered));
    }
    normalized
}
