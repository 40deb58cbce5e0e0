//! PkgForge Core - Shared library for plugin-driven package scaffolding
//!
//! A package is generated from a set of plugins, each a named unit with typed
//! fields (a Git setup, a formatter config, a CI workflow, ...). The plugin
//! catalog drives both the command line, where every plugin gets its own
//! `--<plugin> KEY=VALUE...` option, and validation of what the user asks for.
//!
//! # Architecture
//!
//! - **Plugins** - catalog, `key=value` parsing, option collection, instantiation
//! - **Config** - configuration trees, layered merging, the persisted file
//! - **CLI** - the argument schema built from the catalog
//! - **Dispatch** - command routing and uniform [`CommandResult`]s
//! - **Engine** - rendering plugin templates into a package directory
//! - **TUI** - optional cliclack prompts and spinners (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompts module
//!
//! # Example Usage
//!
//! ```ignore
//! use pkgforge_core::{CatalogSource, ConfigStore, Dispatcher, FsEngine, ManifestCatalog};
//!
//! let catalog = ManifestCatalog::load(&CatalogSource::from_config(&MyConfig))?;
//! let engine = FsEngine::from_catalog(&catalog);
//! let store = ConfigStore::from_config(&MyConfig);
//! let dispatcher = Dispatcher::new(MyConfig, catalog, store, engine, "0.1.0")?;
//!
//! let invocation = dispatcher.schema().parse_from(std::env::args_os())?;
//! let result = dispatcher.dispatch(&invocation).await;
//! result.display();
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod plugins;
pub mod product;
pub mod runtime;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use cli::{ArgumentSchema, ArgumentSchemaBuilder, Invocation, RawArg, RawArgs};
pub use config::{merge, ConfigStore, ConfigTree, ConfigValue};
pub use dispatch::{CommandId, CommandResult, Dispatcher};
pub use engine::{FsEngine, GenerationReport, GenerationRequest, TemplateEngine};
pub use error::{ForgeError, Result};
pub use plugins::{
    parse_option, CatalogSource, FieldType, ManifestCatalog, OptionValue, Plugin, PluginCatalog,
    PluginDetails, PluginInstantiator,
};
pub use product::ProductConfig;
