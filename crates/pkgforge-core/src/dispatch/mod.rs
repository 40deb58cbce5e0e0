//! Command routing
//!
//! A parsed [`Invocation`] names one [`CommandId`]. The [`Dispatcher`] loads
//! the configuration layers, hands the command its arguments together with
//! the effective configuration, and turns whatever comes back, including
//! errors, into a single [`CommandResult`].

mod config;
mod create;
mod info;

use crate::cli::{ArgumentSchema, ArgumentSchemaBuilder, Invocation, RawArgs};
use crate::config::{
    effective_config, load_file_layer, ConfigStore, ConfigTree, ConfigValue, PLUGINS_KEY,
    TEXT_KEYS, WITH_MISE_KEY,
};
use crate::engine::TemplateEngine;
use crate::error::Result;
use crate::plugins::{check_compatibility, collect_plugin_options, options_to_tree, ManifestCatalog};
use crate::product::ProductConfig;
use colored::Colorize;
use std::fmt;
use tracing::{debug, warn};

/// Every command the CLI can run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandId {
    Create,
    ConfigShow,
    ConfigSet,
    PluginInfo,
    Completion,
    /// No command given
    Help,
    Unrecognized(String),
}

impl CommandId {
    pub fn name(&self) -> &str {
        match self {
            CommandId::Create => "create",
            CommandId::ConfigShow => "config show",
            CommandId::ConfigSet => "config set",
            CommandId::PluginInfo => "plugin-info",
            CommandId::Completion => "completion",
            CommandId::Help => "help",
            CommandId::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The outcome of one command
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandResult {
    pub success: bool,
    /// Shown to the user; nothing is printed when absent
    pub message: Option<String>,
    /// Structured payload, always string-keyed
    pub data: Option<ConfigTree>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Success with nothing to display
    pub fn silent() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Attach data, converting keys to strings and values to [`ConfigValue`]
    pub fn with_data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: Into<ConfigValue>,
    {
        let tree: ConfigTree = data
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.into()))
            .collect();
        self.data = Some(tree);
        self
    }

    /// Process exit status: 0 iff the command succeeded
    pub fn exit_code(&self) -> u8 {
        if self.success {
            0
        } else {
            1
        }
    }

    /// Print the message: stdout on success, one red line on stderr on failure
    pub fn display(&self) {
        let Some(message) = &self.message else {
            return;
        };
        if self.success {
            println!("{}", message);
        } else {
            let line = message.lines().collect::<Vec<_>>().join(" ");
            eprintln!("{} {}", "error:".red().bold(), line);
        }
    }
}

/// Routes invocations to their handlers
pub struct Dispatcher<P: ProductConfig, E: TemplateEngine> {
    product: P,
    catalog: ManifestCatalog,
    schema: ArgumentSchema,
    store: ConfigStore,
    engine: E,
    cli_version: &'static str,
    #[cfg_attr(not(feature = "tui"), allow(dead_code))]
    interactive: bool,
}

impl<P: ProductConfig, E: TemplateEngine> Dispatcher<P, E> {
    /// Build the dispatcher and the CLI schema derived from the catalog
    pub fn new(
        product: P,
        catalog: ManifestCatalog,
        store: ConfigStore,
        engine: E,
        cli_version: &'static str,
    ) -> Result<Self> {
        let schema = ArgumentSchemaBuilder::new(&catalog, &product, cli_version).build()?;
        Ok(Self {
            product,
            catalog,
            schema,
            store,
            engine,
            cli_version,
            interactive: false,
        })
    }

    /// Allow prompts and spinners (only has an effect with the `tui` feature)
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn schema(&self) -> &ArgumentSchema {
        &self.schema
    }

    pub fn catalog(&self) -> &ManifestCatalog {
        &self.catalog
    }

    /// Warn when the catalog was written for a newer CLI
    pub fn check_catalog_version(&self) {
        if let Some(warning) = check_compatibility(
            self.cli_version,
            self.catalog.version(),
            self.product.upgrade_command(),
        ) {
            warn!("{}", warning);
        }
    }

    /// Run one invocation. Never fails: errors become a failing result.
    pub async fn dispatch(&self, invocation: &Invocation) -> CommandResult {
        debug!(command = %invocation.command, dry_run = invocation.dry_run, "dispatching");

        match self.run(invocation).await {
            Ok(result) => result,
            Err(e) => {
                debug!(error = ?e, "command failed");
                CommandResult::failure(e.to_string())
            }
        }
    }

    async fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        let args = &invocation.args;
        let dry_run = invocation.dry_run;

        match &invocation.command {
            CommandId::Help => Ok(CommandResult::success(self.schema.help())),
            CommandId::Unrecognized(name) => Ok(CommandResult::failure(format!(
                "Unrecognized command '{}'",
                name
            ))),
            CommandId::Create => {
                let cli = self.create_layer(args)?;
                let effective = effective_config(&load_file_layer(&self.store), &cli);
                self.create(args, &effective, dry_run).await
            }
            CommandId::ConfigShow => {
                let effective = effective_config(&load_file_layer(&self.store), &ConfigTree::new());
                self.config_show(&effective)
            }
            CommandId::ConfigSet => self.config_set(args, dry_run),
            CommandId::PluginInfo => self.plugin_info(args),
            CommandId::Completion => self.completion(args),
        }
    }

    /// The command-line layer of `create`; options not given are Null
    fn create_layer(&self, args: &RawArgs) -> Result<ConfigTree> {
        let mut tree = ConfigTree::new();
        for key in TEXT_KEYS {
            let value = args.get(key).and_then(|a| a.as_value()).map(str::to_string);
            tree.insert(key.to_string(), value.into());
        }

        let with_mise = args.get(WITH_MISE_KEY).is_some_and(|a| a.as_flag());
        tree.insert(
            WITH_MISE_KEY.to_string(),
            if with_mise {
                ConfigValue::Bool(true)
            } else {
                ConfigValue::Null
            },
        );

        let plugins = collect_plugin_options(args, &self.catalog)?;
        tree.insert(PLUGINS_KEY.to_string(), options_to_tree(&plugins).into());
        Ok(tree)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::engine::{GenerationReport, GenerationRequest};
    use crate::error::ForgeError;
    use crate::plugins::CatalogSource;
    use crate::product::testing::TestProduct;
    use std::cell::RefCell;
    use std::path::Path;

    /// Engine that records requests instead of writing files
    #[derive(Default)]
    pub struct RecordingEngine {
        pub requests: RefCell<Vec<GenerationRequest>>,
        pub fail: bool,
    }

    impl TemplateEngine for RecordingEngine {
        async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReport> {
            self.requests.borrow_mut().push(request.clone());
            if self.fail {
                return Err(ForgeError::PackageGenerationFailure("disk full".into()));
            }
            Ok(GenerationReport {
                root: request.target_dir(),
                files: vec!["README.md".into()],
                dry_run: request.dry_run,
            })
        }
    }

    pub fn dispatcher(config_dir: &Path) -> Dispatcher<TestProduct, RecordingEngine> {
        dispatcher_with(config_dir, RecordingEngine::default())
    }

    pub fn dispatcher_with(
        config_dir: &Path,
        engine: RecordingEngine,
    ) -> Dispatcher<TestProduct, RecordingEngine> {
        let catalog = ManifestCatalog::load(&CatalogSource::Builtin).unwrap();
        let store = ConfigStore::new(config_dir.join("config.yaml"));
        Dispatcher::new(TestProduct, catalog, store, engine, "0.1.0").unwrap()
    }

    pub fn invoke(
        dispatcher: &Dispatcher<TestProduct, RecordingEngine>,
        argv: &[&str],
    ) -> Invocation {
        let mut args = vec!["pkgforge"];
        args.extend_from_slice(argv);
        dispatcher.schema().parse_from(args).unwrap()
    }
}
