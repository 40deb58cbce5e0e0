//! Building the CLI schema from the plugin catalog

use super::{RawArg, RawArgs};
use crate::dispatch::CommandId;
use crate::error::{ForgeError, Result};
use crate::plugins::{split_option, PluginCatalog};
use crate::product::ProductConfig;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;

/// Option names of `create` that no plugin may take
pub const RESERVED_CREATE_OPTIONS: &[&str] = &[
    "package_name",
    "package-name",
    "author",
    "user",
    "output_dir",
    "output-dir",
    "with_mise",
    "with-mise",
    "help",
    "verbose",
    "dry_run",
    "dry-run",
];

/// Shells `completion` can generate scripts for
pub const SUPPORTED_SHELLS: [&str; 3] = ["bash", "zsh", "fish"];

/// A dynamically generated `--<plugin>` option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOption {
    /// Lower-cased plugin name, used as both arg id and long flag
    pub id: String,
    pub argumentless: bool,
}

/// The full CLI definition plus what is needed to read matches back
#[derive(Debug, Clone)]
pub struct ArgumentSchema {
    pub command: Command,
    pub plugin_options: Vec<PluginOption>,
}

/// What one CLI invocation asks for
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: CommandId,
    pub args: RawArgs,
    pub verbosity: u8,
    pub dry_run: bool,
}

pub struct ArgumentSchemaBuilder<'a, C: PluginCatalog + ?Sized, P: ProductConfig> {
    catalog: &'a C,
    product: &'a P,
    version: &'static str,
}

impl<'a, C: PluginCatalog + ?Sized, P: ProductConfig> ArgumentSchemaBuilder<'a, C, P> {
    pub fn new(catalog: &'a C, product: &'a P, version: &'static str) -> Self {
        Self {
            catalog,
            product,
            version,
        }
    }

    /// Build the schema: fixed subcommands plus one `create` option per
    /// plugin kind
    pub fn build(&self) -> Result<ArgumentSchema> {
        let plugin_options = self.plugin_options()?;

        let mut create = create_command();
        for option in &plugin_options {
            create = create.arg(self.plugin_arg(option));
        }

        let command = Command::new(self.product.name())
            .version(self.version)
            .about(self.product.cli_description())
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::Count)
                    .global(true)
                    .help("Show diagnostic output (-v for info, -vv for debug)"),
            )
            .arg(
                Arg::new("dry_run")
                    .long("dry-run")
                    .action(ArgAction::SetTrue)
                    .global(true)
                    .help("Report what would be generated without touching the file system"),
            )
            .subcommand(create)
            .subcommand(config_command())
            .subcommand(
                Command::new("plugin-info")
                    .about("Show fields, types and defaults of one or all plugins")
                    .arg(Arg::new("plugin_name").value_name("PLUGIN")),
            )
            .subcommand(
                Command::new("completion")
                    .about("Print a shell completion script")
                    .arg(
                        Arg::new("shell")
                            .required(true)
                            .value_parser(SUPPORTED_SHELLS),
                    ),
            );

        Ok(ArgumentSchema {
            command,
            plugin_options,
        })
    }

    fn plugin_options(&self) -> Result<Vec<PluginOption>> {
        let mut options = Vec::new();
        for details in self.catalog.list_plugins() {
            let id = details.name.to_lowercase();
            if RESERVED_CREATE_OPTIONS.contains(&id.as_str()) {
                return Err(ForgeError::CatalogUnavailable(format!(
                    "plugin '{}' clashes with the built-in --{} option",
                    details.name, id
                )));
            }
            options.push(PluginOption {
                id,
                argumentless: details.is_argumentless(),
            });
        }
        Ok(options)
    }

    fn plugin_arg(&self, option: &PluginOption) -> Arg {
        let details = self.catalog.find(&option.id);
        let description = details.map(|d| d.description.clone()).unwrap_or_default();

        let arg = Arg::new(option.id.clone())
            .long(option.id.clone())
            .help_heading("Plugins");

        if option.argumentless {
            return arg
                .action(ArgAction::SetTrue)
                .help(format!("Enable {}", description));
        }

        let fields = details.map(|d| d.fields.join(", ")).unwrap_or_default();
        // Values are greedy: PACKAGE_NAME has to come before plugin options
        arg.value_name("KEY=VALUE")
            .num_args(0..)
            .action(ArgAction::Append)
            .value_parser(option_token)
            .help(format!("{} [fields: {}]", description, fields))
    }
}

/// Accept only `key=value` tokens so a stray word fails at parse time
fn option_token(token: &str) -> Result<String> {
    split_option(token)?;
    Ok(token.to_string())
}

fn create_command() -> Command {
    Command::new("create")
        .about("Create a new package")
        .after_help("PACKAGE_NAME goes before any plugin option: `create MyPkg --git ssh=true`")
        .arg(
            Arg::new("package_name")
                .value_name("PACKAGE_NAME")
                .required(true)
                .help("Name of the package to create"),
        )
        .arg(
            Arg::new("author")
                .long("author")
                .value_name("AUTHOR")
                .help("Package author"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("USER")
                .help("Hosting service user name"),
        )
        .arg(
            Arg::new("output_dir")
                .long("output-dir")
                .value_name("DIR")
                .help("Directory the package directory is created in"),
        )
        .arg(
            Arg::new("with_mise")
                .long("with-mise")
                .action(ArgAction::SetTrue)
                .help("Add a mise.toml tool configuration"),
        )
}

fn config_command() -> Command {
    Command::new("config")
        .about("Show or change the persisted configuration")
        .subcommand(Command::new("show").about("Print the effective configuration"))
        .subcommand(
            Command::new("set")
                .about("Set dotted keys, e.g. `plugins.git.ssh=true`")
                .arg(
                    Arg::new("entries")
                        .value_name("KEY=VALUE")
                        .num_args(0..)
                        .action(ArgAction::Append),
                ),
        )
}

impl ArgumentSchema {
    /// Parse process arguments against the schema
    pub fn parse_from<I, T>(&self, args: I) -> std::result::Result<Invocation, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().try_get_matches_from(args)?;
        Ok(self.invocation(&matches))
    }

    /// Turn clap matches into the command id and its raw argument map
    pub fn invocation(&self, matches: &ArgMatches) -> Invocation {
        let verbosity = matches.get_count("verbose");
        let dry_run = matches.get_flag("dry_run");

        let (command, args) = match matches.subcommand() {
            None => (CommandId::Help, RawArgs::new()),
            Some(("create", sub)) => (CommandId::Create, self.create_args(sub)),
            Some(("config", sub)) => match sub.subcommand() {
                Some(("set", set)) => {
                    let mut args = RawArgs::new();
                    args.insert("entries".into(), RawArg::Values(strings(set, "entries")));
                    (CommandId::ConfigSet, args)
                }
                _ => (CommandId::ConfigShow, RawArgs::new()),
            },
            Some(("plugin-info", sub)) => {
                let mut args = RawArgs::new();
                insert_value(&mut args, sub, "plugin_name");
                (CommandId::PluginInfo, args)
            }
            Some(("completion", sub)) => {
                let mut args = RawArgs::new();
                insert_value(&mut args, sub, "shell");
                (CommandId::Completion, args)
            }
            Some((other, _)) => (CommandId::Unrecognized(other.to_string()), RawArgs::new()),
        };

        Invocation {
            command,
            args,
            verbosity,
            dry_run,
        }
    }

    fn create_args(&self, matches: &ArgMatches) -> RawArgs {
        let mut args = RawArgs::new();
        for id in ["package_name", "author", "user", "output_dir"] {
            insert_value(&mut args, matches, id);
        }
        args.insert("with_mise".into(), RawArg::Flag(matches.get_flag("with_mise")));

        for option in &self.plugin_options {
            let key = format!("--{}", option.id);
            if option.argumentless {
                args.insert(key, RawArg::Flag(matches.get_flag(&option.id)));
            } else if matches.contains_id(&option.id) {
                args.insert(key, RawArg::Values(strings(matches, &option.id)));
            }
        }
        args
    }

    /// Rendered top-level help
    pub fn help(&self) -> String {
        self.command.clone().render_help().to_string()
    }
}

fn insert_value(args: &mut RawArgs, matches: &ArgMatches, id: &str) {
    if let Some(value) = matches.get_one::<String>(id) {
        args.insert(id.to_string(), RawArg::Value(value.clone()));
    }
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
