//! PkgForge CLI - Package scaffolding from configurable plugins

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use colored::Colorize;
use pkgforge_core::{
    CatalogSource, ConfigStore, Dispatcher, FsEngine, ManifestCatalog, Plugin, ProductConfig,
};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// PkgForge product configuration
#[derive(Clone)]
pub struct PkgForgeConfig;

impl ProductConfig for PkgForgeConfig {
    fn name(&self) -> &'static str {
        "pkgforge"
    }

    fn display_name(&self) -> &'static str {
        "PkgForge"
    }

    fn cli_description(&self) -> &'static str {
        "CLI for scaffolding packages from a catalog of configurable plugins"
    }

    fn catalog_path_env(&self) -> &'static str {
        "PKGFORGE_CATALOG"
    }

    fn config_path_env(&self) -> &'static str {
        "PKGFORGE_CONFIG"
    }

    fn docs_url(&self) -> &'static str {
        "https://github.com/pkgforge/pkgforge#readme"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install pkgforge --force"
    }

    fn next_steps(&self, dir: &Path, plugins: &[Plugin]) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        if current.as_deref() != Some(dir) {
            steps.push(format!("cd {}", dir.display()));
        }

        let has = |name: &str| plugins.iter().any(|p| p.name.eq_ignore_ascii_case(name));

        if has("git") {
            steps.push("git init && git add . && git commit -m \"Initial commit\"".to_string());
        }

        if has("githubactions") {
            steps.push("Push to GitHub to run the CI workflow".to_string());
        }

        steps.push(format!("Read the docs: {}", self.docs_url()));
        steps
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    code
}

async fn run() -> Result<ExitCode> {
    let config = PkgForgeConfig;

    let catalog = ManifestCatalog::load(&CatalogSource::from_config(&config))
        .context("Failed to load plugin catalog")?;
    let engine = FsEngine::from_catalog(&catalog);
    let store = ConfigStore::from_config(&config);
    let dispatcher = Dispatcher::new(config, catalog, store, engine, CLI_VERSION)?
        .interactive(pkgforge_core::tui::is_interactive());

    let invocation = match dispatcher.schema().parse_from(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(e) => {
            let informational = matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
            e.print().context("Failed to print usage")?;
            return Ok(if informational {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
    };

    // Scoped to this run; nothing else installs a subscriber
    let _log = tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_env_filter(log_filter(invocation.verbosity))
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .finish(),
    );

    dispatcher.check_catalog_version();

    let result = dispatcher.dispatch(&invocation).await;
    result.display();

    Ok(ExitCode::from(result.exit_code()))
}

/// `RUST_LOG` when set, otherwise warn / -v info / -vv debug
fn log_filter(verbosity: u8) -> EnvFilter {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pkgforge={level},pkgforge_core={level}")))
}
