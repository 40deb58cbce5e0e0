//! Package generation
//!
//! The dispatcher talks to a [`TemplateEngine`]; [`FsEngine`] is the engine
//! that renders catalog file templates onto disk.

pub mod render;

pub use render::render;

use crate::config::{ConfigTree, ConfigValue};
use crate::error::{ForgeError, Result};
use crate::plugins::{FileTemplate, ManifestCatalog, OptionValue, Plugin};
use anyhow::Context;
use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File written by `--with-mise`
pub const MISE_FILE: &str = "mise.toml";

const MISE_TEMPLATE: &str = "[tools]\n";

/// Everything the engine needs to generate one package
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub package_name: String,
    /// Effective configuration (`author`, `user`, `output_dir`, `with_mise`, ...)
    pub options: ConfigTree,
    pub plugins: Vec<Plugin>,
    pub dry_run: bool,
}

impl GenerationRequest {
    /// `<output_dir>/<package_name>`
    pub fn target_dir(&self) -> PathBuf {
        let output_dir = self
            .options
            .get("output_dir")
            .and_then(ConfigValue::as_str)
            .unwrap_or(".");
        expand_home(output_dir).join(&self.package_name)
    }

    fn with_mise(&self) -> bool {
        self.options
            .get("with_mise")
            .and_then(ConfigValue::as_bool)
            .unwrap_or(false)
    }
}

/// What was (or, in a dry run, would be) generated
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub root: PathBuf,
    /// Paths relative to `root`, in generation order
    pub files: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Produces a package directory from a request
#[allow(async_fn_in_trait)]
pub trait TemplateEngine {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReport>;
}

/// Renders each plugin's file templates under the target directory
#[derive(Debug, Clone, Default)]
pub struct FsEngine {
    templates: IndexMap<String, Vec<FileTemplate>>,
}

impl FsEngine {
    pub fn new(templates: IndexMap<String, Vec<FileTemplate>>) -> Self {
        Self { templates }
    }

    pub fn from_catalog(catalog: &ManifestCatalog) -> Self {
        Self::new(catalog.all_templates().clone())
    }

    /// Render every file of the request in memory, keyed by relative path.
    /// A later plugin writing the same path replaces the earlier one.
    pub fn plan(&self, request: &GenerationRequest) -> Result<IndexMap<PathBuf, String>> {
        validate_package_name(&request.package_name)?;

        let base = base_variables(request);
        let mut planned = IndexMap::new();

        for plugin in &request.plugins {
            let Some(files) = self.templates.get(&plugin.name.to_lowercase()) else {
                continue;
            };

            let mut vars = base.clone();
            for (field, value) in &plugin.fields {
                vars.insert(field.clone(), template_text(value));
            }

            for file in files {
                let path = render(&file.path, &vars);
                let path = relative_path(&path, &plugin.name)?;
                debug!(plugin = %plugin.name, path = %path.display(), "planned file");
                planned.insert(path, render(&file.template, &vars));
            }
        }

        if request.with_mise() {
            planned.insert(PathBuf::from(MISE_FILE), MISE_TEMPLATE.to_string());
        }

        Ok(planned)
    }
}

impl TemplateEngine for FsEngine {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReport> {
        let planned = self.plan(request)?;
        let root = request.target_dir();
        let files: Vec<PathBuf> = planned.keys().cloned().collect();

        if request.dry_run {
            info!(root = %root.display(), files = files.len(), "dry run, nothing written");
            return Ok(GenerationReport {
                root,
                files,
                dry_run: true,
            });
        }

        if !is_empty_or_missing(&root).await? {
            return Err(ForgeError::PackageGenerationFailure(format!(
                "{} already exists and is not empty",
                root.display()
            )));
        }

        write_files(&root, &planned)
            .await
            .map_err(|e| ForgeError::PackageGenerationFailure(format!("{:#}", e)))?;
        info!(root = %root.display(), files = files.len(), "package generated");

        Ok(GenerationReport {
            root,
            files,
            dry_run: false,
        })
    }
}

async fn write_files(root: &Path, planned: &IndexMap<PathBuf, String>) -> anyhow::Result<()> {
    fs::create_dir_all(root)
        .await
        .context("Failed to create target directory")?;

    for (relative, content) in planned {
        let target_path = root.join(relative);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(&target_path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", target_path.display()))?;
    }

    Ok(())
}

async fn is_empty_or_missing(dir: &Path) -> Result<bool> {
    match fs::metadata(dir).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
        Ok(meta) if !meta.is_dir() => Ok(false),
        Ok(_) => {
            let mut entries = fs::read_dir(dir).await?;
            Ok(entries.next_entry().await?.is_none())
        }
    }
}

fn validate_package_name(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if invalid {
        return Err(ForgeError::PackageGenerationFailure(format!(
            "invalid package name '{}'",
            name
        )));
    }
    Ok(())
}

/// Rendered template paths must stay inside the package directory
fn relative_path(rendered: &str, plugin: &str) -> Result<PathBuf> {
    let path = PathBuf::from(rendered.trim());
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.as_os_str().is_empty() || escapes {
        return Err(ForgeError::PackageGenerationFailure(format!(
            "plugin {} renders invalid file path '{}'",
            plugin, rendered
        )));
    }
    Ok(path)
}

fn base_variables(request: &GenerationRequest) -> IndexMap<String, String> {
    let mut vars = IndexMap::new();
    vars.insert("package_name".to_string(), request.package_name.clone());
    for key in ["author", "user"] {
        let value = match request.options.get(key) {
            None | Some(ConfigValue::Null) => String::new(),
            Some(ConfigValue::String(s)) => s.clone(),
            Some(value) => value.to_string(),
        };
        vars.insert(key.to_string(), value);
    }
    vars
}

fn template_text(value: &OptionValue) -> String {
    match value {
        OptionValue::Sequence(items) => items.join("\n"),
        other => other.as_text(),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
