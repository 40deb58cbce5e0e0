//! `create <package_name>`

use super::{CommandResult, Dispatcher};
use crate::cli::RawArgs;
use crate::config::{ConfigTree, ConfigValue, PLUGINS_KEY};
use crate::engine::{GenerationReport, GenerationRequest, TemplateEngine};
use crate::error::{ForgeError, Result};
use crate::plugins::{options_from_tree, Plugin, PluginInstantiator};
use crate::product::ProductConfig;
use crate::runtime::{check_tools, Tool};
use tracing::info;

impl<P: ProductConfig, E: TemplateEngine> Dispatcher<P, E> {
    pub(super) async fn create(
        &self,
        args: &RawArgs,
        effective: &ConfigTree,
        dry_run: bool,
    ) -> Result<CommandResult> {
        let package_name = args
            .get("package_name")
            .and_then(|a| a.as_value())
            .ok_or_else(|| ForgeError::PackageGenerationFailure("missing package name".into()))?
            .to_string();

        let plugin_tree = effective
            .get(PLUGINS_KEY)
            .and_then(ConfigValue::as_tree)
            .cloned()
            .unwrap_or_default();
        let options = options_from_tree(&plugin_tree, &self.catalog)?;
        let plugins = PluginInstantiator::new(&self.catalog).instantiate(&options)?;
        info!(
            package = %package_name,
            plugins = ?plugins.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "creating package"
        );

        check_tools(&required_tools(&plugins, effective));

        let request = GenerationRequest {
            package_name,
            options: effective.clone(),
            plugins,
            dry_run,
        };
        let report = self.generate(&request).await?;

        Ok(self.report(&request, &report))
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReport> {
        #[cfg(feature = "tui")]
        {
            if self.interactive {
                let message = format!("Creating {}...", request.package_name);
                let task = self.engine.generate(request);
                return crate::tui::with_spinner(&message, "Package created", task).await;
            }
        }

        self.engine.generate(request).await
    }

    fn report(&self, request: &GenerationRequest, report: &GenerationReport) -> CommandResult {
        let mut lines = Vec::new();
        if report.dry_run {
            lines.push(format!(
                "Dry run: would create {} files in {}",
                report.files.len(),
                report.root.display()
            ));
            lines.extend(report.files.iter().map(|f| format!("  {}", f.display())));
        } else {
            lines.push(format!(
                "Created {} with {} files in {}",
                request.package_name,
                report.files.len(),
                report.root.display()
            ));
            let steps = self.product.next_steps(&report.root, &request.plugins);
            if !steps.is_empty() {
                lines.push(String::new());
                lines.push("Next steps:".to_string());
                lines.extend(steps.iter().map(|s| format!("  {}", s)));
            }
        }

        let files: Vec<ConfigValue> = report
            .files
            .iter()
            .map(|f| ConfigValue::from(f.display().to_string()))
            .collect();
        let plugins: Vec<ConfigValue> = request
            .plugins
            .iter()
            .map(|p| ConfigValue::from(p.name.as_str()))
            .collect();

        CommandResult::success(lines.join("\n")).with_data([
            ("package_name", ConfigValue::from(request.package_name.as_str())),
            ("root", ConfigValue::from(report.root.display().to_string())),
            ("files", ConfigValue::Sequence(files)),
            ("plugins", ConfigValue::Sequence(plugins)),
            ("dry_run", ConfigValue::Bool(report.dry_run)),
        ])
    }
}

fn required_tools(plugins: &[Plugin], effective: &ConfigTree) -> Vec<Tool> {
    let mut tools = Vec::new();
    if plugins.iter().any(|p| p.name.eq_ignore_ascii_case("git")) {
        tools.push(Tool::Git);
    }
    if effective.get("with_mise").and_then(ConfigValue::as_bool) == Some(true) {
        tools.push(Tool::Mise);
    }
    tools
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::config::ConfigStore;
    use crate::plugins::OptionValue;

    #[tokio::test]
    async fn test_create_passes_plugins_to_engine() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());
        let invocation = invoke(
            &d,
            &["create", "MyPkg", "--git", "ssh=true", "--formatter", "style=blue", "indent=2"],
        );

        let result = d.dispatch(&invocation).await;
        assert!(result.success, "{:?}", result.message);

        let requests = d.engine.requests.borrow();
        let request = &requests[0];
        assert_eq!(request.package_name, "MyPkg");
        assert_eq!(request.plugins.len(), 2);

        let git = &request.plugins[0];
        assert_eq!(git.name, "Git");
        assert_eq!(git.get("ssh"), Some(&OptionValue::Bool(true)));
        assert_eq!(git.get("manifest"), Some(&OptionValue::Bool(false)));
        assert!(git.get("name").is_none());

        let formatter = &request.plugins[1];
        assert_eq!(formatter.get("style"), Some(&OptionValue::String("blue".into())));
        assert_eq!(formatter.get("indent"), Some(&OptionValue::Integer(2)));
        assert_eq!(formatter.get("margin"), Some(&OptionValue::Integer(92)));
    }

    #[tokio::test]
    async fn test_string_fields_reach_engine_as_typed() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());
        let invocation = invoke(
            &d,
            &["create", "MyPkg", "--projectfile", "version=1.10", "--license", "name=007"],
        );

        let result = d.dispatch(&invocation).await;
        assert!(result.success, "{:?}", result.message);

        let requests = d.engine.requests.borrow();
        let plugins = &requests[0].plugins;
        assert_eq!(plugins[0].get("version"), Some(&OptionValue::String("1.10".into())));
        assert_eq!(plugins[1].get("name"), Some(&OptionValue::String("007".into())));
    }

    #[tokio::test]
    async fn test_file_config_plugins_are_enabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "author: Ada\noutput_dir: /tmp/pkgs\nplugins:\n  Formatter:\n    style: blue\n    indent: 8\n  git: false\n",
        )
        .unwrap();
        let d = dispatcher(dir.path());

        let invocation = invoke(&d, &["create", "MyPkg", "--formatter", "style=yas"]);
        let result = d.dispatch(&invocation).await;
        assert!(result.success, "{:?}", result.message);

        let requests = d.engine.requests.borrow();
        let request = &requests[0];
        assert_eq!(request.options["author"], ConfigValue::from("Ada"));
        assert_eq!(request.options["output_dir"], ConfigValue::from("/tmp/pkgs"));
        assert_eq!(request.plugins.len(), 1);
        assert_eq!(request.plugins[0].get("style"), Some(&OptionValue::String("yas".into())));
        assert_eq!(request.plugins[0].get("indent"), Some(&OptionValue::Integer(8)));
    }

    #[tokio::test]
    async fn test_cli_options_override_file() {
        let dir = tempfile::tempdir().unwrap();
        ConfigStore::new(dir.path().join("config.yaml"))
            .save(&serde_yaml::from_str("author: Ada\nuser: ada\n").unwrap())
            .unwrap();
        let d = dispatcher(dir.path());

        let invocation = invoke(&d, &["create", "MyPkg", "--user", "grace", "--with-mise"]);
        d.dispatch(&invocation).await;

        let requests = d.engine.requests.borrow();
        assert_eq!(requests[0].options["author"], ConfigValue::from("Ada"));
        assert_eq!(requests[0].options["user"], ConfigValue::from("grace"));
        assert_eq!(requests[0].options["with_mise"], ConfigValue::Bool(true));
    }

    #[tokio::test]
    async fn test_corrupt_config_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "author: [oops\n").unwrap();
        let d = dispatcher(dir.path());

        let result = d.dispatch(&invoke(&d, &["create", "MyPkg"])).await;
        assert!(result.success);
        assert_eq!(
            d.engine.requests.borrow()[0].options["output_dir"],
            ConfigValue::from(".")
        );
    }

    #[tokio::test]
    async fn test_type_mismatch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d
            .dispatch(&invoke(&d, &["create", "MyPkg", "--git", "ssh=maybe"]))
            .await;
        assert!(!result.success);
        let message = result.message.unwrap();
        assert!(message.contains("Git"));
        assert!(message.contains("ssh"));
        assert!(d.engine.requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_engine_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RecordingEngine {
            fail: true,
            ..Default::default()
        };
        let d = dispatcher_with(dir.path(), engine);

        let result = d.dispatch(&invoke(&d, &["create", "MyPkg"])).await;
        assert!(!result.success);
        assert_eq!(result.exit_code(), 1);
        assert!(result.message.unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_dry_run_reaches_engine() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());

        let result = d
            .dispatch(&invoke(&d, &["--dry-run", "create", "MyPkg"]))
            .await;
        assert!(result.success);
        assert!(d.engine.requests.borrow()[0].dry_run);
        assert!(result.message.unwrap().starts_with("Dry run"));
        assert_eq!(result.data.unwrap()["dry_run"], ConfigValue::Bool(true));
    }

    #[test]
    fn test_required_tools() {
        let git = Plugin {
            name: "Git".into(),
            fields: Default::default(),
        };
        let mut effective = ConfigTree::new();
        assert!(required_tools(&[], &effective).is_empty());

        effective.insert("with_mise".into(), true.into());
        assert_eq!(required_tools(&[git], &effective), vec![Tool::Git, Tool::Mise]);
    }
}
