//! Product configuration trait for CLI binaries
//!
//! This trait defines what a binary built on this library must supply:
//! its identity, where it looks for overrides, and the text shown after a
//! package has been generated.

use crate::plugins::Plugin;
use std::path::Path;

/// Configuration trait for CLI products
///
/// Each product implements this trait to define:
/// - Product identity (name, display name, description)
/// - Environment variables overriding the catalog and config file paths
/// - Documentation and upgrade hints
/// - Post-generation instructions
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (binary name, config directory name)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Environment variable naming a catalog manifest to use instead of the
    /// built-in one
    fn catalog_path_env(&self) -> &'static str;

    /// Environment variable naming the config file to use instead of the
    /// per-user default
    fn config_path_env(&self) -> &'static str;

    /// URL for product documentation
    fn docs_url(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// Generate the "next steps" instructions after package creation
    fn next_steps(&self, dir: &Path, plugins: &[Plugin]) -> Vec<String>;

    /// Directory name under the user's config directory
    fn config_dir_name(&self) -> &'static str {
        self.name()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Minimal product used by unit tests
    #[derive(Clone)]
    pub struct TestProduct;

    impl ProductConfig for TestProduct {
        fn name(&self) -> &'static str {
            "pkgforge-test"
        }

        fn display_name(&self) -> &'static str {
            "PkgForge Test"
        }

        fn cli_description(&self) -> &'static str {
            "Test product"
        }

        fn catalog_path_env(&self) -> &'static str {
            "PKGFORGE_TEST_CATALOG"
        }

        fn config_path_env(&self) -> &'static str {
            "PKGFORGE_TEST_CONFIG"
        }

        fn docs_url(&self) -> &'static str {
            "https://example.invalid/docs"
        }

        fn upgrade_command(&self) -> &'static str {
            "cargo install pkgforge --force"
        }

        fn next_steps(&self, dir: &Path, _plugins: &[Plugin]) -> Vec<String> {
            vec![format!("cd {}", dir.display())]
        }
    }
}
