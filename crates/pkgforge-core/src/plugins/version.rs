//! Version comparison for CLI and catalog compatibility

use semver::Version;

/// Compare the CLI version against the version a catalog was written for.
/// Returns a warning if the CLI is older than the catalog expects.
pub fn check_compatibility(
    cli_version: &str,
    catalog_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    // Can't compare, skip warning
    let cli_ver = parse_version(cli_version)?;
    let catalog_ver = parse_version(catalog_version)?;

    if cli_ver < catalog_ver {
        Some(format!(
            "Plugin catalog targets version {} but this is version {}; consider updating: {}",
            catalog_ver, cli_ver, upgrade_command
        ))
    } else {
        None
    }
}

/// Parse a version string, tolerating a leading 'v'
pub fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_older_than_catalog() {
        let warning = check_compatibility("0.1.0", "0.2.0", "cargo install pkgforge --force");
        assert!(warning.unwrap().contains("0.2.0"));
    }

    #[test]
    fn test_cli_same_as_catalog() {
        assert!(check_compatibility("0.1.0", "0.1.0", "cargo install pkgforge --force").is_none());
    }

    #[test]
    fn test_cli_newer_than_catalog() {
        assert!(check_compatibility("0.2.0", "v0.1.0", "cargo install pkgforge --force").is_none());
    }

    #[test]
    fn test_invalid_versions() {
        // Should return None (no warning) for invalid versions
        assert!(check_compatibility("invalid", "0.1.0", "cargo install pkgforge --force").is_none());
        assert!(check_compatibility("0.1.0", "latest", "cargo install pkgforge --force").is_none());
    }
}
