//! Charm-style CLI prompts using cliclack

use crate::config::{ConfigTree, ConfigValue};
use std::fmt::Display;
use std::future::Future;
use std::io;

/// Keys asked for by an interactive `config set`
pub const PROMPTED_KEYS: [(&str, &str); 3] = [
    ("author", "Package author"),
    ("user", "Hosting service user name"),
    ("output_dir", "Default output directory"),
];

/// Prompts and spinners only make sense on a terminal
pub fn is_interactive() -> bool {
    console::Term::stdout().is_term() && console::Term::stderr().is_term()
}

/// Ask for the common settings, pre-filled from the current file tree.
/// Blank answers are left out.
pub fn prompt_config_entries(
    display_name: &str,
    current: &ConfigTree,
) -> io::Result<Vec<(String, ConfigValue)>> {
    cliclack::intro(format!("{} configuration", display_name))?;

    let mut entries = Vec::new();
    for (key, label) in PROMPTED_KEYS {
        let existing = current
            .get(key)
            .and_then(ConfigValue::as_str)
            .unwrap_or_default()
            .to_string();

        let answer: String = cliclack::input(label)
            .placeholder(&existing)
            .default_input(&existing)
            .required(false)
            .interact()?;

        let answer = answer.trim();
        if !answer.is_empty() {
            entries.push((key.to_string(), ConfigValue::from(answer)));
        }
    }

    cliclack::outro("Configuration saved")?;
    Ok(entries)
}

/// Run `task` behind a spinner, stopping it with the outcome
pub async fn with_spinner<F, T, E>(message: &str, done: &str, task: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let spinner = cliclack::spinner();
    spinner.start(message);

    let result = task.await;
    match &result {
        Ok(_) => spinner.stop(done),
        Err(e) => spinner.stop(format!("Failed: {}", e)),
    }
    result
}
