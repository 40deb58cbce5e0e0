//! Detection of the external tools a generated package relies on

use std::fmt;
use std::process::Command;
use tracing::{debug, warn};

/// Tools the generated packages may expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Git,
    Mise,
}

impl Tool {
    /// Binary looked up on PATH
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Git => "git",
            Tool::Mise => "mise",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Git => "Git",
            Tool::Mise => "mise",
        }
    }

    pub fn install_hint(&self) -> &'static str {
        match self {
            Tool::Git => "install from https://git-scm.com",
            Tool::Mise => "install from https://mise.jdx.dev",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Tool detection result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub tool: Tool,
    pub version: Option<String>,
    pub available: bool,
}

/// Run `<tool> --version` to see whether the tool is usable
pub fn check_tool(tool: Tool) -> ToolInfo {
    check_binary(tool, tool.binary())
}

fn check_binary(tool: Tool, binary: &str) -> ToolInfo {
    let output = Command::new(binary).arg("--version").output();

    match output {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            debug!(tool = binary, %version, "tool found");
            ToolInfo {
                tool,
                version: Some(version),
                available: true,
            }
        }
        _ => ToolInfo {
            tool,
            version: None,
            available: false,
        },
    }
}

/// Check every tool; missing ones are logged as warnings and reported back,
/// never turned into an error.
pub fn check_tools(tools: &[Tool]) -> Vec<ToolInfo> {
    tools
        .iter()
        .map(|&tool| {
            let info = check_tool(tool);
            if !info.available {
                warn!("{} not found ({})", tool, tool.install_hint());
            }
            info
        })
        .collect()
}
