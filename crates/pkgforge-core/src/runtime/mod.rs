//! External tool detection
//!
//! Generated packages expect tools such as `git` or `mise` on the user's
//! machine. Their absence is reported, never fatal.

pub mod tool;

pub use tool::{check_tool, check_tools, Tool, ToolInfo};
