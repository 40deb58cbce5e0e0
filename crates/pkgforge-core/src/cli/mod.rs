//! Command-line schema and the raw argument map
//!
//! The option set depends on the plugin catalog, so the schema is built at
//! runtime with clap's builder API rather than derived.

pub mod schema;

pub use schema::{ArgumentSchema, ArgumentSchemaBuilder, Invocation};

use indexmap::IndexMap;

/// One parsed argument, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawArg {
    Flag(bool),
    Value(String),
    Values(Vec<String>),
}

impl RawArg {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            RawArg::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, RawArg::Flag(true))
    }

    pub fn values(&self) -> &[String] {
        match self {
            RawArg::Values(values) => values,
            RawArg::Value(value) => std::slice::from_ref(value),
            RawArg::Flag(_) => &[],
        }
    }
}

/// Parsed arguments of one command. Plugin options are keyed `--<plugin>`,
/// everything else by its plain name.
pub type RawArgs = IndexMap<String, RawArg>;
