//! Typed plugin option values and `key=value` token parsing

use crate::error::{ForgeError, Result};
use std::fmt;

/// A plugin option value after type inference
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Elements are never type-inferred; `[1,2]` stays `["1", "2"]`
    Sequence(Vec<String>),
}

impl OptionValue {
    /// Short name of the value's kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Integer(_) => "int",
            OptionValue::Float(_) => "float",
            OptionValue::String(_) => "string",
            OptionValue::Sequence(_) => "string[]",
        }
    }

    /// Plain-text rendering used when interpolating templates
    pub fn as_text(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Integer(n) => n.to_string(),
            OptionValue::Float(f) => f.to_string(),
            OptionValue::String(s) => s.clone(),
            OptionValue::Sequence(items) => items.join(", "),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => write!(f, "{:?}", s),
            OptionValue::Sequence(items) => write!(f, "[{}]", items.join(", ")),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

/// Parse a raw `key=value` token into its key and inferred value.
///
/// The key is everything before the first `=`; any later `=` belongs to the
/// value, so `url=https://host/?a=b` has the value `https://host/?a=b`. The
/// value is inferred in a fixed order: boolean, integer, float, bracketed
/// list, plain string.
pub fn parse_option(token: &str) -> Result<(String, OptionValue)> {
    let (key, raw) = split_option(token)?;
    Ok((key.to_string(), infer_value(raw)))
}

/// Split a `key=value` token at its first `=` without inferring a type.
/// The key is trimmed; the value is returned exactly as written.
pub fn split_option(token: &str) -> Result<(&str, &str)> {
    let (key, raw) = token
        .split_once('=')
        .ok_or_else(|| ForgeError::MalformedOptionToken(token.to_string()))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ForgeError::MalformedOptionToken(token.to_string()));
    }
    Ok((key, raw))
}

/// Infer the type of a raw option value
pub fn infer_value(raw: &str) -> OptionValue {
    match raw {
        "true" => return OptionValue::Bool(true),
        "false" => return OptionValue::Bool(false),
        _ => {}
    }

    if is_integer(raw) {
        // Out-of-range integers fall through and end up as strings
        if let Ok(n) = raw.parse::<i64>() {
            return OptionValue::Integer(n);
        }
    }

    if is_float(raw) {
        if let Ok(f) = raw.parse::<f64>() {
            return OptionValue::Float(f);
        }
    }

    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return OptionValue::Sequence(split_list(inner));
    }

    OptionValue::String(raw.to_string())
}

fn split_list(inner: &str) -> Vec<String> {
    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn unsigned(raw: &str) -> &str {
    raw.strip_prefix('-').unwrap_or(raw)
}

fn is_integer(raw: &str) -> bool {
    let digits = unsigned(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float(raw: &str) -> bool {
    let body = unsigned(raw);
    let Some((whole, frac)) = body.split_once('.') else {
        return false;
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && all_digits(frac) && !(whole.is_empty() && frac.is_empty())
}
