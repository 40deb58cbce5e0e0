//! Plugin descriptors: field names, semantic types and defaults

use super::value::{infer_value, OptionValue};
use crate::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Semantic type of a plugin field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    String,
    StringSequence,
    /// The field may be left without a value
    Optional(Box<FieldType>),
}

impl FieldType {
    /// Check `value` against this type, converting where the conversion is
    /// lossless. Returns the rejected value on mismatch.
    pub fn coerce(&self, value: OptionValue) -> std::result::Result<OptionValue, OptionValue> {
        match (self, value) {
            (FieldType::Optional(inner), v) => inner.coerce(v),
            (FieldType::Boolean, v @ OptionValue::Bool(_)) => Ok(v),
            (FieldType::Integer, v @ OptionValue::Integer(_)) => Ok(v),
            (FieldType::Integer, OptionValue::Float(f)) if is_whole(f) => {
                Ok(OptionValue::Integer(f as i64))
            }
            (FieldType::Float, v @ OptionValue::Float(_)) => Ok(v),
            (FieldType::Float, OptionValue::Integer(n)) => Ok(OptionValue::Float(n as f64)),
            (FieldType::String, v @ OptionValue::Sequence(_)) => Err(v),
            (FieldType::String, OptionValue::String(s)) => Ok(OptionValue::String(s)),
            // Scalars inferred from text are taken back as text
            (FieldType::String, v) => Ok(OptionValue::String(v.as_text())),
            (FieldType::StringSequence, v @ OptionValue::Sequence(_)) => Ok(v),
            (_, other) => Err(other),
        }
    }

    /// Read the raw text of a value for a field of this type. String fields
    /// take the text exactly as written; anything else is type-inferred.
    pub fn read(&self, raw: &str) -> OptionValue {
        match self {
            FieldType::Optional(inner) => inner.read(raw),
            FieldType::String => OptionValue::String(raw.to_string()),
            _ => infer_value(raw),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }
}

fn is_whole(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Boolean => write!(f, "bool"),
            FieldType::Integer => write!(f, "int"),
            FieldType::Float => write!(f, "float"),
            FieldType::String => write!(f, "string"),
            FieldType::StringSequence => write!(f, "string[]"),
            FieldType::Optional(inner) => write!(f, "{}?", inner),
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('?') {
            let inner: FieldType = inner.parse()?;
            if inner.is_optional() {
                return Err(format!("nested optional type '{}'", s));
            }
            return Ok(FieldType::Optional(Box::new(inner)));
        }

        match s.to_lowercase().as_str() {
            "bool" | "boolean" => Ok(FieldType::Boolean),
            "int" | "integer" => Ok(FieldType::Integer),
            "float" => Ok(FieldType::Float),
            "string" | "str" => Ok(FieldType::String),
            "string[]" | "[string]" => Ok(FieldType::StringSequence),
            _ => Err(format!("unknown field type '{}'", s)),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

/// Descriptor of one plugin kind
///
/// `fields`, `types` and `defaults` are parallel: entry `i` of each describes
/// the same field. A `None` default means the plugin has no default for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDetails {
    pub name: String,
    pub description: String,
    pub fields: Vec<String>,
    pub types: Vec<FieldType>,
    pub defaults: Vec<Option<OptionValue>>,
}

impl PluginDetails {
    /// Build a descriptor, checking the parallel-sequence invariant and that
    /// every default satisfies its own field type.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<String>,
        types: Vec<FieldType>,
        defaults: Vec<Option<OptionValue>>,
    ) -> Result<Self> {
        let name = name.into();

        if fields.len() != types.len() || fields.len() != defaults.len() {
            return Err(ForgeError::CatalogUnavailable(format!(
                "plugin '{}' declares {} fields, {} types and {} defaults",
                name,
                fields.len(),
                types.len(),
                defaults.len()
            )));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.as_str()) {
                return Err(ForgeError::CatalogUnavailable(format!(
                    "plugin '{}' declares field '{}' twice",
                    name, field
                )));
            }
        }

        let mut coerced = Vec::with_capacity(defaults.len());
        for ((field, ty), default) in fields.iter().zip(&types).zip(defaults) {
            let default = match default {
                Some(value) => Some(ty.coerce(value).map_err(|value| {
                    ForgeError::CatalogUnavailable(format!(
                        "plugin '{}' field '{}' has default {} which is not a {}",
                        name, field, value, ty
                    ))
                })?),
                None => None,
            };
            coerced.push(default);
        }

        Ok(Self {
            name,
            description: description.into(),
            fields,
            types,
            defaults: coerced,
        })
    }

    /// True when the plugin takes no configuration at all
    pub fn is_argumentless(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field, if declared
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Iterate `(field, type, default)` in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldType, Option<&OptionValue>)> {
        self.fields
            .iter()
            .zip(&self.types)
            .zip(&self.defaults)
            .map(|((field, ty), default)| (field.as_str(), ty, default.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_types() {
        assert_eq!("bool".parse::<FieldType>().unwrap(), FieldType::Boolean);
        assert_eq!(
            "string[]".parse::<FieldType>().unwrap(),
            FieldType::StringSequence
        );
        assert_eq!(
            "int?".parse::<FieldType>().unwrap(),
            FieldType::Optional(Box::new(FieldType::Integer))
        );
        assert!("int??".parse::<FieldType>().is_err());
        assert!("date".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_field_type_display_round_trips() {
        for text in ["bool", "int", "float", "string", "string[]", "string?"] {
            assert_eq!(text.parse::<FieldType>().unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(
            FieldType::Float.coerce(OptionValue::Integer(2)),
            Ok(OptionValue::Float(2.0))
        );
        assert_eq!(
            FieldType::Integer.coerce(OptionValue::Float(3.0)),
            Ok(OptionValue::Integer(3))
        );
        assert_eq!(
            FieldType::Integer.coerce(OptionValue::Float(3.5)),
            Err(OptionValue::Float(3.5))
        );
    }

    #[test]
    fn test_coerce_rejects_mismatches() {
        assert!(FieldType::Boolean
            .coerce(OptionValue::String("yes".into()))
            .is_err());
        assert!(FieldType::StringSequence
            .coerce(OptionValue::String("a".into()))
            .is_err());
        assert!(FieldType::String
            .coerce(OptionValue::Sequence(vec!["a".into()]))
            .is_err());
    }

    #[test]
    fn test_string_fields_accept_inferred_scalars() {
        assert_eq!(
            FieldType::String.coerce(OptionValue::Float(1.5)),
            Ok(OptionValue::String("1.5".into()))
        );
        let optional = FieldType::Optional(Box::new(FieldType::String));
        assert_eq!(
            optional.coerce(OptionValue::Integer(7)),
            Ok(OptionValue::String("7".into()))
        );
    }

    #[test]
    fn test_string_fields_read_text_verbatim() {
        assert_eq!(FieldType::String.read("1.10"), OptionValue::String("1.10".into()));
        let optional = FieldType::Optional(Box::new(FieldType::String));
        assert_eq!(optional.read("007"), OptionValue::String("007".into()));
        assert_eq!(FieldType::Integer.read("007"), OptionValue::Integer(7));
        assert_eq!(FieldType::Boolean.read("true"), OptionValue::Bool(true));
        assert_eq!(
            FieldType::StringSequence.read("[a,b]"),
            OptionValue::Sequence(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_details_rejects_length_mismatch() {
        let result = PluginDetails::new(
            "Tests",
            "",
            vec!["file".into()],
            vec![],
            vec![None],
        );
        assert!(matches!(result, Err(ForgeError::CatalogUnavailable(_))));
    }

    #[test]
    fn test_details_rejects_duplicate_fields() {
        let result = PluginDetails::new(
            "Tests",
            "",
            vec!["file".into(), "file".into()],
            vec![FieldType::String, FieldType::String],
            vec![None, None],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_details_rejects_bad_default() {
        let result = PluginDetails::new(
            "Git",
            "",
            vec!["ssh".into()],
            vec![FieldType::Boolean],
            vec![Some(OptionValue::String("no".into()))],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_details_coerces_defaults() {
        let details = PluginDetails::new(
            "Codecov",
            "",
            vec!["threshold".into()],
            vec![FieldType::Float],
            vec![Some(OptionValue::Integer(1))],
        )
        .unwrap();
        assert_eq!(details.defaults[0], Some(OptionValue::Float(1.0)));
        assert!(!details.is_argumentless());
    }
}
