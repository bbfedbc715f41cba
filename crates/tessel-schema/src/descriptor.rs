//! # Model Descriptors
//!
//! A [`ModelDescriptor`] is the declarative, serializable form of one
//! schema, read from YAML or JSON:
//!
//! ```yaml
//! name: Patient
//! config: { extra: forbid }
//! fields:
//!   name:
//!     type: str
//!     constraints: { max_length: 50 }
//!     hooks: { before: [upper] }
//!   age: { type: int, constraints: { gt: 0, lt: 120 } }
//!   weight: { type: float, strict: true, constraints: { gt: 0 } }
//!   allergies: { type: "list[str]", optional: true, nullable: true }
//!   address: { type: Address }
//! ```
//!
//! Field order in the file is field order in the schema. Field types follow
//! the grammar `str | int | float | bool | list[T] | dict[T] | <ModelName>`;
//! model names are resolved by the
//! [`SchemaRegistry`](crate::SchemaRegistry), which also maps hook names to
//! [`ValidatorHook`](tessel_model::ValidatorHook)s.
//!
//! A field with a `default` is optional. A field marked `optional` without a
//! default must also be `nullable`, and defaults to `null`.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessel_model::{Constraint, ModelConfig, ScalarType};

use crate::error::DescriptorError;

/// Declarative description of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub config: ModelConfig,
    pub fields: IndexMap<String, FieldSpec>,
}

/// Declarative description of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Type expression.
    #[serde(rename = "type")]
    pub type_expr: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub constraints: ConstraintSpec,
    #[serde(default)]
    pub hooks: HookSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<serde_json::Value>,
}

/// String formats checked by a `format` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    Email,
    Url,
}

/// Constraint keywords. Applied in the order the fields are listed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstraintSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<serde_json::Value>>,
}

/// Hook names per phase, resolved against a hook table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HookSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

/// A parsed field type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Scalar(ScalarType),
    List(Box<TypeExpr>),
    Dict(Box<TypeExpr>),
    /// A reference to another model, by name.
    Model(String),
}

impl TypeExpr {
    /// Parse a type expression.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when `expr` is not in the
    /// grammar.
    pub fn parse(expr: &str) -> Result<Self, String> {
        let expr = expr.trim();
        match expr {
            "str" => return Ok(Self::Scalar(ScalarType::Str)),
            "int" => return Ok(Self::Scalar(ScalarType::Int)),
            "float" => return Ok(Self::Scalar(ScalarType::Float)),
            "bool" => return Ok(Self::Scalar(ScalarType::Bool)),
            _ => {}
        }
        if let Some(inner) = generic_arg(expr, "list")? {
            return Ok(Self::List(Box::new(Self::parse(inner)?)));
        }
        if let Some(inner) = generic_arg(expr, "dict")? {
            return Ok(Self::Dict(Box::new(Self::parse(inner)?)));
        }
        let mut chars = expr.chars();
        let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        if starts_alpha && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(Self::Model(expr.to_string()))
        } else {
            Err(format!("'{expr}' is not a type"))
        }
    }

    /// The model referenced by this type, looking through `list` and `dict`.
    pub fn model_reference(&self) -> Option<&str> {
        match self {
            Self::Model(name) => Some(name),
            Self::List(inner) | Self::Dict(inner) => inner.model_reference(),
            Self::Scalar(_) => None,
        }
    }
}

fn generic_arg<'a>(expr: &'a str, head: &str) -> Result<Option<&'a str>, String> {
    let Some(rest) = expr.strip_prefix(head) else {
        return Ok(None);
    };
    let Some(rest) = rest.strip_prefix('[') else {
        return Ok(None);
    };
    match rest.strip_suffix(']') {
        Some(inner) if !inner.trim().is_empty() => Ok(Some(inner)),
        Some(_) => Err(format!("'{head}' needs an element type")),
        None => Err(format!("unclosed '[' in '{expr}'")),
    }
}

impl ModelDescriptor {
    /// Parse a descriptor from YAML text. JSON is valid YAML, so this also
    /// accepts JSON descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Parse`] naming `source_name`.
    pub fn from_yaml_str(text: &str, source_name: &str) -> Result<Self, DescriptorError> {
        serde_yaml::from_str(text).map_err(|e| DescriptorError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse a descriptor from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Parse`] naming `source_name`.
    pub fn from_json_str(text: &str, source_name: &str) -> Result<Self, DescriptorError> {
        serde_json::from_str(text).map_err(|e| DescriptorError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Read a descriptor file, choosing the format from its extension
    /// (`.yaml`/`.yml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Io`] if the file cannot be read,
    /// [`DescriptorError::UnsupportedFormat`] for other extensions and
    /// [`DescriptorError::Parse`] for malformed content.
    pub fn from_path(path: &Path) -> Result<Self, DescriptorError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let source_name = path.display().to_string();
        match ext {
            "yaml" | "yml" => {
                let text = std::fs::read_to_string(path)?;
                Self::from_yaml_str(&text, &source_name)
            }
            "json" => {
                let text = std::fs::read_to_string(path)?;
                Self::from_json_str(&text, &source_name)
            }
            _ => Err(DescriptorError::UnsupportedFormat(source_name)),
        }
    }

    /// Parse every field type, in field order.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidType`] for the first bad type.
    pub fn field_types(&self) -> Result<Vec<(&str, TypeExpr)>, DescriptorError> {
        self.fields
            .iter()
            .map(|(field, spec)| {
                TypeExpr::parse(&spec.type_expr)
                    .map(|ty| (field.as_str(), ty))
                    .map_err(|reason| DescriptorError::InvalidType {
                        model: self.name.clone(),
                        field: field.clone(),
                        type_expr: spec.type_expr.clone(),
                        reason,
                    })
            })
            .collect()
    }
}

impl ConstraintSpec {
    /// The constraints in application order.
    ///
    /// # Errors
    ///
    /// Returns the `regex` error text for an invalid `pattern`.
    pub fn to_constraints(&self) -> Result<Vec<Constraint>, String> {
        let mut out = Vec::new();
        out.extend(self.gt.map(Constraint::Gt));
        out.extend(self.ge.map(Constraint::Ge));
        out.extend(self.lt.map(Constraint::Lt));
        out.extend(self.le.map(Constraint::Le));
        out.extend(self.multiple_of.map(Constraint::MultipleOf));
        out.extend(self.min_length.map(Constraint::MinLength));
        out.extend(self.max_length.map(Constraint::MaxLength));
        if let Some(pattern) = &self.pattern {
            out.push(Constraint::pattern(pattern).map_err(|e| e.to_string())?);
        }
        out.extend(self.format.map(|format| match format {
            StringFormat::Email => Constraint::Email,
            StringFormat::Url => Constraint::Url,
        }));
        if let Some(options) = &self.one_of {
            out.push(Constraint::OneOf(
                options.iter().cloned().map(Into::into).collect(),
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATIENT: &str = r#"
name: Patient
config: { extra: forbid }
fields:
  name:
    type: str
    constraints: { max_length: 50 }
    hooks: { before: [upper] }
    title: Name of the patient
  age: { type: int, constraints: { gt: 0, lt: 120 } }
  allergies: { type: "list[str]", optional: true, nullable: true }
  address: { type: Address }
"#;

    #[test]
    fn yaml_descriptor_keeps_field_order() {
        let d = ModelDescriptor::from_yaml_str(PATIENT, "patient").unwrap();
        let names: Vec<&str> = d.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["name", "age", "allergies", "address"]);
        assert_eq!(d.fields["name"].hooks.before, ["upper"]);
        assert_eq!(d.config.extra, tessel_model::ExtraPolicy::Forbid);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = ModelDescriptor::from_yaml_str("name: M\nfields: { a: { type: int, requried: true } }", "m")
            .unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }));
    }

    #[test]
    fn type_grammar() {
        assert_eq!(TypeExpr::parse("int").unwrap(), TypeExpr::Scalar(ScalarType::Int));
        assert_eq!(
            TypeExpr::parse("list[dict[Address]]").unwrap(),
            TypeExpr::List(Box::new(TypeExpr::Dict(Box::new(TypeExpr::Model("Address".into())))))
        );
        assert_eq!(
            TypeExpr::parse("list[Address]").unwrap().model_reference(),
            Some("Address")
        );
        assert!(TypeExpr::parse("list[]").is_err());
        assert!(TypeExpr::parse("list[int").is_err());
        assert!(TypeExpr::parse("9lives").is_err());
    }

    #[test]
    fn constraints_in_keyword_order() {
        let spec = ConstraintSpec {
            lt: Some(120.0),
            gt: Some(0.0),
            format: Some(StringFormat::Email),
            ..ConstraintSpec::default()
        };
        let names: Vec<String> = spec
            .to_constraints()
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, ["gt", "lt", "email"]);
    }

    #[test]
    fn invalid_pattern_reported() {
        let spec = ConstraintSpec {
            pattern: Some("(".into()),
            ..ConstraintSpec::default()
        };
        assert!(spec.to_constraints().is_err());
    }

    #[test]
    fn invalid_type_names_field() {
        let d = ModelDescriptor::from_json_str(
            r#"{"name": "M", "fields": {"a": {"type": "list[int"}}}"#,
            "m.json",
        )
        .unwrap();
        match d.field_types().unwrap_err() {
            DescriptorError::InvalidType { field, .. } => assert_eq!(field, "a"),
            other => panic!("expected InvalidType, got {other:?}"),
        }
    }
}
