//! # Field Descriptors
//!
//! A [`FieldDescriptor`] binds a field name to its declared [`FieldType`],
//! requiredness, default, strictness, constraints and hooks. Descriptors
//! are assembled with a by-value builder and handed to
//! [`Schema::builder`](crate::Schema::builder) or
//! [`Schema::define`](crate::Schema::define), which checks them and freezes
//! them into the schema.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::hook::ValidatorHook;
use crate::schema::Schema;
use crate::value::Value;

/// Scalar field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Str,
    Int,
    Float,
    Bool,
}

impl ScalarType {
    /// Returns the type name used in descriptors and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The declared type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A scalar.
    Scalar(ScalarType),
    /// A sequence whose elements all have the inner type.
    Sequence(Box<FieldType>),
    /// A string-keyed mapping whose values all have the inner type.
    Mapping(Box<FieldType>),
    /// A nested model.
    Model(Arc<Schema>),
}

impl FieldType {
    pub const STR: FieldType = FieldType::Scalar(ScalarType::Str);
    pub const INT: FieldType = FieldType::Scalar(ScalarType::Int);
    pub const FLOAT: FieldType = FieldType::Scalar(ScalarType::Float);
    pub const BOOL: FieldType = FieldType::Scalar(ScalarType::Bool);

    pub fn sequence_of(element: FieldType) -> Self {
        Self::Sequence(Box::new(element))
    }

    pub fn mapping_of(value: FieldType) -> Self {
        Self::Mapping(Box::new(value))
    }

    pub fn model(schema: &Arc<Schema>) -> Self {
        Self::Model(Arc::clone(schema))
    }

    /// Descriptor-style type name: `str`, `list[int]`, `dict[str]`, `Address`.
    pub fn type_name(&self) -> String {
        match self {
            Self::Scalar(s) => s.as_str().to_string(),
            Self::Sequence(inner) => format!("list[{}]", inner.type_name()),
            Self::Mapping(inner) => format!("dict[{}]", inner.type_name()),
            Self::Model(schema) => schema.name().to_string(),
        }
    }

    /// The model schema reached by selecting into this type, looking
    /// through sequences and mappings.
    pub fn model_schema(&self) -> Option<&Arc<Schema>> {
        match self {
            Self::Model(schema) => Some(schema),
            Self::Sequence(inner) | Self::Mapping(inner) => inner.model_schema(),
            Self::Scalar(_) => None,
        }
    }

    /// If a schema named `target` is reachable through this type, the chain
    /// of model names leading to it (`["Address", "Patient"]`).
    pub fn reference_chain(&self, target: &str) -> Option<Vec<String>> {
        let mut trail = Vec::new();
        if self.find_reference(target, &mut trail) {
            Some(trail)
        } else {
            None
        }
    }

    fn find_reference(&self, target: &str, trail: &mut Vec<String>) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Sequence(inner) | Self::Mapping(inner) => inner.find_reference(target, trail),
            Self::Model(schema) => {
                trail.push(schema.name().to_string());
                if schema.name() == target
                    || schema
                        .fields()
                        .any(|f| f.field_type().find_reference(target, trail))
                {
                    return true;
                }
                trail.pop();
                false
            }
        }
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) | (Self::Mapping(a), Self::Mapping(b)) => a == b,
            (Self::Model(a), Self::Model(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<ScalarType> for FieldType {
    fn from(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }
}

/// One field of a model.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) field_type: FieldType,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) nullable: bool,
    pub(crate) strict: bool,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) before_hooks: Vec<ValidatorHook>,
    pub(crate) after_hooks: Vec<ValidatorHook>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) examples: Vec<Value>,
}

impl FieldDescriptor {
    /// A required, non-nullable, non-strict field with no constraints.
    pub fn new(name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            required: true,
            default: None,
            nullable: false,
            strict: false,
            constraints: Vec::new(),
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
            title: None,
            description: None,
            examples: Vec::new(),
        }
    }

    /// Make the field optional with this default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Make the field optional without a default. Only valid together with
    /// [`FieldDescriptor::nullable`], in which case the default is `null`.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Accept `null` as a value.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Accept only values already of the exact declared type.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Append a hook that runs on the raw value.
    pub fn before(mut self, hook: ValidatorHook) -> Self {
        self.before_hooks.push(hook);
        self
    }

    /// Append a hook that runs on the coerced value.
    pub fn after(mut self, hook: ValidatorHook) -> Self {
        self.after_hooks.push(hook);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The default value. After schema definition every optional field has
    /// one (`null` for nullable fields declared without a default).
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn constraint_list(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn before_hooks(&self) -> &[ValidatorHook] {
        &self.before_hooks
    }

    pub fn after_hooks(&self) -> &[ValidatorHook] {
        &self.after_hooks
    }

    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn examples(&self) -> &[Value] {
        &self.examples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!(FieldType::STR.type_name(), "str");
        assert_eq!(
            FieldType::sequence_of(FieldType::mapping_of(FieldType::INT)).type_name(),
            "list[dict[int]]"
        );
    }

    #[test]
    fn default_makes_field_optional() {
        let f = FieldDescriptor::new("married", FieldType::BOOL).default(false);
        assert!(!f.is_required());
        assert_eq!(f.default_value(), Some(&Value::Bool(false)));
    }

    #[test]
    fn builder_accumulates_in_order() {
        let f = FieldDescriptor::new("age", FieldType::INT)
            .constraint(Constraint::Gt(0.0))
            .constraint(Constraint::Lt(120.0))
            .title("Age")
            .example(30);
        let names: Vec<&str> = f.constraint_list().iter().map(Constraint::name).collect();
        assert_eq!(names, ["gt", "lt"]);
        assert_eq!(f.title_text(), Some("Age"));
        assert_eq!(f.examples(), [Value::Int(30)]);
    }

    #[test]
    fn scalar_types_are_not_models() {
        assert!(FieldType::INT.model_schema().is_none());
        assert!(FieldType::sequence_of(FieldType::STR).reference_chain("X").is_none());
    }
}
