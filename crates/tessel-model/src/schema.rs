//! # Model Schemas
//!
//! A [`Schema`] is the immutable declaration of a model: an ordered set of
//! uniquely named [`FieldDescriptor`]s plus a [`ModelConfig`]. Field order is
//! significant: it is the order in which fields are validated, errors are
//! reported, and projected documents list their keys.
//!
//! ## Definition
//!
//! Schemas are defined once and shared as `Arc<Schema>`. There is no
//! mutation API; "changing" a schema means defining a new one.
//! [`SchemaBuilder::define`] rejects, with a [`SchemaError`]:
//!
//! - empty schema names and field names that are empty or contain path
//!   syntax (`.`, `[`, `]`),
//! - duplicate field names,
//! - cyclic nesting (the schema being defined reachable through its own
//!   field types),
//! - constraints that cannot apply to the field's declared type,
//! - hooks registered for undeclared fields,
//! - optional fields with neither a default nor nullability,
//! - defaults that do not conform to the declared type, or that fail one
//!   of the field's constraints.
//!
//! Defaults are coerced once, here, under the field's own strictness, so
//! the stored default is always of the declared type. Hooks are not run
//! here; a default passes through them each time it fills a field.
//!
//! ## Nesting
//!
//! Embedded schemas are distinct `Arc`s, so a schema can never reach
//! itself by identity. Names are what descriptors, error messages and the
//! JSON Schema export refer to, so nesting is checked by name: a schema
//! may not embed, at any depth, a schema carrying its own name.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessel_core::FieldPath;

use crate::coerce::{coerce, Policy};
use crate::error::SchemaError;
use crate::field::FieldDescriptor;
use crate::hook::{Phase, ValidatorHook};
use crate::value::Value;

/// What to do with input keys that match no declared field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraPolicy {
    /// Drop them silently.
    #[default]
    Ignore,
    /// Report each one as an `ExtraForbidden` field error.
    Forbid,
}

/// Model-wide behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Handling of undeclared input keys.
    pub extra: ExtraPolicy,
    /// Treat every field as strict.
    pub strict: bool,
    /// Strip surrounding whitespace from strings coerced into `str` fields.
    pub str_strip_whitespace: bool,
}

/// An immutable model declaration.
#[derive(Debug)]
pub struct Schema {
    name: String,
    config: ModelConfig,
    fields: IndexMap<String, FieldDescriptor>,
}

impl Schema {
    /// Start building a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            config: ModelConfig::default(),
            fields: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Define a schema from field descriptors with the default config.
    ///
    /// # Errors
    ///
    /// See [`SchemaBuilder::define`].
    pub fn define(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> Result<Arc<Schema>, SchemaError> {
        Self::builder(name).fields(fields).define()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The coercion policy for one field of this schema.
    pub(crate) fn policy_for(&self, field: &FieldDescriptor) -> Policy {
        Policy {
            strict: field.strict || self.config.strict,
            strip_whitespace: self.config.str_strip_whitespace,
        }
    }
}

/// Incremental schema definition.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    config: ModelConfig,
    fields: Vec<FieldDescriptor>,
    hooks: Vec<(String, Phase, ValidatorHook)>,
}

impl SchemaBuilder {
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Register a hook on a field by name. Hooks registered here run after
    /// any hooks already attached to the descriptor, in registration order.
    pub fn hook(mut self, field: impl Into<String>, phase: Phase, hook: ValidatorHook) -> Self {
        self.hooks.push((field.into(), phase, hook));
        self
    }

    pub fn before(self, field: impl Into<String>, hook: ValidatorHook) -> Self {
        self.hook(field, Phase::Before, hook)
    }

    pub fn after(self, field: impl Into<String>, hook: ValidatorHook) -> Self {
        self.hook(field, Phase::After, hook)
    }

    /// Check the declaration and freeze it.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found, checking fields in
    /// declaration order.
    pub fn define(self) -> Result<Arc<Schema>, SchemaError> {
        let SchemaBuilder {
            name,
            config,
            fields: declared,
            hooks,
        } = self;

        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }

        let mut fields: IndexMap<String, FieldDescriptor> = IndexMap::with_capacity(declared.len());
        for field in declared {
            if !valid_field_name(&field.name) {
                return Err(SchemaError::InvalidFieldName {
                    schema: name,
                    field: field.name,
                });
            }
            if fields.contains_key(&field.name) {
                return Err(SchemaError::DuplicateField {
                    schema: name,
                    field: field.name,
                });
            }
            fields.insert(field.name.clone(), field);
        }

        for (field_name, phase, hook) in hooks {
            let Some(field) = fields.get_mut(&field_name) else {
                return Err(SchemaError::UnknownHookField {
                    schema: name,
                    field: field_name,
                    hook: hook.name().to_string(),
                });
            };
            match phase {
                Phase::Before => field.before_hooks.push(hook),
                Phase::After => field.after_hooks.push(hook),
            }
        }

        for field in fields.values_mut() {
            if let Some(chain) = field.field_type.reference_chain(&name) {
                return Err(SchemaError::CyclicReference {
                    schema: name,
                    field: field.name.clone(),
                    via: chain.join(" -> "),
                });
            }

            if let Some(constraint) = field
                .constraints
                .iter()
                .find(|c| !c.applies_to(&field.field_type))
            {
                return Err(SchemaError::IncompatibleConstraint {
                    schema: name,
                    field: field.name.clone(),
                    constraint: constraint.name().to_string(),
                    field_type: field.field_type.type_name(),
                });
            }

            if field.required {
                continue;
            }
            let policy = Policy {
                strict: field.strict || config.strict,
                strip_whitespace: config.str_strip_whitespace,
            };
            field.default = match field.default.take() {
                Some(raw) => {
                    let path = FieldPath::new(field.name.clone());
                    match coerce(raw, &field.field_type, field.nullable, policy, &path) {
                        Ok(value) => Some(value),
                        Err(errors) => {
                            let reason = errors
                                .first()
                                .map(|e| e.message.clone())
                                .unwrap_or_default();
                            return Err(SchemaError::DefaultTypeMismatch {
                                schema: name,
                                field: field.name.clone(),
                                expected: field.field_type.type_name(),
                                reason,
                            });
                        }
                    }
                }
                None if field.nullable => Some(Value::Null),
                None => {
                    return Err(SchemaError::MissingDefault {
                        schema: name,
                        field: field.name.clone(),
                    })
                }
            };

            if let Some(default) = field.default.as_ref().filter(|d| !d.is_null()) {
                for constraint in &field.constraints {
                    if let Err(reason) = constraint.check(default) {
                        return Err(SchemaError::DefaultConstraintViolated {
                            schema: name,
                            field: field.name.clone(),
                            constraint: constraint.name().to_string(),
                            reason,
                        });
                    }
                }
            }
        }

        tracing::debug!(schema = %name, fields = fields.len(), "schema defined");
        Ok(Arc::new(Schema {
            name,
            config,
            fields,
        }))
    }
}

fn valid_field_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['.', '[', ']'])
}
