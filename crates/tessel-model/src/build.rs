//! # Instance Builder
//!
//! Turns a raw input map into an [`Instance`] or a [`ValidationError`]
//! listing every problem found. Fields are processed in declaration order,
//! each through the same pipeline:
//!
//! ```text
//! lookup ─► before hooks ─► coercion ─► constraints ─► after hooks ─► store
//!   │            │              │             │              │
//!   Missing   ValidatorFailed  TypeMismatch  ConstraintViolated  ValidatorFailed
//! ```
//!
//! A failure at any stage stops that field only; the remaining fields are
//! still attempted so the caller sees all errors at once. Only the first
//! failing constraint of a field is reported. A default filling an absent
//! field enters the pipeline as its raw value, so hooks run on it too; it
//! keeps [`FieldSource::Default`] as its source.
//!
//! Input keys that match no field are dropped, or reported as
//! `ExtraForbidden` when the schema's config forbids extras.

use std::sync::Arc;

use indexmap::IndexMap;
use tessel_core::FieldPath;

use crate::coerce::coerce;
use crate::error::{FieldError, ModelError, ValidationError};
use crate::field::FieldDescriptor;
use crate::instance::{FieldSource, Instance, Slot};
use crate::schema::{ExtraPolicy, Schema};
use crate::value::{Map, Value};

/// Build an instance of `schema` from `input`.
///
/// # Errors
///
/// Returns a [`ValidationError`] carrying every field failure, in
/// declaration order, followed by forbidden extra keys.
pub fn build(schema: &Arc<Schema>, input: Map) -> Result<Instance, ValidationError> {
    build_at(schema, input, &FieldPath::root()).map_err(|errors| {
        tracing::debug!(schema = schema.name(), errors = errors.len(), "input rejected");
        ValidationError::new(schema.name(), errors)
    })
}

impl Schema {
    /// Build an instance of this schema. See [`build`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every field failure.
    pub fn build(self: &Arc<Self>, input: Map) -> Result<Instance, ValidationError> {
        build(self, input)
    }

    /// Build from a parsed JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// A non-object root is a single `TypeMismatch` at the root path.
    pub fn build_json(self: &Arc<Self>, input: &serde_json::Value) -> Result<Instance, ValidationError> {
        match Value::from(input.clone()) {
            Value::Map(map) => build(self, map),
            _ => Err(ValidationError::new(
                self.name(),
                vec![FieldError::type_mismatch(
                    FieldPath::root(),
                    format!("Input should be a valid dictionary or instance of {}", self.name()),
                )],
            )),
        }
    }

    /// Build from JSON text.
    ///
    /// # Errors
    ///
    /// [`ModelError::Json`] when the text does not parse, otherwise
    /// [`ModelError::Validation`].
    pub fn build_json_str(self: &Arc<Self>, input: &str) -> Result<Instance, ModelError> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        Ok(self.build_json(&value)?)
    }
}

/// Build with error paths rooted at `prefix`. Nested models go through
/// here so their errors read `parent.child`.
pub(crate) fn build_at(
    schema: &Arc<Schema>,
    mut input: Map,
    prefix: &FieldPath,
) -> Result<Instance, Vec<FieldError>> {
    let mut slots = IndexMap::with_capacity(schema.len());
    let mut errors = Vec::new();

    for field in schema.fields() {
        let path = prefix.child(field.name());
        let (raw, source) = match input.shift_remove(field.name()) {
            Some(raw) => (raw, FieldSource::Input),
            None => match field.default_value() {
                Some(default) if !field.is_required() => (default.clone(), FieldSource::Default),
                _ => {
                    errors.push(FieldError::missing(path));
                    continue;
                }
            },
        };
        match run_pipeline(schema, field, raw, &path) {
            Ok(value) => {
                slots.insert(field.name().to_string(), Slot { value, source });
            }
            Err(mut e) => errors.append(&mut e),
        }
    }

    if schema.config().extra == ExtraPolicy::Forbid {
        errors.extend(
            input
                .keys()
                .map(|key| FieldError::extra_forbidden(prefix.child(key))),
        );
    }

    if errors.is_empty() {
        Ok(Instance::new(Arc::clone(schema), slots))
    } else {
        Err(errors)
    }
}

fn run_pipeline(
    schema: &Schema,
    field: &FieldDescriptor,
    raw: Value,
    path: &FieldPath,
) -> Result<Value, Vec<FieldError>> {
    let mut value = raw;
    for hook in field.before_hooks() {
        value = hook
            .apply(value)
            .map_err(|e| vec![FieldError::validator(path.clone(), e.message())])?;
    }

    let mut value = coerce(
        value,
        field.field_type(),
        field.is_nullable(),
        schema.policy_for(field),
        path,
    )?;

    if !value.is_null() {
        for constraint in field.constraint_list() {
            constraint
                .check(&value)
                .map_err(|message| vec![FieldError::constraint(path.clone(), message)])?;
        }
    }

    for hook in field.after_hooks() {
        value = hook
            .apply(value)
            .map_err(|e| vec![FieldError::validator(path.clone(), e.message())])?;
    }
    Ok(value)
}
