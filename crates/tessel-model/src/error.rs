//! # Error Types — Definition, Validation and Projection Failures
//!
//! Three families of failure, kept apart because callers handle them
//! differently:
//!
//! - [`SchemaError`]: a model declaration is invalid. Raised once, at
//!   definition time; a program that defines its schemas at startup either
//!   has all of them or none.
//! - [`ValidationError`]: an input did not satisfy a schema. Carries every
//!   [`FieldError`] found in the input, not just the first, each with the
//!   dotted path of the offending value.
//! - [`ProjectionError`]: the selection passed to a projection is
//!   malformed or names fields the schema does not have.
//!
//! [`ModelError`] wraps all of them (plus JSON and encoding failures) for
//! the text-level entry points.

use std::fmt;

use tessel_core::{EncodeError, FieldPath, PathError};
use thiserror::Error;

/// An invalid model declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema name is empty.
    #[error("schema name must not be empty")]
    EmptyName,

    /// A field name is empty or contains path syntax.
    #[error("schema '{schema}': invalid field name '{field}'")]
    InvalidFieldName { schema: String, field: String },

    /// Two fields share a name.
    #[error("schema '{schema}': duplicate field '{field}'")]
    DuplicateField { schema: String, field: String },

    /// The schema is reachable from its own fields.
    #[error("schema '{schema}': field '{field}' refers back to the schema via {via}")]
    CyclicReference {
        schema: String,
        field: String,
        /// Model names along the reference chain, joined with ` -> `.
        via: String,
    },

    /// A default value does not conform to the declared type.
    #[error("schema '{schema}': default for field '{field}' is not a valid {expected}: {reason}")]
    DefaultTypeMismatch {
        schema: String,
        field: String,
        expected: String,
        reason: String,
    },

    /// A default value fails one of the field's own constraints.
    #[error("schema '{schema}': default for field '{field}' violates constraint '{constraint}': {reason}")]
    DefaultConstraintViolated {
        schema: String,
        field: String,
        constraint: String,
        reason: String,
    },

    /// An optional field has neither a default nor nullability.
    #[error("schema '{schema}': optional field '{field}' needs a default or must be nullable")]
    MissingDefault { schema: String, field: String },

    /// A constraint cannot apply to the field's declared type.
    #[error("schema '{schema}': constraint '{constraint}' does not apply to field '{field}' of type {field_type}")]
    IncompatibleConstraint {
        schema: String,
        field: String,
        constraint: String,
        field_type: String,
    },

    /// A hook was registered for a field the schema does not declare.
    #[error("schema '{schema}': hook '{hook}' registered for unknown field '{field}'")]
    UnknownHookField {
        schema: String,
        field: String,
        hook: String,
    },
}

/// Category of a single field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldErrorKind {
    /// A required field was absent.
    Missing,
    /// The value could not be coerced to the declared type.
    TypeMismatch,
    /// A constraint rejected the coerced value.
    ConstraintViolated,
    /// A check hook rejected the value.
    ValidatorFailed,
    /// An undeclared key was present under `extra = forbid`.
    ExtraForbidden,
}

impl FieldErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::TypeMismatch => "type_mismatch",
            Self::ConstraintViolated => "constraint_violated",
            Self::ValidatorFailed => "validator_failed",
            Self::ExtraForbidden => "extra_forbidden",
        }
    }
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failure at one location of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path of the offending value.
    pub path: FieldPath,
    /// What went wrong.
    pub kind: FieldErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    pub fn new(path: FieldPath, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    pub fn missing(path: FieldPath) -> Self {
        Self::new(path, FieldErrorKind::Missing, "Field required")
    }

    pub fn type_mismatch(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(path, FieldErrorKind::TypeMismatch, message)
    }

    pub fn constraint(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(path, FieldErrorKind::ConstraintViolated, message)
    }

    pub fn validator(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(path, FieldErrorKind::ValidatorFailed, message)
    }

    pub fn extra_forbidden(path: FieldPath) -> Self {
        Self::new(path, FieldErrorKind::ExtraForbidden, "Extra inputs are not permitted")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {} [{}]", self.path, self.message, self.kind)
    }
}

/// An input rejected by a schema, with every field failure found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    schema: String,
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(schema: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            schema: schema.into(),
            errors,
        }
    }

    /// Name of the schema the input was validated against.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Field failures in declaration order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first failure recorded at `path`, if any.
    pub fn at(&self, path: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.path.as_str() == path)
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "error" } else { "errors" };
        write!(
            f,
            "{} validation {noun} for {}",
            self.errors.len(),
            self.schema
        )?;
        for e in &self.errors {
            write!(f, "\n{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A malformed projection selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// Both `include` and `exclude` were given.
    #[error("include and exclude cannot be combined")]
    IncludeExcludeConflict,

    /// A selection key names a field the schema does not declare.
    #[error("unknown field '{field}' in selection for '{schema}'")]
    UnknownField { schema: String, field: String },

    /// A dotted key descends into a field that is not a nested model.
    #[error("field '{field}' of '{schema}' is not a nested model")]
    NotNested { schema: String, field: String },

    /// A selection key is syntactically invalid.
    #[error("malformed selection key: {0}")]
    MalformedPath(#[from] PathError),
}

/// Umbrella error for the text-level entry points.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// The input text was not valid JSON or not a JSON object.
    #[error("invalid JSON input: {0}")]
    Json(String),

    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
