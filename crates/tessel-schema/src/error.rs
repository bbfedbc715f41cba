//! # Error Types
//!
//! - [`DescriptorError`]: a single descriptor could not be read or parsed.
//! - [`RegistryError`]: a set of descriptors does not resolve into schemas.
//! - [`ConformanceError`]: a document failed a JSON Schema check, with the
//!   full list of [`Violation`]s.

use std::fmt;

use tessel_model::SchemaError;
use thiserror::Error;

/// A descriptor that cannot be turned into field declarations.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// The descriptor text is not valid YAML or JSON for the descriptor shape.
    #[error("descriptor parse error for '{source_name}': {reason}")]
    Parse { source_name: String, reason: String },

    /// A field's `type` does not follow the type grammar.
    #[error("model '{model}', field '{field}': invalid type '{type_expr}': {reason}")]
    InvalidType {
        model: String,
        field: String,
        type_expr: String,
        reason: String,
    },

    /// A `pattern` constraint does not compile.
    #[error("model '{model}', field '{field}': invalid pattern: {reason}")]
    InvalidPattern {
        model: String,
        field: String,
        reason: String,
    },

    /// The file extension is not one of the descriptor formats.
    #[error("unsupported descriptor format: {0}")]
    UnsupportedFormat(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Descriptors that do not resolve into a consistent set of schemas.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Two descriptors declare the same model name.
    #[error("duplicate model '{0}'")]
    DuplicateModel(String),

    /// A field type names a model no descriptor declares.
    #[error("model '{model}', field '{field}': unknown model '{reference}'")]
    UnknownModel {
        model: String,
        field: String,
        reference: String,
    },

    /// A descriptor names a hook missing from the hook table.
    #[error("model '{model}', field '{field}': unknown hook '{hook}'")]
    UnknownHook {
        model: String,
        field: String,
        hook: String,
    },

    /// Models refer to each other in a cycle.
    #[error("reference cycle between models: {chain}")]
    Cycle {
        /// Model names along the cycle, joined with ` -> `.
        chain: String,
    },

    /// The resolved declaration was rejected by the model engine.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A lookup named a model the registry does not hold.
    #[error("model '{0}' is not registered")]
    NotRegistered(String),
}

/// A single JSON Schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating value in the document.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Every violation found in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A document checked against an exported JSON Schema.
#[derive(Error, Debug)]
pub enum ConformanceError {
    /// The document does not conform.
    #[error("document does not conform to '{schema_name}':\n{violations}")]
    ValidationFailed {
        schema_name: String,
        violations: ValidationViolations,
    },

    /// The exported schema could not be compiled.
    #[error("validator build error for '{schema_name}': {reason}")]
    ValidatorBuildError { schema_name: String, reason: String },

    /// The document file could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError { path: String, reason: String },
}
