//! # Document Conformance
//!
//! Strict structural checks of JSON/YAML documents against the JSON Schema
//! exported from a [`Schema`]. Unlike building an instance, nothing is
//! coerced: `"30"` is not an integer here. This is the check for documents
//! produced elsewhere that claim to be projections of a model.
//!
//! Validation is backed by the `jsonschema` crate (Draft 2020-12) with
//! format assertions enabled, so `email` and `uri` formats are enforced.
//! All violations are reported, each with its instance path, schema path
//! and message.

use std::path::Path;

use jsonschema::Validator;
use serde_json::Value as Json;
use tessel_model::{Instance, Schema};

use crate::error::{ConformanceError, ValidationViolations, Violation};
use crate::json_schema::json_schema;

/// A compiled conformance check for one schema.
///
/// `DocumentValidator` is `Send + Sync`; compile once and share.
pub struct DocumentValidator {
    schema_name: String,
    document: Json,
    validator: Validator,
}

impl std::fmt::Debug for DocumentValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentValidator")
            .field("schema_name", &self.schema_name)
            .finish_non_exhaustive()
    }
}

impl DocumentValidator {
    /// Export and compile the JSON Schema of `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::ValidatorBuildError`] if the exported
    /// schema does not compile, e.g. a `pattern` the JSON Schema regex
    /// dialect rejects.
    pub fn new(schema: &Schema) -> Result<Self, ConformanceError> {
        let document = json_schema(schema);
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.should_validate_formats(true);
        let validator = opts
            .build(&document)
            .map_err(|e| ConformanceError::ValidatorBuildError {
                schema_name: schema.name().to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(schema = schema.name(), "conformance validator compiled");
        Ok(Self {
            schema_name: schema.name().to_string(),
            document,
            validator,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// The exported JSON Schema this validator checks against.
    pub fn json_schema(&self) -> &Json {
        &self.document
    }

    pub fn is_valid(&self, document: &Json) -> bool {
        self.validator.is_valid(document)
    }

    /// Check a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::ValidationFailed`] with every violation.
    pub fn validate_document(&self, document: &Json) -> Result<(), ConformanceError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(document)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConformanceError::ValidationFailed {
                schema_name: self.schema_name.clone(),
                violations: ValidationViolations::new(violations),
            })
        }
    }

    /// Check the full projection of an instance.
    ///
    /// # Errors
    ///
    /// As [`DocumentValidator::validate_document`].
    pub fn validate_instance(&self, instance: &Instance) -> Result<(), ConformanceError> {
        self.validate_document(&Json::Object(instance.to_document()))
    }

    /// Check a YAML (`.yaml`/`.yml`) or JSON document file.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::DocumentLoadError`] if the file cannot be
    /// read or parsed, otherwise as
    /// [`DocumentValidator::validate_document`].
    pub fn validate_file(&self, path: &Path) -> Result<(), ConformanceError> {
        let load_error = |reason: String| ConformanceError::DocumentLoadError {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| load_error(format!("cannot read file: {e}")))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let document: Json = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| load_error(format!("invalid YAML: {e}")))?,
            _ => serde_json::from_str(&content)
                .map_err(|e| load_error(format!("invalid JSON: {e}")))?,
        };
        self.validate_document(&document)
    }
}
