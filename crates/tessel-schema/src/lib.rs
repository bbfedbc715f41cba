//! # tessel-schema — Declarative Models & JSON Schema
//!
//! The declarative layer over `tessel-model`.
//!
//! ## Descriptors (`descriptor`, `registry`)
//!
//! Models can be written as YAML or JSON [`ModelDescriptor`]s instead of
//! builder calls. A [`SchemaRegistry`] resolves a set of descriptors into
//! shared schemas: model references by name, hook names through a
//! [`HookTable`], embedded models defined first, cycles rejected.
//! [`SchemaRegistry::load_dir`] picks up every `*.model.yaml`,
//! `*.model.yml` and `*.model.json` file in a directory.
//!
//! ## JSON Schema (`json_schema`, `validate`)
//!
//! [`json_schema`] exports any schema as a Draft 2020-12 document.
//! [`DocumentValidator`] compiles that export with `jsonschema` and checks
//! documents strictly, without coercion, reporting every [`Violation`].
//!
//! ## Crate Policy
//!
//! - Depends only on `tessel-model` internally.
//! - Descriptors are untrusted input: unknown keys are rejected, and every
//!   reference is resolved before any schema is defined.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod descriptor;
pub mod error;
pub mod json_schema;
pub mod registry;
pub mod validate;

pub use descriptor::{ConstraintSpec, FieldSpec, HookSpec, ModelDescriptor, StringFormat, TypeExpr};
pub use error::{ConformanceError, DescriptorError, RegistryError, ValidationViolations, Violation};
pub use json_schema::{json_schema, DRAFT_2020_12};
pub use registry::{HookTable, SchemaRegistry, DESCRIPTOR_SUFFIXES};
pub use validate::DocumentValidator;
