//! # tessel-model — Schemas, Instances and Projection
//!
//! The validation engine. A caller declares a [`Schema`] once (named,
//! typed fields with constraints and hooks), then builds immutable
//! [`Instance`]s from loosely typed input and projects them back into
//! ordered JSON documents.
//!
//! ```text
//! input map ─► build ─► Instance ─► project ─► Document ─► encode ─► text
//! ```
//!
//! ## Building
//!
//! [`build`] runs every declared field through the same pipeline: before
//! hooks, coercion under the [`COERCION_TABLE`], constraints, after hooks.
//! All fields are attempted; a rejected input comes back as one
//! [`ValidationError`] listing every [`FieldError`] with its dotted path.
//!
//! ## Projection
//!
//! [`project`] renders an instance under [`ProjectOptions`]: dotted
//! `include` / `exclude` selections, and filters on where a value came
//! from (`unset_only`, `exclude_unset`), default equality and `null`.
//!
//! ## Crate Policy
//!
//! - Depends only on `tessel-core` internally.
//! - Schemas and instances are immutable and `Send + Sync`; a schema is
//!   shared as `Arc<Schema>` and needs no locking.
//! - Failures are returned, never logged. `tracing` carries diagnostics
//!   only.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod build;
pub mod coerce;
pub mod constraint;
pub mod error;
pub mod field;
pub mod hook;
pub mod instance;
pub mod project;
pub mod schema;
pub mod value;

pub use build::build;
pub use coerce::{lookup, CoercionRule, Conversion, COERCION_TABLE};
pub use constraint::{Constraint, CustomCheck};
pub use error::{
    FieldError, FieldErrorKind, ModelError, ProjectionError, SchemaError, ValidationError,
};
pub use field::{FieldDescriptor, FieldType, ScalarType};
pub use hook::{HookError, HookKind, Phase, ValidatorHook};
pub use instance::{FieldSource, Instance};
pub use project::{project, Document, ProjectOptions};
pub use schema::{ExtraPolicy, ModelConfig, Schema, SchemaBuilder};
pub use tessel_core::{Encoding, FieldPath};
pub use value::{Map, Value, ValueKind};
