//! # Projector
//!
//! Renders an [`Instance`] as an ordered JSON [`Document`], optionally
//! restricted to a selection of fields, and encodes documents as text.
//!
//! ## Selections
//!
//! `include` and `exclude` take dotted keys. Each key is split on its first
//! separator per level, so `address.city` selects `city` inside the nested
//! model at `address`. Keys are checked against the schema before anything
//! is rendered:
//!
//! - a head that is not a field of the schema at that level is
//!   [`ProjectionError::UnknownField`],
//! - descending into a field that holds no model is
//!   [`ProjectionError::NotNested`],
//! - empty keys or segments are [`ProjectionError::MalformedPath`].
//!
//! A selection on a field holding a sequence or mapping of models applies
//! to every element. Selecting a whole field and one of its children at
//! the same time selects the whole field.
//!
//! ## Flags
//!
//! `unset_only`, `exclude_unset`, `exclude_defaults` and `exclude_none`
//! filter fields at every level, after the selection. Output keys always
//! follow schema declaration order.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessel_core::{encode, split_selector, Encoding};

use crate::error::{ModelError, ProjectionError};
use crate::instance::{FieldSource, Instance};
use crate::schema::Schema;
use crate::value::Value;

/// An ordered JSON object: the projector's output.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Per-call projection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectOptions {
    /// Emit only these fields.
    pub include: Option<BTreeSet<String>>,
    /// Emit every field except these.
    pub exclude: Option<BTreeSet<String>>,
    /// Emit only fields filled from schema defaults.
    pub unset_only: bool,
    /// Emit only fields supplied in the input.
    pub exclude_unset: bool,
    /// Omit fields whose value equals the schema default.
    pub exclude_defaults: bool,
    /// Omit fields whose value is `null`.
    pub exclude_none: bool,
}

impl ProjectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn unset_only(mut self) -> Self {
        self.unset_only = true;
        self
    }

    pub fn exclude_unset(mut self) -> Self {
        self.exclude_unset = true;
        self
    }

    pub fn exclude_defaults(mut self) -> Self {
        self.exclude_defaults = true;
        self
    }

    pub fn exclude_none(mut self) -> Self {
        self.exclude_none = true;
        self
    }
}

// ─── Selection trees ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Selection {
    /// The whole field.
    All,
    /// Only these children of the nested model.
    Fields(Tree),
}

type Tree = IndexMap<String, Selection>;

#[derive(Debug, Clone, Copy)]
enum Mode<'a> {
    Everything,
    Include(&'a Tree),
    Exclude(&'a Tree),
}

fn compile(keys: &BTreeSet<String>, schema: &Schema) -> Result<Tree, ProjectionError> {
    let mut tree = Tree::new();
    for key in keys {
        insert_key(&mut tree, key, schema)?;
    }
    Ok(tree)
}

fn insert_key(tree: &mut Tree, key: &str, schema: &Schema) -> Result<(), ProjectionError> {
    let (head, rest) = split_selector(key)?;
    let field = schema
        .field(head)
        .ok_or_else(|| ProjectionError::UnknownField {
            schema: schema.name().to_string(),
            field: head.to_string(),
        })?;
    match rest {
        None => {
            tree.insert(head.to_string(), Selection::All);
        }
        Some(rest) => {
            let nested = field
                .field_type()
                .model_schema()
                .ok_or_else(|| ProjectionError::NotNested {
                    schema: schema.name().to_string(),
                    field: head.to_string(),
                })?;
            let entry = tree
                .entry(head.to_string())
                .or_insert_with(|| Selection::Fields(Tree::new()));
            match entry {
                // Already selected whole; still validate the child key.
                Selection::All => insert_key(&mut Tree::new(), rest, nested)?,
                Selection::Fields(sub) => insert_key(sub, rest, nested)?,
            }
        }
    }
    Ok(())
}

// ─── Rendering ──────────────────────────────────────────────────────

/// Project `instance` under `options`.
///
/// # Errors
///
/// Returns a [`ProjectionError`] when both `include` and `exclude` are set
/// or a selection key does not resolve against the schema.
pub fn project(instance: &Instance, options: &ProjectOptions) -> Result<Document, ProjectionError> {
    let schema = instance.schema();
    let tree;
    let mode = match (&options.include, &options.exclude) {
        (Some(_), Some(_)) => return Err(ProjectionError::IncludeExcludeConflict),
        (Some(keys), None) => {
            tree = compile(keys, schema)?;
            Mode::Include(&tree)
        }
        (None, Some(keys)) => {
            tree = compile(keys, schema)?;
            Mode::Exclude(&tree)
        }
        (None, None) => Mode::Everything,
    };
    Ok(render_instance(instance, mode, options))
}

fn render_instance(instance: &Instance, mode: Mode<'_>, options: &ProjectOptions) -> Document {
    let schema = instance.schema();
    let mut doc = Document::new();
    for (name, slot) in instance.slots() {
        let child = match mode {
            Mode::Everything => Mode::Everything,
            Mode::Include(tree) => match tree.get(name) {
                None => continue,
                Some(Selection::All) => Mode::Everything,
                Some(Selection::Fields(sub)) => Mode::Include(sub),
            },
            Mode::Exclude(tree) => match tree.get(name) {
                None => Mode::Everything,
                Some(Selection::All) => continue,
                Some(Selection::Fields(sub)) => Mode::Exclude(sub),
            },
        };
        if options.unset_only && slot.source != FieldSource::Default {
            continue;
        }
        if options.exclude_unset && slot.source != FieldSource::Input {
            continue;
        }
        if options.exclude_none && slot.value.is_null() {
            continue;
        }
        if options.exclude_defaults
            && schema
                .field(name)
                .and_then(|f| f.default_value())
                .is_some_and(|d| *d == slot.value)
        {
            continue;
        }
        doc.insert(name.to_string(), render_value(&slot.value, child, options));
    }
    doc
}

fn render_value(value: &Value, mode: Mode<'_>, options: &ProjectOptions) -> serde_json::Value {
    match value {
        Value::Model(instance) => serde_json::Value::Object(render_instance(instance, mode, options)),
        Value::List(items) => serde_json::Value::Array(
            items.iter().map(|v| render_value(v, mode, options)).collect(),
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, mode, options)))
                .collect(),
        ),
        other => other.to_json(),
    }
}

// ─── Instance entry points ──────────────────────────────────────────

impl Instance {
    /// See [`project`].
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectionError`] for a malformed selection.
    pub fn project(&self, options: &ProjectOptions) -> Result<Document, ProjectionError> {
        project(self, options)
    }

    /// Every field, nested instances included.
    pub fn to_document(&self) -> Document {
        render_instance(self, Mode::Everything, &ProjectOptions::default())
    }

    /// Compact JSON text of the projection.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Projection`] for a malformed selection.
    pub fn to_json(&self, options: &ProjectOptions) -> Result<String, ModelError> {
        self.encode(options, Encoding::Compact)
    }

    /// Indented JSON text of the projection.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Projection`] for a malformed selection.
    pub fn to_json_pretty(&self, options: &ProjectOptions) -> Result<String, ModelError> {
        self.encode(options, Encoding::Pretty)
    }

    /// JSON text of the projection in the chosen encoding.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Projection`] for a malformed selection and
    /// [`ModelError::Encode`] if serialization fails.
    pub fn encode(&self, options: &ProjectOptions, encoding: Encoding) -> Result<String, ModelError> {
        let doc = self.project(options)?;
        Ok(encode(&serde_json::Value::Object(doc), encoding)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescriptor, FieldType};
    use serde_json::json;
    use std::sync::Arc;

    fn address() -> Arc<Schema> {
        Schema::define(
            "Address",
            [
                FieldDescriptor::new("city", FieldType::STR),
                FieldDescriptor::new("state", FieldType::STR),
                FieldDescriptor::new("pin", FieldType::STR),
            ],
        )
        .unwrap()
    }

    fn patient() -> Arc<Schema> {
        Schema::define(
            "Patient",
            [
                FieldDescriptor::new("name", FieldType::STR),
                FieldDescriptor::new("gender", FieldType::STR).default("Male"),
                FieldDescriptor::new("age", FieldType::INT),
                FieldDescriptor::new("address", FieldType::model(&address())),
            ],
        )
        .unwrap()
    }

    fn sample() -> Instance {
        patient()
            .build_json(&json!({
                "name": "nitish",
                "age": 35,
                "address": {"city": "gurgaon", "state": "haryana", "pin": "122001"}
            }))
            .unwrap()
    }

    #[test]
    fn full_projection_in_declaration_order() {
        let doc = sample().to_document();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "gender", "age", "address"]);
    }

    #[test]
    fn include_top_level() {
        let doc = sample()
            .project(&ProjectOptions::new().include(["name", "address"]))
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(doc),
            json!({"name": "nitish", "address": {"city": "gurgaon", "state": "haryana", "pin": "122001"}})
        );
    }

    #[test]
    fn exclude_nested_field() {
        let doc = sample()
            .project(&ProjectOptions::new().exclude(["address.state", "age"]))
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(doc),
            json!({"name": "nitish", "gender": "Male", "address": {"city": "gurgaon", "pin": "122001"}})
        );
    }

    #[test]
    fn include_nested_field() {
        let doc = sample()
            .project(&ProjectOptions::new().include(["address.pin"]))
            .unwrap();
        assert_eq!(serde_json::Value::Object(doc), json!({"address": {"pin": "122001"}}));
    }

    #[test]
    fn whole_field_wins_over_child() {
        let doc = sample()
            .project(&ProjectOptions::new().include(["address", "address.pin"]))
            .unwrap();
        assert_eq!(doc["address"].as_object().unwrap().len(), 3);
    }

    #[test]
    fn unset_only_emits_defaults() {
        let doc = sample().project(&ProjectOptions::new().unset_only()).unwrap();
        assert_eq!(serde_json::Value::Object(doc), json!({"gender": "Male"}));

        let doc = sample().project(&ProjectOptions::new().exclude_unset()).unwrap();
        assert!(!doc.contains_key("gender"));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn exclude_defaults_compares_values() {
        let explicit = patient()
            .build_json(&json!({
                "name": "a", "gender": "Male", "age": 1,
                "address": {"city": "c", "state": "s", "pin": "p"}
            }))
            .unwrap();
        let doc = explicit.project(&ProjectOptions::new().exclude_defaults()).unwrap();
        assert!(!doc.contains_key("gender"));
    }

    #[test]
    fn selection_errors() {
        let i = sample();
        assert_eq!(
            i.project(&ProjectOptions::new().include(["name"]).exclude(["age"])),
            Err(ProjectionError::IncludeExcludeConflict)
        );
        assert!(matches!(
            i.project(&ProjectOptions::new().include(["nmae"])),
            Err(ProjectionError::UnknownField { .. })
        ));
        assert!(matches!(
            i.project(&ProjectOptions::new().include(["age.x"])),
            Err(ProjectionError::NotNested { .. })
        ));
        assert!(matches!(
            i.project(&ProjectOptions::new().exclude(["address..pin"])),
            Err(ProjectionError::MalformedPath(_))
        ));
        assert!(matches!(
            i.project(&ProjectOptions::new().include(["address.zip"])),
            Err(ProjectionError::UnknownField { ref schema, .. }) if schema == "Address"
        ));
    }

    #[test]
    fn selection_reaches_into_sequences_of_models() {
        let ward = Schema::define(
            "Ward",
            [FieldDescriptor::new(
                "patients",
                FieldType::sequence_of(FieldType::model(&patient())),
            )],
        )
        .unwrap();
        let p = json!({"name": "a", "age": 1, "address": {"city": "c", "state": "s", "pin": "p"}});
        let w = ward.build_json(&json!({"patients": [p.clone(), p]})).unwrap();
        let doc = w
            .project(&ProjectOptions::new().include(["patients.name"]))
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(doc),
            json!({"patients": [{"name": "a"}, {"name": "a"}]})
        );
    }

    #[test]
    fn text_encodings() {
        let i = sample();
        let opts = ProjectOptions::new().include(["age", "name"]);
        assert_eq!(i.to_json(&opts).unwrap(), r#"{"name":"nitish","age":35}"#);
        assert!(i.to_json_pretty(&opts).unwrap().contains("\n  \"name\": \"nitish\""));
        assert_eq!(
            i.encode(&opts, Encoding::Canonical).unwrap(),
            r#"{"age":35,"name":"nitish"}"#
        );
    }

    #[test]
    fn options_deserialize() {
        let opts: ProjectOptions =
            serde_json::from_str(r#"{"include": ["name"], "exclude_none": true}"#).unwrap();
        assert_eq!(opts, ProjectOptions::new().include(["name"]).exclude_none());
    }
}
