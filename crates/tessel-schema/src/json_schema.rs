//! # JSON Schema Export
//!
//! Renders a [`Schema`] as a JSON Schema (Draft 2020-12) document
//! describing the *projected* form of its instances:
//!
//! - scalar types map to `string`, `integer`, `number`, `boolean`,
//! - sequences to `array` with `items`, mappings to `object` with
//!   `additionalProperties`,
//! - nested models to `$ref`s into a shared `$defs` table,
//! - nullable fields admit `null`,
//! - constraints map to `exclusiveMinimum`, `minimum`, `exclusiveMaximum`,
//!   `maximum`, `multipleOf`, `minLength`/`minItems`/`minProperties` (and
//!   the `max` forms), `pattern`, `format` (`email`, `uri`) and `enum`;
//!   custom constraints have no keyword and are omitted,
//! - `extra = forbid` becomes `additionalProperties: false`.
//!
//! Field metadata (`title`, `description`, `examples`) and defaults are
//! carried over as annotations.

use std::sync::Arc;

use serde_json::{json, Map, Number, Value as Json};
use tessel_model::{Constraint, ExtraPolicy, FieldDescriptor, FieldType, ScalarType, Schema};

/// Draft 2020-12 meta-schema URI.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Export `schema` as a self-contained JSON Schema document.
pub fn json_schema(schema: &Schema) -> Json {
    let mut defs = Defs::default();
    let mut root = Map::new();
    root.insert("$schema".into(), json!(DRAFT_2020_12));
    root.insert("title".into(), json!(schema.name()));
    root.extend(object_schema(schema, &mut defs));
    if !defs.bodies.is_empty() {
        root.insert("$defs".into(), Json::Object(defs.bodies));
    }
    Json::Object(root)
}

/// Nested model definitions, keyed by schema name. Distinct schemas that
/// share a name get numbered keys (`Address`, `Address2`, ...).
#[derive(Default)]
struct Defs {
    bodies: Map<String, Json>,
    keys: Vec<(Arc<Schema>, String)>,
}

impl Defs {
    fn key_for(&mut self, schema: &Arc<Schema>) -> String {
        if let Some((_, key)) = self.keys.iter().find(|(s, _)| Arc::ptr_eq(s, schema)) {
            return key.clone();
        }
        let mut key = schema.name().to_string();
        let mut n = 1;
        while self.keys.iter().any(|(_, k)| *k == key) {
            n += 1;
            key = format!("{}{n}", schema.name());
        }
        self.keys.push((Arc::clone(schema), key.clone()));

        let mut def = Map::new();
        def.insert("title".into(), json!(schema.name()));
        def.extend(object_schema(schema, self));
        self.bodies.insert(key.clone(), Json::Object(def));
        key
    }
}

fn object_schema(schema: &Schema, defs: &mut Defs) -> Map<String, Json> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in schema.fields() {
        properties.insert(field.name().to_string(), field_schema(field, defs));
        if field.is_required() {
            required.push(json!(field.name()));
        }
    }

    let mut out = Map::new();
    out.insert("type".into(), json!("object"));
    out.insert("properties".into(), Json::Object(properties));
    if !required.is_empty() {
        out.insert("required".into(), Json::Array(required));
    }
    if schema.config().extra == ExtraPolicy::Forbid {
        out.insert("additionalProperties".into(), json!(false));
    }
    out
}

fn field_schema(field: &FieldDescriptor, defs: &mut Defs) -> Json {
    let mut out = type_schema(field.field_type(), defs);

    for constraint in field.constraint_list() {
        apply_constraint(&mut out, constraint, field.field_type());
    }

    if field.is_nullable() {
        out = nullable(out);
    }
    if let Some(title) = field.title_text() {
        out.insert("title".into(), json!(title));
    }
    if let Some(description) = field.description_text() {
        out.insert("description".into(), json!(description));
    }
    if !field.examples().is_empty() {
        let examples: Vec<Json> = field.examples().iter().map(|e| e.to_json()).collect();
        out.insert("examples".into(), Json::Array(examples));
    }
    if let Some(default) = field.default_value() {
        if !field.is_required() {
            out.insert("default".into(), default.to_json());
        }
    }
    Json::Object(out)
}

fn type_schema(ty: &FieldType, defs: &mut Defs) -> Map<String, Json> {
    let mut out = Map::new();
    match ty {
        FieldType::Scalar(s) => {
            out.insert("type".into(), json!(scalar_keyword(*s)));
        }
        FieldType::Sequence(inner) => {
            out.insert("type".into(), json!("array"));
            out.insert("items".into(), Json::Object(type_schema(inner, defs)));
        }
        FieldType::Mapping(inner) => {
            out.insert("type".into(), json!("object"));
            out.insert(
                "additionalProperties".into(),
                Json::Object(type_schema(inner, defs)),
            );
        }
        FieldType::Model(schema) => {
            let key = defs.key_for(schema);
            out.insert("$ref".into(), json!(format!("#/$defs/{key}")));
        }
    }
    out
}

fn scalar_keyword(s: ScalarType) -> &'static str {
    match s {
        ScalarType::Str => "string",
        ScalarType::Int => "integer",
        ScalarType::Float => "number",
        ScalarType::Bool => "boolean",
    }
}

fn apply_constraint(out: &mut Map<String, Json>, constraint: &Constraint, ty: &FieldType) {
    let number = |n: f64| Number::from_f64(n).map(Json::Number);
    let (min_kw, max_kw) = match ty {
        FieldType::Sequence(_) => ("minItems", "maxItems"),
        FieldType::Mapping(_) => ("minProperties", "maxProperties"),
        _ => ("minLength", "maxLength"),
    };
    let (keyword, value) = match constraint {
        Constraint::Gt(n) => ("exclusiveMinimum", number(*n)),
        Constraint::Ge(n) => ("minimum", number(*n)),
        Constraint::Lt(n) => ("exclusiveMaximum", number(*n)),
        Constraint::Le(n) => ("maximum", number(*n)),
        Constraint::MultipleOf(n) if *n > 0.0 => ("multipleOf", number(*n)),
        Constraint::MinLength(n) => (min_kw, Some(json!(n))),
        Constraint::MaxLength(n) => (max_kw, Some(json!(n))),
        Constraint::Pattern(re) => ("pattern", Some(json!(re.as_str()))),
        Constraint::Email => ("format", Some(json!("email"))),
        Constraint::Url => ("format", Some(json!("uri"))),
        Constraint::OneOf(options) => (
            "enum",
            Some(Json::Array(options.iter().map(|o| o.to_json()).collect())),
        ),
        Constraint::MultipleOf(_) | Constraint::Custom(_) => return,
    };
    if let Some(value) = value {
        out.insert(keyword.to_string(), value);
    }
}

/// Admit `null` alongside the schema in `out`.
fn nullable(mut out: Map<String, Json>) -> Map<String, Json> {
    match out.get("type").cloned() {
        Some(Json::String(t)) => {
            out.insert("type".into(), json!([t, "null"]));
            if let Some(Json::Array(options)) = out.get_mut("enum") {
                options.push(Json::Null);
            }
            out
        }
        _ => {
            let mut wrapped = Map::new();
            wrapped.insert(
                "anyOf".into(),
                json!([Json::Object(out), { "type": "null" }]),
            );
            wrapped
        }
    }
}
