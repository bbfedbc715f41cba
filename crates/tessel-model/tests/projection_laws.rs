//! Property tests for the build/project cycle.
//!
//! - Round trip: building from the full projection of an instance yields an
//!   equal instance.
//! - Complementarity: including a set of fields projects the same document
//!   as excluding every other field.
//! - Determinism: the same input always builds the same instance and
//!   encodes to the same text.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use tessel_model::{Encoding, FieldDescriptor, FieldType, Instance, ProjectOptions, Schema};

fn record_schema() -> Arc<Schema> {
    let address = Schema::define(
        "Address",
        [
            FieldDescriptor::new("city", FieldType::STR),
            FieldDescriptor::new("pin", FieldType::STR),
        ],
    )
    .unwrap();
    Schema::define(
        "Record",
        [
            FieldDescriptor::new("name", FieldType::STR),
            FieldDescriptor::new("age", FieldType::INT),
            FieldDescriptor::new("weight", FieldType::FLOAT),
            FieldDescriptor::new("married", FieldType::BOOL).default(false),
            FieldDescriptor::new("tags", FieldType::sequence_of(FieldType::STR))
                .optional()
                .nullable(),
            FieldDescriptor::new("contacts", FieldType::mapping_of(FieldType::STR)),
            FieldDescriptor::new("address", FieldType::model(&address)),
        ],
    )
    .unwrap()
}

const FIELDS: [&str; 7] = ["name", "age", "weight", "married", "tags", "contacts", "address"];

fn record_input() -> impl Strategy<Value = serde_json::Value> {
    (
        "[a-zA-Z ]{0,20}",
        any::<i64>(),
        -1.0e9f64..1.0e9f64,
        proptest::option::of(any::<bool>()),
        proptest::option::of(prop::collection::vec("[a-z]{1,8}", 0..5)),
        prop::collection::btree_map("[a-z]{1,6}", "[0-9]{0,10}", 0..4),
        ("[a-z]{1,10}", "[0-9]{6}"),
    )
        .prop_map(|(name, age, weight, married, tags, contacts, (city, pin))| {
            let mut input = json!({
                "name": name,
                "age": age,
                "weight": weight,
                "contacts": contacts,
                "address": {"city": city, "pin": pin},
            });
            if let Some(married) = married {
                input["married"] = json!(married);
            }
            if let Some(tags) = tags {
                input["tags"] = json!(tags);
            }
            input
        })
}

fn build(schema: &Arc<Schema>, input: &serde_json::Value) -> Instance {
    schema.build_json(input).unwrap()
}

proptest! {
    /// Building from the full projection gives back an equal instance.
    #[test]
    fn round_trip_through_projection(input in record_input()) {
        let schema = record_schema();
        let original = build(&schema, &input);
        let doc = serde_json::Value::Object(original.to_document());
        let rebuilt = build(&schema, &doc);
        prop_assert_eq!(&original, &rebuilt);
    }

    /// The same holds through JSON text.
    #[test]
    fn round_trip_through_text(input in record_input()) {
        let schema = record_schema();
        let original = build(&schema, &input);
        let text = original.to_json(&ProjectOptions::new()).unwrap();
        let rebuilt = schema.build_json_str(&text).unwrap();
        prop_assert_eq!(original, rebuilt);
    }

    /// include(S) and exclude(complement S) project the same document.
    #[test]
    fn include_exclude_complementarity(
        input in record_input(),
        mask in prop::collection::vec(any::<bool>(), FIELDS.len()),
    ) {
        let instance = build(&record_schema(), &input);
        let (included, excluded): (BTreeSet<&str>, BTreeSet<&str>) = {
            let mut inc = BTreeSet::new();
            let mut exc = BTreeSet::new();
            for (field, keep) in FIELDS.iter().zip(&mask) {
                if *keep { inc.insert(*field); } else { exc.insert(*field); }
            }
            (inc, exc)
        };
        let a = instance.project(&ProjectOptions::new().include(included)).unwrap();
        let b = instance.project(&ProjectOptions::new().exclude(excluded)).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Builds and encodings are deterministic.
    #[test]
    fn build_is_deterministic(input in record_input()) {
        let schema = record_schema();
        let a = build(&schema, &input);
        let b = build(&schema, &input);
        prop_assert_eq!(&a, &b);
        for encoding in [Encoding::Compact, Encoding::Pretty, Encoding::Canonical] {
            let opts = ProjectOptions::new();
            prop_assert_eq!(a.encode(&opts, encoding).unwrap(), b.encode(&opts, encoding).unwrap());
        }
    }

    /// Every declared field is either set from input or filled from its
    /// default; `unset_only` and `exclude_unset` partition the document.
    #[test]
    fn unset_partition(input in record_input()) {
        let instance = build(&record_schema(), &input);
        let unset = instance.project(&ProjectOptions::new().unset_only()).unwrap();
        let set = instance.project(&ProjectOptions::new().exclude_unset()).unwrap();
        prop_assert_eq!(unset.len() + set.len(), FIELDS.len());
        prop_assert!(unset.keys().all(|k| !set.contains_key(k)));
    }
}
