//! Integration test: patient intake records.
//!
//! Exercises the full build/project cycle on the patient and address
//! models: coercion of request-style input, strict fields, metadata,
//! before/after hooks, nested models and selective JSON output.

use std::sync::Arc;

use serde_json::json;
use tessel_model::{
    Constraint, FieldDescriptor, FieldErrorKind, FieldSource, FieldType, HookError, ProjectOptions,
    Schema, SchemaError, ValidatorHook, Value,
};

fn intake_patient() -> Arc<Schema> {
    Schema::define(
        "Patient",
        [
            FieldDescriptor::new("name", FieldType::STR)
                .constraint(Constraint::MaxLength(50))
                .title("Name of the patient")
                .description("Give the name of the patient in less than 50 chars")
                .example("Nitish")
                .example("Amit"),
            FieldDescriptor::new("email", FieldType::STR).constraint(Constraint::Email),
            FieldDescriptor::new("linkedin_url", FieldType::STR).constraint(Constraint::Url),
            FieldDescriptor::new("age", FieldType::INT)
                .constraints([Constraint::Gt(0.0), Constraint::Lt(120.0)]),
            FieldDescriptor::new("weight", FieldType::FLOAT)
                .strict()
                .constraint(Constraint::Gt(0.0)),
            FieldDescriptor::new("married", FieldType::BOOL)
                .optional()
                .nullable()
                .description("Is the patient married or not"),
            FieldDescriptor::new("allergies", FieldType::sequence_of(FieldType::STR))
                .optional()
                .nullable()
                .constraint(Constraint::MaxLength(5)),
            FieldDescriptor::new("contact_details", FieldType::mapping_of(FieldType::STR)),
        ],
    )
    .unwrap()
}

fn email_domain_allow_list(value: Value) -> Result<Value, HookError> {
    const VALID_DOMAINS: [&str; 2] = ["hdfc.com", "icici.com"];
    let domain = value
        .as_str()
        .and_then(|s| s.rsplit('@').next())
        .unwrap_or_default();
    if VALID_DOMAINS.contains(&domain) {
        Ok(value)
    } else {
        Err(HookError::new("Not a valid domain"))
    }
}

fn hooked_patient() -> Arc<Schema> {
    Schema::builder("Patient")
        .fields([
            FieldDescriptor::new("name", FieldType::STR),
            FieldDescriptor::new("email", FieldType::STR).constraint(Constraint::Email),
            FieldDescriptor::new("age", FieldType::INT),
            FieldDescriptor::new("weight", FieldType::FLOAT),
            FieldDescriptor::new("married", FieldType::BOOL),
            FieldDescriptor::new("allergies", FieldType::sequence_of(FieldType::STR)),
            FieldDescriptor::new("contact_details", FieldType::mapping_of(FieldType::STR)),
        ])
        .before(
            "name",
            ValidatorHook::transform("transform_name", |v| match v {
                Value::Str(s) => Value::Str(s.to_uppercase()),
                other => other,
            }),
        )
        .after("email", ValidatorHook::check("email_validator", email_domain_allow_list))
        .after(
            "age",
            ValidatorHook::check("validate_age", |v| match v.as_int() {
                Some(age) if 0 < age && age < 100 => Ok(v),
                _ => Err(HookError::new("Age should be in between 0 and 100")),
            }),
        )
        .define()
        .unwrap()
}

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

fn nested_patient() -> Arc<Schema> {
    Schema::define(
        "Patient",
        [
            FieldDescriptor::new("name", FieldType::STR),
            FieldDescriptor::new("gender", FieldType::STR),
            FieldDescriptor::new("age", FieldType::INT),
            FieldDescriptor::new("address", FieldType::model(&address())),
        ],
    )
    .unwrap()
}

fn hooked_input() -> serde_json::Value {
    json!({
        "name": "nitish",
        "email": "abc@icici.com",
        "age": "30",
        "weight": 75.2,
        "married": true,
        "allergies": ["pollen", "dust"],
        "contact_details": {"phone": "2353462"}
    })
}

#[test]
fn test_intake_record_coerces_and_fills_defaults() {
    let patient = intake_patient()
        .build_json(&json!({
            "name": "nitish",
            "email": "abc@gmail.com",
            "linkedin_url": "http://linkedin.com/1322",
            "age": "30",
            "weight": 75.2,
            "contact_details": {"phone": "2353462"}
        }))
        .unwrap();

    assert_eq!(patient.get("age"), Some(&Value::Int(30)));
    assert_eq!(patient.get("weight"), Some(&Value::Float(75.2)));
    assert_eq!(patient.get("married"), Some(&Value::Null));
    assert_eq!(patient.get("allergies"), Some(&Value::Null));
    let names: Vec<&str> = patient.fields_set().collect();
    assert_eq!(
        names,
        ["name", "email", "linkedin_url", "age", "weight", "contact_details"]
    );
}

#[test]
fn test_strict_weight_rejects_integer_and_string() {
    let schema = intake_patient();
    let mut input = json!({
        "name": "nitish",
        "email": "abc@gmail.com",
        "linkedin_url": "http://linkedin.com/1322",
        "age": 30,
        "weight": 75,
        "contact_details": {}
    });
    let err = schema.build_json(&input).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors()[0].path.as_str(), "weight");
    assert_eq!(err.errors()[0].kind, FieldErrorKind::TypeMismatch);

    input["weight"] = json!("75.2");
    assert!(schema.build_json(&input).is_err());
}

#[test]
fn test_non_strict_float_accepts_integer() {
    let schema = Schema::define("Vitals", [FieldDescriptor::new("weight", FieldType::FLOAT)]).unwrap();
    let v = schema.build_json(&json!({"weight": 75})).unwrap();
    assert_eq!(v.get("weight"), Some(&Value::Float(75.0)));
}

#[test]
fn test_every_missing_field_reported_with_other_errors() {
    let err = intake_patient()
        .build_json(&json!({"age": "150", "allergies": ["a", "b", "c", "d", "e", "f"]}))
        .unwrap_err();
    let summary: Vec<(&str, FieldErrorKind)> =
        err.errors().iter().map(|e| (e.path.as_str(), e.kind)).collect();
    assert_eq!(
        summary,
        [
            ("name", FieldErrorKind::Missing),
            ("email", FieldErrorKind::Missing),
            ("linkedin_url", FieldErrorKind::Missing),
            ("age", FieldErrorKind::ConstraintViolated),
            ("weight", FieldErrorKind::Missing),
            ("allergies", FieldErrorKind::ConstraintViolated),
            ("contact_details", FieldErrorKind::Missing),
        ]
    );
    assert_eq!(err.at("allergies").unwrap().message, "List should have at most 5 items");
}

#[test]
fn test_bad_formats_rejected() {
    let err = intake_patient()
        .build_json(&json!({
            "name": "x".repeat(51),
            "email": "not-an-email",
            "linkedin_url": "linkedin.com/1322",
            "age": 30,
            "weight": 75.2,
            "contact_details": {"phone": 2353462}
        }))
        .unwrap_err();
    let paths: Vec<&str> = err.errors().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        ["name", "email", "linkedin_url", "contact_details.phone"]
    );
}

#[test]
fn test_hooks_transform_and_check() {
    let patient = hooked_patient().build_json(&hooked_input()).unwrap();
    assert_eq!(patient.get("name"), Some(&Value::from("NITISH")));
    assert_eq!(patient.get("age"), Some(&Value::Int(30)));
    assert_eq!(
        patient.get("allergies"),
        Some(&Value::from(vec!["pollen", "dust"]))
    );
}

#[test]
fn test_email_domain_outside_allow_list() {
    let mut input = hooked_input();
    input["email"] = json!("abc@gmail.com");
    let err = hooked_patient().build_json(&input).unwrap_err();
    assert_eq!(err.len(), 1);
    let e = &err.errors()[0];
    assert_eq!(e.path.as_str(), "email");
    assert_eq!(e.kind, FieldErrorKind::ValidatorFailed);
    assert_eq!(e.message, "Not a valid domain");
}

#[test]
fn test_after_hook_sees_coerced_age() {
    let mut input = hooked_input();
    input["age"] = json!("150");
    let err = hooked_patient().build_json(&input).unwrap_err();
    assert_eq!(err.at("age").unwrap().message, "Age should be in between 0 and 100");
}

#[test]
fn test_nested_model_from_prebuilt_address() {
    let address1 = address()
        .build_json(&json!({"city": "gurgaon", "state": "haryana", "pin": "122001"}))
        .unwrap();
    let mut input = tessel_model::Map::new();
    input.insert("name".into(), Value::from("nitish"));
    input.insert("gender".into(), Value::from("male"));
    input.insert("age".into(), Value::Int(35));
    input.insert("address".into(), Value::Model(address1));
    let patient1 = nested_patient().build(input).unwrap();

    assert_eq!(
        patient1.to_json(&ProjectOptions::new()).unwrap(),
        r#"{"name":"nitish","gender":"male","age":35,"address":{"city":"gurgaon","state":"haryana","pin":"122001"}}"#
    );
    assert_eq!(
        patient1
            .to_json(&ProjectOptions::new().include(["name", "address"]))
            .unwrap(),
        r#"{"name":"nitish","address":{"city":"gurgaon","state":"haryana","pin":"122001"}}"#
    );
    let doc = patient1
        .project(&ProjectOptions::new().exclude(["address.state"]))
        .unwrap();
    assert_eq!(
        serde_json::Value::Object(doc),
        json!({"name": "nitish", "gender": "male", "age": 35, "address": {"city": "gurgaon", "pin": "122001"}})
    );
}

#[test]
fn test_nested_model_errors_carry_parent_path() {
    let err = nested_patient()
        .build_json(&json!({
            "name": "nitish", "gender": "male", "age": 35,
            "address": {"city": "gurgaon", "pin": 122001}
        }))
        .unwrap_err();
    let paths: Vec<&str> = err.errors().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["address.state", "address.pin"]);
    assert!(err.to_string().starts_with("2 validation errors for Patient"));
}

#[test]
fn test_field_metadata_survives_definition() {
    let schema = intake_patient();
    let name = schema.field("name").unwrap();
    assert_eq!(name.title_text(), Some("Name of the patient"));
    assert_eq!(name.examples(), [Value::from("Nitish"), Value::from("Amit")]);
}

#[test]
fn test_address_of_another_schema_is_revalidated() {
    let postal = Schema::define("Address", [FieldDescriptor::new("zip", FieldType::INT)]).unwrap();
    let foreign = postal.build_json(&json!({"zip": 5})).unwrap();
    let mut input = tessel_model::Map::new();
    input.insert("name".into(), Value::from("nitish"));
    input.insert("gender".into(), Value::from("male"));
    input.insert("age".into(), Value::Int(35));
    input.insert("address".into(), Value::Model(foreign));

    let err = nested_patient().build(input).unwrap_err();
    assert_eq!(err.len(), 1);
    let address_error = err.at("address").unwrap();
    assert_eq!(address_error.kind, FieldErrorKind::TypeMismatch);
    assert_eq!(
        address_error.message,
        "Input should be a valid dictionary or instance of Address"
    );
}

#[test]
fn test_defaulted_fields_keep_constraints_and_hooks() {
    let err = Schema::define(
        "Patient",
        [
            FieldDescriptor::new("name", FieldType::STR),
            FieldDescriptor::new("age", FieldType::INT)
                .default(-5)
                .constraint(Constraint::Gt(0.0)),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::DefaultConstraintViolated { ref field, .. } if field == "age"));

    let patient = Schema::builder("Patient")
        .fields([
            FieldDescriptor::new("name", FieldType::STR),
            FieldDescriptor::new("gender", FieldType::STR).default("male"),
        ])
        .after(
            "gender",
            ValidatorHook::transform("capitalize", |v| match v {
                Value::Str(s) => Value::Str(s.to_uppercase()),
                other => other,
            }),
        )
        .define()
        .unwrap();
    let p = patient.build_json(&json!({"name": "nitish"})).unwrap();
    assert_eq!(p.get("gender"), Some(&Value::from("MALE")));
    assert_eq!(p.source("gender"), Some(FieldSource::Default));
    assert_eq!(
        p.to_json(&ProjectOptions::new().unset_only()).unwrap(),
        r#"{"gender":"MALE"}"#
    );
}

#[test]
fn test_large_patient_ids_respect_bounds() {
    let schema = Schema::define(
        "Patient",
        [FieldDescriptor::new("record_id", FieldType::INT).constraint(Constraint::Le(9_007_199_254_740_992.0))],
    )
    .unwrap();
    assert!(schema
        .build_json(&json!({"record_id": 9_007_199_254_740_992_i64}))
        .is_ok());
    let err = schema
        .build_json(&json!({"record_id": 9_007_199_254_740_993_i64}))
        .unwrap_err();
    assert_eq!(err.at("record_id").unwrap().kind, FieldErrorKind::ConstraintViolated);
}
