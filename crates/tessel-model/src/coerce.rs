//! # Coercion Policy
//!
//! Coercion converts a raw [`Value`] into a value of a field's declared
//! type. The scalar conversions are not scattered through match arms; they
//! are the rows of [`COERCION_TABLE`], and strictness is a column of that
//! table. A strict field only uses rows marked `strict: true`, which are
//! exactly the identity conversions.
//!
//! | Target | Source | Conversion        | Strict |
//! |--------|--------|-------------------|--------|
//! | str    | str    | exact             | yes    |
//! | int    | int    | exact             | yes    |
//! | int    | float  | integral float    | no     |
//! | int    | str    | parse integer     | no     |
//! | float  | float  | exact             | yes    |
//! | float  | int    | widen             | no     |
//! | float  | str    | parse finite f64  | no     |
//! | bool   | bool   | exact             | yes    |
//! | bool   | int    | 0 / 1             | no     |
//! | bool   | str    | boolean word      | no     |
//!
//! Compound types are structural: sequences require a list and coerce each
//! element, mappings require a map and coerce each value, nested models
//! accept an instance of the same schema or build one from a map. Element
//! failures are all collected, each at its own path. `null` is accepted
//! only where the field is nullable.

use std::sync::Arc;

use tessel_core::FieldPath;

use crate::build::build_at;
use crate::error::FieldError;
use crate::field::{FieldType, ScalarType};
use crate::schema::Schema;
use crate::value::{Map, Value, ValueKind};

/// How a source value becomes the target scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Already the target type.
    Exact,
    /// Integer to float.
    Widen,
    /// Float with no fractional part, within `i64` range, to integer.
    IntegralFloat,
    /// Trimmed string parsed as `i64`.
    ParseInt,
    /// Trimmed string parsed as a finite `f64`.
    ParseFloat,
    /// Case-insensitive boolean word.
    ParseBool,
    /// `0` or `1` to boolean.
    IntToBool,
}

/// One row of the coercion policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoercionRule {
    pub target: ScalarType,
    pub source: ValueKind,
    pub conversion: Conversion,
    /// Whether the rule is still available to strict fields.
    pub strict: bool,
}

const fn rule(
    target: ScalarType,
    source: ValueKind,
    conversion: Conversion,
    strict: bool,
) -> CoercionRule {
    CoercionRule {
        target,
        source,
        conversion,
        strict,
    }
}

/// Every permitted scalar conversion.
pub const COERCION_TABLE: &[CoercionRule] = &[
    rule(ScalarType::Str, ValueKind::Str, Conversion::Exact, true),
    rule(ScalarType::Int, ValueKind::Int, Conversion::Exact, true),
    rule(ScalarType::Int, ValueKind::Float, Conversion::IntegralFloat, false),
    rule(ScalarType::Int, ValueKind::Str, Conversion::ParseInt, false),
    rule(ScalarType::Float, ValueKind::Float, Conversion::Exact, true),
    rule(ScalarType::Float, ValueKind::Int, Conversion::Widen, false),
    rule(ScalarType::Float, ValueKind::Str, Conversion::ParseFloat, false),
    rule(ScalarType::Bool, ValueKind::Bool, Conversion::Exact, true),
    rule(ScalarType::Bool, ValueKind::Int, Conversion::IntToBool, false),
    rule(ScalarType::Bool, ValueKind::Str, Conversion::ParseBool, false),
];

/// The rule converting `source` into `target`, if the policy has one.
pub fn lookup(target: ScalarType, source: ValueKind, strict: bool) -> Option<&'static CoercionRule> {
    COERCION_TABLE
        .iter()
        .find(|r| r.target == target && r.source == source && (r.strict || !strict))
}

/// Per-field coercion switches, resolved from the field and its schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Policy {
    pub strict: bool,
    pub strip_whitespace: bool,
}

/// Coerce `value` to `ty`. Errors carry paths rooted at `path`.
pub(crate) fn coerce(
    value: Value,
    ty: &FieldType,
    nullable: bool,
    policy: Policy,
    path: &FieldPath,
) -> Result<Value, Vec<FieldError>> {
    if value.is_null() {
        return if nullable {
            Ok(Value::Null)
        } else {
            Err(vec![FieldError::type_mismatch(
                path.clone(),
                expected_message(ty),
            )])
        };
    }
    match ty {
        FieldType::Scalar(target) => coerce_scalar(value, *target, policy, path).map_err(|e| vec![e]),
        FieldType::Sequence(element) => match value {
            Value::List(items) => coerce_sequence(items, element, policy, path),
            _ => Err(vec![FieldError::type_mismatch(
                path.clone(),
                expected_message(ty),
            )]),
        },
        FieldType::Mapping(inner) => match value {
            Value::Map(map) => coerce_mapping(map, inner, policy, path),
            _ => Err(vec![FieldError::type_mismatch(
                path.clone(),
                expected_message(ty),
            )]),
        },
        FieldType::Model(schema) => coerce_model(value, schema, path),
    }
}

fn coerce_scalar(
    value: Value,
    target: ScalarType,
    policy: Policy,
    path: &FieldPath,
) -> Result<Value, FieldError> {
    let mismatch = |detail: Option<&str>| {
        let base = expected_message(&FieldType::Scalar(target));
        let message = match detail {
            Some(detail) => format!("{base}, {detail}"),
            None => base,
        };
        FieldError::type_mismatch(path.clone(), message)
    };

    let Some(rule) = lookup(target, value.kind(), policy.strict) else {
        return Err(mismatch(None));
    };

    let converted = match (rule.conversion, value) {
        (Conversion::Exact, Value::Str(s)) if policy.strip_whitespace => {
            Value::Str(s.trim().to_string())
        }
        (Conversion::Exact, v) => v,
        (Conversion::Widen, Value::Int(i)) => Value::Float(i as f64),
        (Conversion::IntegralFloat, Value::Float(f)) => match integral(f) {
            Some(i) => Value::Int(i),
            None => return Err(mismatch(Some("got a number with a fractional part"))),
        },
        (Conversion::ParseInt, Value::Str(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => return Err(mismatch(Some("unable to parse string as an integer"))),
        },
        (Conversion::ParseFloat, Value::Str(s)) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => return Err(mismatch(Some("unable to parse string as a number"))),
        },
        (Conversion::ParseBool, Value::Str(s)) => match parse_bool(&s) {
            Some(b) => Value::Bool(b),
            None => return Err(mismatch(Some("unable to interpret input"))),
        },
        (Conversion::IntToBool, Value::Int(i)) => match i {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            _ => return Err(mismatch(Some("unable to interpret input"))),
        },
        _ => return Err(mismatch(None)),
    };
    tracing::trace!(path = %path, conversion = ?rule.conversion, "coerced scalar");
    Ok(converted)
}

fn coerce_sequence(
    items: Vec<Value>,
    element: &FieldType,
    policy: Policy,
    path: &FieldPath,
) -> Result<Value, Vec<FieldError>> {
    let mut out = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        match coerce(item, element, false, policy, &path.index(i)) {
            Ok(v) => out.push(v),
            Err(mut e) => errors.append(&mut e),
        }
    }
    if errors.is_empty() {
        Ok(Value::List(out))
    } else {
        Err(errors)
    }
}

fn coerce_mapping(
    map: Map,
    inner: &FieldType,
    policy: Policy,
    path: &FieldPath,
) -> Result<Value, Vec<FieldError>> {
    let mut out = Map::with_capacity(map.len());
    let mut errors = Vec::new();
    for (key, item) in map {
        match coerce(item, inner, false, policy, &path.child(&key)) {
            Ok(v) => {
                out.insert(key, v);
            }
            Err(mut e) => errors.append(&mut e),
        }
    }
    if errors.is_empty() {
        Ok(Value::Map(out))
    } else {
        Err(errors)
    }
}

fn coerce_model(value: Value, schema: &Arc<Schema>, path: &FieldPath) -> Result<Value, Vec<FieldError>> {
    let mismatch = || {
        vec![FieldError::type_mismatch(
            path.clone(),
            expected_message(&FieldType::Model(Arc::clone(schema))),
        )]
    };
    match value {
        Value::Model(instance) if Arc::ptr_eq(instance.schema(), schema) => Ok(Value::Model(instance)),
        // An instance of another schema is re-validated from its values.
        Value::Model(instance) => build_at(schema, instance.to_map(), path)
            .map(Value::Model)
            .map_err(|_| mismatch()),
        Value::Map(map) => build_at(schema, map, path).map(Value::Model),
        _ => Err(mismatch()),
    }
}

fn integral(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}

fn expected_message(ty: &FieldType) -> String {
    match ty {
        FieldType::Scalar(ScalarType::Str) => "Input should be a valid string".to_string(),
        FieldType::Scalar(ScalarType::Int) => "Input should be a valid integer".to_string(),
        FieldType::Scalar(ScalarType::Float) => "Input should be a valid number".to_string(),
        FieldType::Scalar(ScalarType::Bool) => "Input should be a valid boolean".to_string(),
        FieldType::Sequence(_) => "Input should be a valid list".to_string(),
        FieldType::Mapping(_) => "Input should be a valid dictionary".to_string(),
        FieldType::Model(schema) => format!(
            "Input should be a valid dictionary or instance of {}",
            schema.name()
        ),
    }
}
