//! # Constraints
//!
//! A [`Constraint`] is one atomic check applied to an already-coerced field
//! value: a numeric bound, a length bound, a string shape, membership in a
//! fixed set, or a named custom predicate. Each check either passes or
//! yields the human-readable message that ends up in a `ConstraintViolated`
//! field error.
//!
//! Constraints are stateless and owned by their field descriptor. Whether a
//! constraint makes sense for a field's declared type is decided once, at
//! schema definition time, through [`Constraint::applies_to`].

use std::cmp::Ordering;
use std::sync::Arc;

use regex::Regex;

use crate::field::{FieldType, ScalarType};
use crate::value::Value;

type Predicate = dyn Fn(&Value) -> bool + Send + Sync;

/// A named user-supplied predicate with its failure message.
#[derive(Clone)]
pub struct CustomCheck {
    name: String,
    message: String,
    predicate: Arc<Predicate>,
}

impl std::fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomCheck")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A single check on a coerced value.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Value must be strictly greater than the bound.
    Gt(f64),
    /// Value must be greater than or equal to the bound.
    Ge(f64),
    /// Value must be strictly less than the bound.
    Lt(f64),
    /// Value must be less than or equal to the bound.
    Le(f64),
    /// Value must be an exact multiple of the divisor.
    MultipleOf(f64),
    /// Minimum length: characters of a string, items of a sequence,
    /// entries of a mapping.
    MinLength(usize),
    /// Maximum length, measured as for [`Constraint::MinLength`].
    MaxLength(usize),
    /// String must contain a match of the regular expression. Anchor the
    /// pattern (`^...$`) to require a full match.
    Pattern(Regex),
    /// String must look like `local@domain.tld`.
    Email,
    /// String must look like `scheme://host[...]`.
    Url,
    /// Value must equal one of the listed values.
    OneOf(Vec<Value>),
    /// User-supplied predicate.
    Custom(CustomCheck),
}

impl Constraint {
    /// Compile a [`Constraint::Pattern`].
    ///
    /// # Errors
    ///
    /// Returns the `regex` compilation error for an invalid pattern.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Build a [`Constraint::Custom`] from a predicate.
    pub fn custom(
        name: impl Into<String>,
        message: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(CustomCheck {
            name: name.into(),
            message: message.into(),
            predicate: Arc::new(predicate),
        })
    }

    /// Short identifier, used in schema errors and JSON Schema export.
    pub fn name(&self) -> &str {
        match self {
            Self::Gt(_) => "gt",
            Self::Ge(_) => "ge",
            Self::Lt(_) => "lt",
            Self::Le(_) => "le",
            Self::MultipleOf(_) => "multiple_of",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Pattern(_) => "pattern",
            Self::Email => "email",
            Self::Url => "url",
            Self::OneOf(_) => "one_of",
            Self::Custom(check) => &check.name,
        }
    }

    /// Whether this constraint can be checked against values of `ty`.
    pub fn applies_to(&self, ty: &FieldType) -> bool {
        match self {
            Self::Gt(_) | Self::Ge(_) | Self::Lt(_) | Self::Le(_) | Self::MultipleOf(_) => matches!(
                ty,
                FieldType::Scalar(ScalarType::Int) | FieldType::Scalar(ScalarType::Float)
            ),
            Self::MinLength(_) | Self::MaxLength(_) => matches!(
                ty,
                FieldType::Scalar(ScalarType::Str) | FieldType::Sequence(_) | FieldType::Mapping(_)
            ),
            Self::Pattern(_) | Self::Email | Self::Url => {
                matches!(ty, FieldType::Scalar(ScalarType::Str))
            }
            Self::OneOf(_) | Self::Custom(_) => true,
        }
    }

    /// Check a coerced value.
    ///
    /// # Errors
    ///
    /// Returns the failure message when the value does not satisfy the
    /// constraint, including when the value is of a kind the constraint
    /// cannot measure.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Self::Gt(bound) => bounded(value, *bound, Ordering::is_gt, || {
                format!("Input should be greater than {bound}")
            }),
            Self::Ge(bound) => bounded(value, *bound, Ordering::is_ge, || {
                format!("Input should be greater than or equal to {bound}")
            }),
            Self::Lt(bound) => bounded(value, *bound, Ordering::is_lt, || {
                format!("Input should be less than {bound}")
            }),
            Self::Le(bound) => bounded(value, *bound, Ordering::is_le, || {
                format!("Input should be less than or equal to {bound}")
            }),
            Self::MultipleOf(divisor) => match value {
                Value::Int(_) | Value::Float(_) if is_multiple(value, *divisor) => Ok(()),
                Value::Int(_) | Value::Float(_) => Err(format!("Input should be a multiple of {divisor}")),
                other => Err(not_a_number(other)),
            },
            Self::MinLength(min) => {
                let (len, what, unit) = measure(value)?;
                if len >= *min {
                    Ok(())
                } else {
                    Err(format!("{what} should have at least {min} {}", plural(unit, *min)))
                }
            }
            Self::MaxLength(max) => {
                let (len, what, unit) = measure(value)?;
                if len <= *max {
                    Ok(())
                } else {
                    Err(format!("{what} should have at most {max} {}", plural(unit, *max)))
                }
            }
            Self::Pattern(re) => {
                let s = string(value)?;
                if re.is_match(s) {
                    Ok(())
                } else {
                    Err(format!("String should match pattern '{}'", re.as_str()))
                }
            }
            Self::Email => {
                let s = string(value)?;
                if is_email(s) {
                    Ok(())
                } else {
                    Err("value is not a valid email address".to_string())
                }
            }
            Self::Url => {
                let s = string(value)?;
                if is_url(s) {
                    Ok(())
                } else {
                    Err("Input should be a valid URL".to_string())
                }
            }
            Self::OneOf(options) => {
                if options.contains(value) {
                    Ok(())
                } else {
                    let listed: Vec<String> = options.iter().map(|o| o.to_json().to_string()).collect();
                    Err(format!("Input should be one of: {}", listed.join(", ")))
                }
            }
            Self::Custom(check) => {
                if (check.predicate)(value) {
                    Ok(())
                } else {
                    Err(check.message.clone())
                }
            }
        }
    }
}

/// Order `value` against `bound`. Integers are compared exactly, without a
/// round trip through `f64`.
fn compare(value: &Value, bound: f64) -> Option<Ordering> {
    match value {
        Value::Int(i) => compare_int(*i, bound),
        Value::Float(x) => x.partial_cmp(&bound),
        _ => None,
    }
}

fn compare_int(i: i64, bound: f64) -> Option<Ordering> {
    // i64::MIN as f64 is exactly -2^63; i64::MAX as f64 rounds up to 2^63.
    if bound.is_nan() {
        None
    } else if bound >= i64::MAX as f64 {
        Some(Ordering::Less)
    } else if bound < i64::MIN as f64 {
        Some(Ordering::Greater)
    } else {
        let floor = bound.floor();
        match i.cmp(&(floor as i64)) {
            Ordering::Equal if bound > floor => Some(Ordering::Less),
            ordering => Some(ordering),
        }
    }
}

fn bounded(
    value: &Value,
    bound: f64,
    accept: impl FnOnce(Ordering) -> bool,
    message: impl FnOnce() -> String,
) -> Result<(), String> {
    match compare(value, bound) {
        Some(ordering) if accept(ordering) => Ok(()),
        Some(_) => Err(message()),
        None if matches!(value, Value::Int(_) | Value::Float(_)) => Err(message()),
        None => Err(not_a_number(value)),
    }
}

fn not_a_number(value: &Value) -> String {
    format!("Input should be a number, got {}", value.kind())
}

fn is_multiple(value: &Value, divisor: f64) -> bool {
    if divisor == 0.0 || !divisor.is_finite() {
        return false;
    }
    if let (Value::Int(i), Some(d)) = (value, exact_int(divisor)) {
        // checked_rem only fails for i64::MIN % -1, which divides evenly.
        return i.checked_rem(d).map_or(true, |r| r == 0);
    }
    match value.as_f64() {
        Some(x) => {
            let q = x / divisor;
            (q - q.round()).abs() < 1e-9
        }
        None => false,
    }
}

fn exact_int(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn measure(value: &Value) -> Result<(usize, &'static str, &'static str), String> {
    match value {
        Value::Str(s) => Ok((s.chars().count(), "String", "character")),
        Value::List(items) => Ok((items.len(), "List", "item")),
        Value::Map(map) => Ok((map.len(), "Dictionary", "item")),
        other => Err(format!("Input of kind {} has no length", other.kind())),
    }
}

fn plural(unit: &str, n: usize) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

fn string(value: &Value) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("Input should be a string, got {}", value.kind()))
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.chars().any(|c| c.is_whitespace() || c == '@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

fn is_url(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    scheme_ok && !host.is_empty() && !s.chars().any(char::is_whitespace)
}
