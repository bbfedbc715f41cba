//! # Validator Hooks
//!
//! User-supplied logic attached to a field. A hook is either a
//! [`HookKind::Transform`] (always succeeds, returns a new value) or a
//! [`HookKind::Check`] (returns the value, possibly changed, or a
//! [`HookError`]). The [`Phase`] a hook runs in is chosen when it is
//! registered on a field:
//!
//! - [`Phase::Before`] hooks see the raw input value, before coercion.
//! - [`Phase::After`] hooks see the coerced, constraint-checked value; the
//!   output of the last one is what the instance stores.
//!
//! Hooks are `Send + Sync` and must not keep state between calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

/// When a hook runs relative to coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// On the raw input value.
    Before,
    /// On the coerced value.
    After,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// Failure signalled by a check hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

type TransformFn = dyn Fn(Value) -> Value + Send + Sync;
type CheckFn = dyn Fn(Value) -> Result<Value, HookError> + Send + Sync;

/// The capability a hook provides.
#[derive(Clone)]
pub enum HookKind {
    /// Infallible value transformation.
    Transform(Arc<TransformFn>),
    /// Fallible check, may also transform.
    Check(Arc<CheckFn>),
}

/// A named hook.
#[derive(Clone)]
pub struct ValidatorHook {
    name: String,
    kind: HookKind,
}

impl ValidatorHook {
    /// A hook that always succeeds.
    pub fn transform(
        name: impl Into<String>,
        f: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: HookKind::Transform(Arc::new(f)),
        }
    }

    /// A hook that may reject the value.
    pub fn check(
        name: impl Into<String>,
        f: impl Fn(Value) -> Result<Value, HookError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: HookKind::Check(Arc::new(f)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &HookKind {
        &self.kind
    }

    /// Run the hook.
    ///
    /// # Errors
    ///
    /// Returns the hook's own [`HookError`] when a check rejects the value.
    pub fn apply(&self, value: Value) -> Result<Value, HookError> {
        match &self.kind {
            HookKind::Transform(f) => Ok(f(value)),
            HookKind::Check(f) => f(value),
        }
    }
}

impl std::fmt::Debug for ValidatorHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            HookKind::Transform(_) => "transform",
            HookKind::Check(_) => "check",
        };
        f.debug_struct("ValidatorHook")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper() -> ValidatorHook {
        ValidatorHook::transform("upper", |v| match v {
            Value::Str(s) => Value::Str(s.to_uppercase()),
            other => other,
        })
    }

    #[test]
    fn transform_always_succeeds() {
        assert_eq!(upper().apply(Value::from("nitish")).unwrap(), Value::from("NITISH"));
        assert_eq!(upper().apply(Value::Int(1)).unwrap(), Value::Int(1));
    }

    #[test]
    fn check_can_reject() {
        let positive = ValidatorHook::check("positive", |v| match v.as_int() {
            Some(i) if i > 0 => Ok(v),
            _ => Err("must be positive".into()),
        });
        assert!(positive.apply(Value::Int(3)).is_ok());
        let err = positive.apply(Value::Int(-3)).unwrap_err();
        assert_eq!(err.message(), "must be positive");
    }

    #[test]
    fn debug_names_kind() {
        let s = format!("{:?}", upper());
        assert!(s.contains("upper"));
        assert!(s.contains("transform"));
    }

    #[test]
    fn phase_serde_names() {
        assert_eq!(serde_json::to_string(&Phase::Before).unwrap(), r#""before""#);
        let p: Phase = serde_json::from_str(r#""after""#).unwrap();
        assert_eq!(p, Phase::After);
    }
}
