//! # Field Paths
//!
//! A [`FieldPath`] names a location inside a validated model. Nested model
//! fields and mapping entries are joined with [`SEPARATOR`]; sequence
//! elements are addressed with a bracketed index:
//!
//! ```text
//! name              top-level field
//! address.pin       field of a nested model
//! allergies[2]      third element of a sequence
//! contacts.phone    entry of a mapping
//! ```
//!
//! Selection keys used by projections (`include` / `exclude`) use the same
//! dotted form but never carry indices.

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Separator between the segments of a dotted path.
pub const SEPARATOR: char = '.';

/// Dotted location of a value inside a model. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// The root path (the model itself).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// A single-segment path.
    pub fn new(field: impl Into<String>) -> Self {
        Self(field.into())
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path of a named child (`parent.child`).
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}{SEPARATOR}{name}", self.0))
        }
    }

    /// The path of a sequence element (`parent[index]`).
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    /// Borrow the dotted string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the path, returning the dotted string form.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Split a selection key on its first separator.
///
/// Returns the leading field name and the remainder, if any. The whole key
/// is checked for empty segments first so that `"a..b"` is rejected at the
/// outermost level with the full key in the error.
///
/// ```
/// use tessel_core::split_selector;
///
/// assert_eq!(split_selector("address.state").unwrap(), ("address", Some("state")));
/// assert_eq!(split_selector("name").unwrap(), ("name", None));
/// assert!(split_selector("address..state").is_err());
/// ```
pub fn split_selector(key: &str) -> Result<(&str, Option<&str>), PathError> {
    if key.is_empty() {
        return Err(PathError::Empty);
    }
    if key.split(SEPARATOR).any(str::is_empty) {
        return Err(PathError::EmptySegment(key.to_string()));
    }
    Ok(match key.split_once(SEPARATOR) {
        Some((head, rest)) => (head, Some(rest)),
        None => (key, None),
    })
}
