//! # Instances
//!
//! An [`Instance`] is the immutable result of a successful build: one value
//! per declared field, in declaration order, each tagged with its
//! [`FieldSource`]. Every stored value has passed coercion, constraints and
//! hooks. There is no setter; a changed instance is a new build.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::schema::Schema;
use crate::value::{Map, Value};

/// Where a stored value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSource {
    /// Supplied in the build input.
    Input,
    /// Filled from the schema default.
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slot {
    pub value: Value,
    pub source: FieldSource,
}

/// A validated model value.
#[derive(Clone)]
pub struct Instance {
    schema: Arc<Schema>,
    slots: IndexMap<String, Slot>,
}

impl Instance {
    pub(crate) fn new(schema: Arc<Schema>, slots: IndexMap<String, Slot>) -> Self {
        Self { schema, slots }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The value of a declared field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.slots.get(field).map(|s| &s.value)
    }

    pub fn source(&self, field: &str) -> Option<FieldSource> {
        self.slots.get(field).map(|s| s.source)
    }

    /// Whether the field was supplied in the input.
    pub fn is_set(&self, field: &str) -> bool {
        self.source(field) == Some(FieldSource::Input)
    }

    /// Names of fields supplied in the input, in declaration order.
    pub fn fields_set(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|(_, s)| s.source == FieldSource::Input)
            .map(|(k, _)| k.as_str())
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(k, s)| (k.as_str(), &s.value))
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.slots.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All field values as a map, nested instances kept as instances.
    pub fn to_map(&self) -> Map {
        self.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }
}

/// Instances are equal when they belong to the same schema (by identity)
/// and hold equal values. Field sources do not take part.
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
            && self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(other.slots.iter())
                .all(|((ka, a), (kb, b))| ka == kb && a.value == b.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        for (name, value) in self.iter() {
            s.field(name, value);
        }
        s.finish()
    }
}
