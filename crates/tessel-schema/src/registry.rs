//! # Schema Registry
//!
//! Resolves a set of [`ModelDescriptor`]s into defined [`Schema`]s.
//!
//! Descriptors refer to each other by model name and to hooks by hook
//! name. The registry:
//!
//! 1. rejects duplicate model names,
//! 2. parses every field type and checks that each referenced model is
//!    declared,
//! 3. orders the models so that every model is defined after the models it
//!    embeds, rejecting reference cycles,
//! 4. defines each schema, resolving hook names through a [`HookTable`].
//!
//! The result maps model names to `Arc<Schema>` in definition order.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tessel_model::{FieldDescriptor, FieldType, Schema, ValidatorHook};

use crate::descriptor::{FieldSpec, ModelDescriptor, TypeExpr};
use crate::error::{DescriptorError, RegistryError};

/// File suffixes picked up by [`SchemaRegistry::load_dir`].
pub const DESCRIPTOR_SUFFIXES: [&str; 3] = [".model.yaml", ".model.yml", ".model.json"];

/// Named hooks available to descriptors.
#[derive(Debug, Clone, Default)]
pub struct HookTable {
    hooks: HashMap<String, ValidatorHook>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook under its own name, replacing any hook of that name.
    pub fn with(mut self, hook: ValidatorHook) -> Self {
        self.insert(hook);
        self
    }

    pub fn insert(&mut self, hook: ValidatorHook) {
        self.hooks.insert(hook.name().to_string(), hook);
    }

    pub fn get(&self, name: &str) -> Option<&ValidatorHook> {
        self.hooks.get(name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl FromIterator<ValidatorHook> for HookTable {
    fn from_iter<I: IntoIterator<Item = ValidatorHook>>(iter: I) -> Self {
        let mut table = Self::new();
        for hook in iter {
            table.insert(hook);
        }
        table
    }
}

/// Schemas defined from descriptors, by model name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Arc<Schema>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl SchemaRegistry {
    /// Resolve and define every descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] for duplicate or unknown models, unknown
    /// hooks, reference cycles, malformed field types and any
    /// [`SchemaError`](tessel_model::SchemaError) raised while defining.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ModelDescriptor>,
        hooks: &HookTable,
    ) -> Result<Self, RegistryError> {
        let mut by_name: IndexMap<String, ModelDescriptor> = IndexMap::new();
        for d in descriptors {
            if by_name.contains_key(&d.name) {
                return Err(RegistryError::DuplicateModel(d.name));
            }
            by_name.insert(d.name.clone(), d);
        }

        // Model name -> (field, referenced model) edges, in field order.
        let mut edges: IndexMap<&str, Vec<(&str, String)>> = IndexMap::new();
        for (name, d) in &by_name {
            let mut refs = Vec::new();
            for (field, ty) in d.field_types()? {
                if let Some(target) = ty.model_reference() {
                    if !by_name.contains_key(target) {
                        return Err(RegistryError::UnknownModel {
                            model: name.clone(),
                            field: field.to_string(),
                            reference: target.to_string(),
                        });
                    }
                    refs.push((field, target.to_string()));
                }
            }
            edges.insert(name.as_str(), refs);
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut order: Vec<&str> = Vec::with_capacity(by_name.len());
        let mut stack: Vec<&str> = Vec::new();
        for name in by_name.keys() {
            visit(name, &edges, &mut marks, &mut stack, &mut order)?;
        }

        let mut schemas: IndexMap<String, Arc<Schema>> = IndexMap::with_capacity(order.len());
        for name in order {
            let Some(d) = by_name.get(name) else {
                continue;
            };
            let schema = define(d, &schemas, hooks)?;
            schemas.insert(name.to_string(), schema);
        }
        tracing::debug!(models = schemas.len(), hooks = hooks.len(), "descriptors resolved");
        Ok(Self { schemas })
    }

    /// Load every descriptor file in `dir` (non-recursive) and resolve them.
    ///
    /// Files are read in name order; only names ending in one of
    /// [`DESCRIPTOR_SUFFIXES`] are considered.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Descriptor`] for unreadable or malformed
    /// files and otherwise as [`SchemaRegistry::from_descriptors`].
    pub fn load_dir(dir: impl AsRef<Path>, hooks: &HookTable) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(DescriptorError::Io)? {
            let path = entry.map_err(DescriptorError::Io)?.path();
            let is_descriptor = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| DESCRIPTOR_SUFFIXES.iter().any(|s| n.ends_with(s)));
            if is_descriptor {
                paths.push(path);
            }
        }
        paths.sort();

        let descriptors = paths
            .iter()
            .map(|p| ModelDescriptor::from_path(p))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(dir = %dir.display(), files = descriptors.len(), "descriptors loaded");
        Self::from_descriptors(descriptors, hooks)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Like [`SchemaRegistry::get`], as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] for unknown names.
    pub fn schema(&self, name: &str) -> Result<&Arc<Schema>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    /// Model names in definition order (embedded models first).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Schema>)> {
        self.schemas.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Depth-first post-order walk; a model seen again while still on the
/// stack closes a cycle.
fn visit<'a>(
    name: &'a str,
    edges: &IndexMap<&'a str, Vec<(&'a str, String)>>,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
    order: &mut Vec<&'a str>,
) -> Result<(), RegistryError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|n| *n == name).unwrap_or(0);
            let mut chain: Vec<&str> = stack[start..].to_vec();
            chain.push(name);
            return Err(RegistryError::Cycle {
                chain: chain.join(" -> "),
            });
        }
        None => {}
    }
    marks.insert(name, Mark::Visiting);
    stack.push(name);
    if let Some(refs) = edges.get(name) {
        for (_, target) in refs {
            // Targets were checked against the edge keys above.
            if let Some((key, _)) = edges.get_key_value(target.as_str()) {
                visit(*key, edges, marks, stack, order)?;
            }
        }
    }
    stack.pop();
    marks.insert(name, Mark::Done);
    order.push(name);
    Ok(())
}

fn define(
    d: &ModelDescriptor,
    defined: &IndexMap<String, Arc<Schema>>,
    hooks: &HookTable,
) -> Result<Arc<Schema>, RegistryError> {
    let mut builder = Schema::builder(d.name.clone()).config(d.config.clone());
    for ((field, spec), (_, ty)) in d.fields.iter().zip(d.field_types()?) {
        let field_type = resolve(&ty, defined).ok_or_else(|| RegistryError::UnknownModel {
            model: d.name.clone(),
            field: field.clone(),
            reference: ty.model_reference().unwrap_or_default().to_string(),
        })?;
        builder = builder.field(field_descriptor(d, field, spec, field_type)?);
        for (phase, names) in [
            (tessel_model::Phase::Before, &spec.hooks.before),
            (tessel_model::Phase::After, &spec.hooks.after),
        ] {
            for hook_name in names {
                let hook = hooks.get(hook_name).ok_or_else(|| RegistryError::UnknownHook {
                    model: d.name.clone(),
                    field: field.clone(),
                    hook: hook_name.clone(),
                })?;
                builder = builder.hook(field.clone(), phase, hook.clone());
            }
        }
    }
    Ok(builder.define()?)
}

fn resolve(ty: &TypeExpr, defined: &IndexMap<String, Arc<Schema>>) -> Option<FieldType> {
    Some(match ty {
        TypeExpr::Scalar(s) => FieldType::Scalar(*s),
        TypeExpr::List(inner) => FieldType::sequence_of(resolve(inner, defined)?),
        TypeExpr::Dict(inner) => FieldType::mapping_of(resolve(inner, defined)?),
        TypeExpr::Model(name) => FieldType::model(defined.get(name)?),
    })
}

fn field_descriptor(
    d: &ModelDescriptor,
    field: &str,
    spec: &FieldSpec,
    field_type: FieldType,
) -> Result<FieldDescriptor, RegistryError> {
    let constraints = spec
        .constraints
        .to_constraints()
        .map_err(|reason| DescriptorError::InvalidPattern {
            model: d.name.clone(),
            field: field.to_string(),
            reason,
        })?;
    let mut f = FieldDescriptor::new(field, field_type).constraints(constraints);
    if let Some(default) = &spec.default {
        f = f.default(default.clone());
    } else if spec.optional {
        f = f.optional();
    }
    if spec.nullable {
        f = f.nullable();
    }
    if spec.strict {
        f = f.strict();
    }
    if let Some(title) = &spec.title {
        f = f.title(title.clone());
    }
    if let Some(description) = &spec.description {
        f = f.description(description.clone());
    }
    for example in &spec.examples {
        f = f.example(example.clone());
    }
    Ok(f)
}
