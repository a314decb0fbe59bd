//! Walks a parsed JSON document against a declared type.
//!
//! Every binding position goes through [`Binder::bind_into`]: non-null input
//! is bound and written, a `null` is handed to the resolution engine together
//! with the target for that position. Traversal is depth-first in document
//! order, so each decision sees the effect of all earlier ones.
use log::debug;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::engine::NullResolutionEngine;
use crate::error::{json_kind, Error, Result};
use crate::policy::SuppressionPolicy;
use crate::provider::NullProviderRegistry;
use crate::root::RootValueBinder;
use crate::target::AssignmentTarget;
use crate::types::{ObjectType, Schema, TypeKey};
use crate::value::{Bound, Instance};

/// Used for defaults: field initializers never consult providers or the policy.
static EMPTY_REGISTRY: Lazy<NullProviderRegistry> = Lazy::new(NullProviderRegistry::new);

pub const ROOT_PATH: &str = ".";

/// Nesting limit for defaults that instantiate objects with defaults.
/// [`Schema::validate`] rejects real cycles; this stops unvalidated ones.
const MAX_DEFAULT_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Drop undeclared properties of objects that have no catch-all sink.
    pub ignore_unknown_properties: bool,
}

/// One configured binding run: plan, registry, and the captured policy.
#[derive(Clone, Copy, Debug)]
pub struct Binder<'a> {
    schema: &'a Schema,
    engine: NullResolutionEngine<'a>,
    policy: SuppressionPolicy,
    options: BindOptions,
    default_depth: usize,
}

impl<'a> Binder<'a> {
    pub fn new(schema: &'a Schema, registry: &'a NullProviderRegistry, policy: SuppressionPolicy) -> Self {
        Self {
            schema,
            engine: NullResolutionEngine::new(registry),
            policy,
            options: BindOptions::default(),
            default_depth: 0,
        }
    }

    /// No providers, no suppression.
    pub fn plain(schema: &'a Schema) -> Self {
        Self::new(schema, &EMPTY_REGISTRY, SuppressionPolicy::DISABLED)
    }

    pub fn with_options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &'a Schema { self.schema }
    pub fn engine(&self) -> NullResolutionEngine<'a> { self.engine }
    pub fn policy(&self) -> SuppressionPolicy { self.policy }

    pub fn root(&self) -> RootValueBinder<'_, 'a> { RootValueBinder::new(self) }

    /// Parse `src` and bind it as a whole document of type `ty`.
    pub fn bind_str(&self, src: &str, ty: &TypeKey) -> Result<Bound> {
        self.root().bind_str(src, ty)
    }

    pub fn bind_root(&self, value: &Value, ty: &TypeKey) -> Result<Bound> {
        self.root().bind(value, ty)
    }

    /// Bind `value` at one position and hand the result to `target`.
    pub fn bind_into(&self, value: &Value, ty: &TypeKey, path: &str, target: AssignmentTarget<'_>) -> Result<()> {
        if value.is_null() {
            self.engine.resolve_and_apply(ty, self.policy, path, target)?;
        } else {
            let bound = self.bind_value(value, ty, path)?;
            target.put(bound);
        }
        Ok(())
    }

    /// A fresh instance: defaulted fields hold their defaults, the rest are null.
    pub fn instantiate(&self, name: &str) -> Result<Instance> {
        let obj = self.schema.object(name)?;
        if self.default_depth >= MAX_DEFAULT_DEPTH {
            return Err(Error::Schema {
                path: format!("objects.{name}"),
                message: format!("field defaults nest deeper than {MAX_DEFAULT_DEPTH} levels"),
            });
        }
        let plain = Binder { default_depth: self.default_depth + 1, ..Binder::plain(self.schema) };
        let mut inst = Instance::new(name);
        for (field, desc) in &obj.fields {
            let value = match &desc.default {
                Some(default) => plain.bind_root(default, &desc.ty)?,
                None => Bound::Null,
            };
            inst.set(field, value);
        }
        Ok(inst)
    }

    // ------------------------------ Internals ----------------------------- //

    fn bind_value(&self, value: &Value, ty: &TypeKey, path: &str) -> Result<Bound> {
        let mismatch = || Error::TypeMismatch { path: path.to_string(), expected: ty.clone(), found: json_kind(value) };
        match (ty, value) {
            // Callers route nulls through the engine before getting here.
            (_, Value::Null) => Ok(Bound::Null),

            (TypeKey::Any, Value::Array(_)) => self.bind_value(value, &TypeKey::seq_of(TypeKey::Any), path),
            (TypeKey::Any, Value::Object(_)) => self.bind_value(value, &TypeKey::map_of(TypeKey::Any), path),
            (TypeKey::Any, Value::Bool(b)) | (TypeKey::Bool, Value::Bool(b)) => Ok(Bound::Bool(*b)),
            (TypeKey::Any, Value::String(s)) | (TypeKey::String, Value::String(s)) => Ok(Bound::String(s.clone())),
            (TypeKey::Any, Value::Number(n)) | (TypeKey::Number, Value::Number(n)) => Ok(Bound::Number(n.clone())),
            (TypeKey::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Bound::Number(n.clone())),

            (TypeKey::Seq(item), Value::Array(xs)) => {
                let mut seq = Vec::with_capacity(xs.len());
                for (i, x) in xs.iter().enumerate() {
                    let p = index_path(path, i);
                    self.bind_into(x, item, &p, AssignmentTarget::SequenceElement { seq: &mut seq })?;
                }
                Ok(Bound::Seq(seq))
            }
            (TypeKey::Map(value_ty), Value::Object(props)) => {
                let mut map = indexmap::IndexMap::with_capacity(props.len());
                for (k, x) in props {
                    let p = key_path(path, k);
                    self.bind_into(x, value_ty, &p, AssignmentTarget::MapEntry { map: &mut map, key: k })?;
                }
                Ok(Bound::Map(map))
            }
            (TypeKey::Object(name), Value::Object(props)) => {
                let obj = self.schema.object(name)?;
                let mut inst = self.instantiate(name)?;
                for (prop, x) in props {
                    self.bind_property(obj, &mut inst, prop, x, path)?;
                }
                Ok(Bound::Object(inst))
            }
            _ => Err(mismatch()),
        }
    }

    fn bind_property(&self, obj: &ObjectType, inst: &mut Instance, prop: &str, x: &Value, path: &str) -> Result<()> {
        let p = key_path(path, prop);
        if let Some(desc) = obj.fields.get(prop) {
            let target = AssignmentTarget::Field { owner: inst, field: prop, has_default: desc.has_default() };
            return self.bind_into(x, &desc.ty, &p, target);
        }
        if let Some(sink_ty) = &obj.catch_all {
            return self.bind_into(x, sink_ty, &p, AssignmentTarget::CatchAll { owner: inst, key: prop });
        }
        if obj.ignore_unknown || self.options.ignore_unknown_properties {
            debug!("ignoring unknown property `{prop}` of `{}` at {p}", inst.type_name);
            return Ok(());
        }
        Err(Error::UnknownProperty { type_name: inst.type_name.clone(), property: prop.to_string(), path: p })
    }
}

fn key_path(parent: &str, key: &str) -> String {
    if parent == ROOT_PATH { format!(".{key}") } else { format!("{parent}.{key}") }
}

fn index_path(parent: &str, i: usize) -> String {
    if parent == ROOT_PATH { format!("[{i}]") } else { format!("{parent}[{i}]") }
}
