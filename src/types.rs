//! Declared types and the binding plan they hang off.
//!
//! A [`TypeKey`] is the static type of a binding position. It doubles as the
//! lookup key of the null provider registry, so it must only ever be derived
//! from the plan, never from the value that happens to be in the input.
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

static OBJECT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("object name regex"));

// ------------------------------- TypeKey ---------------------------------- //

/// Declared type of a binding position.
///
/// Textual form: `any`, `bool`, `integer`, `number`, `string`, `seq<T>`,
/// `map<T>` (string keys), or a bare object name such as `TestObject`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeKey {
    Any,
    Bool,
    Integer,
    Number,
    String,
    Seq(Box<TypeKey>),
    Map(Box<TypeKey>),
    Object(String),
}

impl TypeKey {
    pub fn seq_of(item: TypeKey) -> Self { TypeKey::Seq(Box::new(item)) }
    pub fn map_of(value: TypeKey) -> Self { TypeKey::Map(Box::new(value)) }
    pub fn object(name: impl Into<String>) -> Self { TypeKey::Object(name.into()) }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Any => f.write_str("any"),
            TypeKey::Bool => f.write_str("bool"),
            TypeKey::Integer => f.write_str("integer"),
            TypeKey::Number => f.write_str("number"),
            TypeKey::String => f.write_str("string"),
            TypeKey::Seq(item) => write!(f, "seq<{item}>"),
            TypeKey::Map(value) => write!(f, "map<{value}>"),
            TypeKey::Object(name) => f.write_str(name),
        }
    }
}

impl FromStr for TypeKey {
    type Err = Error;

    fn from_str(src: &str) -> Result<Self> {
        let s = src.trim();
        if let Some(inner) = generic_arg(s, "seq") {
            return Ok(TypeKey::seq_of(inner.parse()?));
        }
        if let Some(inner) = generic_arg(s, "map") {
            return Ok(TypeKey::map_of(inner.parse()?));
        }
        match s {
            "any" => Ok(TypeKey::Any),
            "bool" => Ok(TypeKey::Bool),
            "integer" => Ok(TypeKey::Integer),
            "number" => Ok(TypeKey::Number),
            "string" => Ok(TypeKey::String),
            name if OBJECT_NAME.is_match(name) => Ok(TypeKey::Object(name.to_string())),
            _ => Err(Error::InvalidTypeKey(src.to_string())),
        }
    }
}

fn generic_arg<'a>(s: &'a str, ctor: &str) -> Option<&'a str> {
    s.strip_prefix(ctor)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}

impl TryFrom<String> for TypeKey {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<TypeKey> for String {
    fn from(key: TypeKey) -> Self { key.to_string() }
}

// ---------------------------- Binding plan -------------------------------- //

/// One declared field of an object type.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub ty: TypeKey,
    /// Pre-parse default. `None` means the field starts out null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    pub fn has_default(&self) -> bool { self.default.is_some() }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectType {
    #[serde(default)]
    pub fields: IndexMap<String, FieldDescriptor>,
    /// Declared value type of the catch-all sink, if the type has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catch_all: Option<TypeKey>,
    #[serde(default)]
    pub ignore_unknown: bool,
}

impl ObjectType {
    pub fn new() -> Self { Self::default() }

    pub fn field(mut self, name: impl Into<String>, ty: TypeKey) -> Self {
        self.fields.insert(name.into(), FieldDescriptor { ty, default: None });
        self
    }

    pub fn field_with_default(mut self, name: impl Into<String>, ty: TypeKey, default: Value) -> Self {
        self.fields.insert(name.into(), FieldDescriptor { ty, default: Some(default) });
        self
    }

    pub fn catch_all(mut self, value_ty: TypeKey) -> Self {
        self.catch_all = Some(value_ty);
        self
    }

    pub fn ignore_unknown(mut self, yes: bool) -> Self {
        self.ignore_unknown = yes;
        self
    }
}

/// The binding plan: named object types plus an optional default root type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<TypeKey>,
    #[serde(default)]
    pub objects: IndexMap<String, ObjectType>,
}

impl Schema {
    pub fn new() -> Self { Self::default() }

    pub fn with_root(mut self, root: TypeKey) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_object(mut self, name: impl Into<String>, obj: ObjectType) -> Self {
        self.objects.insert(name.into(), obj);
        self
    }

    pub fn object(&self, name: &str) -> Result<&ObjectType> {
        self.objects
            .get(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    /// Parse a schema document; errors carry the offending JSON path.
    pub fn from_json_str(src: &str) -> Result<Self> {
        let schema: Schema = crate::path_de::from_str_with_path(src).map_err(Error::into_schema)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Every object name referenced anywhere in the plan must be defined,
    /// field defaults must not instantiate their own type, and every default
    /// must bind against its field's type.
    pub fn validate(&self) -> Result<()> {
        if let Some(root) = &self.root {
            self.check_key(root)?;
        }
        for obj in self.objects.values() {
            for field in obj.fields.values() {
                self.check_key(&field.ty)?;
            }
            if let Some(ty) = &obj.catch_all {
                self.check_key(ty)?;
            }
        }
        for name in self.objects.keys() {
            self.walk_instantiation(name, &mut Vec::new())?;
        }
        let plain = crate::binder::Binder::plain(self);
        for (type_name, obj) in &self.objects {
            for (field, desc) in &obj.fields {
                let Some(default) = &desc.default else { continue };
                plain.bind_root(default, &desc.ty).map_err(|err| Error::Schema {
                    path: format!("objects.{type_name}.fields.{field}.default"),
                    message: err.to_string(),
                })?;
            }
        }
        Ok(())
    }

    // ------------------------- Default cycle check ------------------------- //

    /// Follow what instantiating `name` binds: each defaulted field's default,
    /// through its declared type. `stack` holds the types being instantiated.
    fn walk_instantiation<'s>(&'s self, name: &'s str, stack: &mut Vec<&'s str>) -> Result<()> {
        if let Some(pos) = stack.iter().position(|n| *n == name) {
            let mut chain = stack[pos..].to_vec();
            chain.push(name);
            return Err(Error::Schema {
                path: format!("objects.{}", stack[pos]),
                message: format!("field defaults instantiate themselves: {}", chain.join(" → ")),
            });
        }
        let obj = self.object(name)?;
        stack.push(name);
        for desc in obj.fields.values() {
            if let Some(default) = &desc.default {
                self.walk_default(default, &desc.ty, stack)?;
            }
        }
        stack.pop();
        Ok(())
    }

    fn walk_default<'s>(&'s self, value: &'s Value, ty: &'s TypeKey, stack: &mut Vec<&'s str>) -> Result<()> {
        match (ty, value) {
            (TypeKey::Object(name), Value::Object(props)) => {
                self.walk_instantiation(name, stack)?;
                let obj = self.object(name)?;
                for (prop, x) in props {
                    let prop_ty = obj.fields.get(prop).map(|d| &d.ty).or(obj.catch_all.as_ref());
                    if let Some(prop_ty) = prop_ty {
                        self.walk_default(x, prop_ty, stack)?;
                    }
                }
                Ok(())
            }
            (TypeKey::Seq(item), Value::Array(xs)) => {
                xs.iter().try_for_each(|x| self.walk_default(x, item, stack))
            }
            (TypeKey::Map(value_ty), Value::Object(props)) => {
                props.values().try_for_each(|x| self.walk_default(x, value_ty, stack))
            }
            // Shape mismatches are reported by the type check.
            _ => Ok(()),
        }
    }

    pub fn check_key(&self, key: &TypeKey) -> Result<()> {
        match key {
            TypeKey::Seq(inner) | TypeKey::Map(inner) => self.check_key(inner),
            TypeKey::Object(name) => self.object(name).map(|_| ()),
            _ => Ok(()),
        }
    }
}
