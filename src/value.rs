//! Destination values produced by binding.
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};

/// A bound program value. `Null` is the literal null a binding position can hold.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Seq(Vec<Bound>),
    Map(IndexMap<String, Bound>),
    Object(Instance),
}

impl Bound {
    pub fn is_null(&self) -> bool { matches!(self, Bound::Null) }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bound::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Bound]> {
        match self {
            Bound::Seq(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Bound>> {
        match self {
            Bound::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Bound::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Bound::Null => Value::Null,
            Bound::Bool(b) => Value::Bool(*b),
            Bound::Number(n) => Value::Number(n.clone()),
            Bound::String(s) => Value::String(s.clone()),
            Bound::Seq(xs) => Value::Array(xs.iter().map(Bound::to_json).collect()),
            Bound::Map(m) => Value::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
            Bound::Object(o) => o.to_json(),
        }
    }
}

impl From<&str> for Bound {
    fn from(s: &str) -> Self { Bound::String(s.to_string()) }
}

impl From<String> for Bound {
    fn from(s: String) -> Self { Bound::String(s) }
}

impl From<bool> for Bound {
    fn from(b: bool) -> Self { Bound::Bool(b) }
}

impl From<i64> for Bound {
    fn from(n: i64) -> Self { Bound::Number(n.into()) }
}

/// An instance of a declared object type.
///
/// `fields` always holds every declared field (null when unset). `extra`
/// is the catch-all sink: `(name, value)` pairs for undeclared properties.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Instance {
    #[serde(skip)]
    pub type_name: String,
    #[serde(flatten)]
    pub fields: IndexMap<String, Bound>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Bound>,
}

impl Instance {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), fields: IndexMap::new(), extra: IndexMap::new() }
    }

    pub fn get(&self, field: &str) -> Option<&Bound> { self.fields.get(field) }

    pub fn set(&mut self, field: &str, value: Bound) {
        self.fields.insert(field.to_string(), value);
    }

    /// The catch-all sink: capture an undeclared property.
    pub fn accept_any(&mut self, name: &str, value: Bound) {
        self.extra.insert(name.to_string(), value);
    }

    pub fn any(&self) -> &IndexMap<String, Bound> { &self.extra }

    pub fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        for (k, v) in self.fields.iter().chain(self.extra.iter()) {
            out.insert(k.clone(), v.to_json());
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn instance_serializes_fields_then_catch_all() {
        let mut inst = Instance::new("AnySetter");
        inst.set("id", Bound::from(7i64));
        inst.accept_any("fieldName", Bound::from("funny"));
        let expected = json!({"id": 7, "fieldName": "funny"});
        assert_eq!(inst.to_json(), expected);
        assert_eq!(serde_json::to_value(Bound::Object(inst)).unwrap(), expected);
    }

    #[test]
    fn null_serializes_as_json_null() {
        let v = Bound::Seq(vec![Bound::Null, Bound::from(true)]);
        assert_eq!(serde_json::to_value(&v).unwrap(), json!([null, true]));
        assert_eq!(v.to_json(), json!([null, true]));
    }
}
