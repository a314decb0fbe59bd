//! Deserializer configuration: the suppression option, constant null
//! substitutes, and unknown-property handling.
//!
//! ```json
//! { "never_set_as_null": true, "null_values": { "string": "funny" } }
//! ```
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binder::{BindOptions, Binder};
use crate::error::{Error, Result};
use crate::policy::SuppressionPolicy;
use crate::provider::{ConstantNull, NullProviderRegistry};
use crate::types::{Schema, TypeKey};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinderConfig {
    /// Suppress null-driven overwrites on nested targets; roots are unaffected.
    pub never_set_as_null: bool,
    /// Constant substitute per declared type.
    pub null_values: IndexMap<TypeKey, Value>,
    pub ignore_unknown_properties: bool,
}

impl BinderConfig {
    pub fn from_json_str(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        crate::path_de::from_slice_with_path(&bytes)
    }

    pub fn policy(&self) -> SuppressionPolicy {
        SuppressionPolicy::new(self.never_set_as_null)
    }

    /// Later entries win, like repeated registrations.
    pub fn set_null_value(&mut self, key: TypeKey, value: Value) {
        self.null_values.shift_remove(&key);
        self.null_values.insert(key, value);
    }

    /// Build the frozen run settings. Each substitute is bound against its
    /// declared type now, so a mistyped one fails here instead of mid-parse.
    pub fn build(&self, schema: &Schema) -> Result<BindSettings> {
        let plain = Binder::plain(schema);
        let mut registry = NullProviderRegistry::new();
        for (key, value) in &self.null_values {
            schema.check_key(key)?;
            let bound = plain.bind_root(value, key).map_err(|err| Error::Config {
                path: format!("null_values.{key}"),
                message: err.to_string(),
            })?;
            registry.register(key.clone(), ConstantNull(bound));
        }
        Ok(BindSettings {
            registry: registry.into_shared(),
            policy: self.policy(),
            options: BindOptions { ignore_unknown_properties: self.ignore_unknown_properties },
        })
    }
}

/// Immutable per-configuration state, shareable across concurrent runs.
#[derive(Clone, Debug)]
pub struct BindSettings {
    pub registry: Arc<NullProviderRegistry>,
    pub policy: SuppressionPolicy,
    pub options: BindOptions,
}

impl BindSettings {
    pub fn new(registry: NullProviderRegistry, policy: SuppressionPolicy) -> Self {
        Self { registry: registry.into_shared(), policy, options: BindOptions::default() }
    }

    pub fn binder<'a>(&'a self, schema: &'a Schema) -> Binder<'a> {
        Binder::new(schema, &self.registry, self.policy).with_options(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Bound;
    use serde_json::json;

    #[test]
    fn config_parses_with_defaults() {
        let cfg = BinderConfig::from_json_str(r#"{"never_set_as_null": true}"#).unwrap();
        assert!(cfg.policy().is_enabled());
        assert!(cfg.null_values.is_empty());
        assert_eq!(BinderConfig::from_json_str("{}").unwrap(), BinderConfig::default());
    }

    #[test]
    fn unknown_option_names_the_path() {
        let err = BinderConfig::from_json_str(r#"{"never_set_as_nul": true}"#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        let err = BinderConfig::from_json_str(r#"{"null_values": {"seq<": 1}}"#).unwrap_err();
        match err {
            Error::Config { path, .. } => assert!(path.starts_with("null_values"), "{path}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_values_become_providers() {
        let cfg = BinderConfig::from_json_str(r#"{"null_values": {"string": "funny", "seq<integer>": [0]}}"#).unwrap();
        let schema = Schema::new();
        let settings = cfg.build(&schema).unwrap();
        assert_eq!(settings.registry.len(), 2);
        let binder = settings.binder(&schema);
        assert_eq!(binder.bind_str("null", &TypeKey::String).unwrap(), Bound::from("funny"));
        assert_eq!(
            binder.bind_str(r#"{"a":null}"#, &"map<seq<integer>>".parse().unwrap()).unwrap().to_json(),
            json!({"a": [0]})
        );
    }

    #[test]
    fn mistyped_substitute_fails_at_build() {
        let mut cfg = BinderConfig::default();
        cfg.set_null_value(TypeKey::Integer, json!("zero"));
        let err = cfg.build(&Schema::new()).unwrap_err();
        match err {
            Error::Config { path, .. } => assert_eq!(path, "null_values.integer"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn later_null_value_wins() {
        let mut cfg = BinderConfig::default();
        cfg.set_null_value(TypeKey::String, json!("a"));
        cfg.set_null_value(TypeKey::String, json!("b"));
        let schema = Schema::new();
        let settings = cfg.build(&schema).unwrap();
        assert_eq!(settings.binder(&schema).bind_str("null", &TypeKey::String).unwrap(), Bound::from("b"));
    }
}
