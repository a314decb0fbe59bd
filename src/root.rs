//! Whole-document binding.
//!
//! The root of a single-value parse has no owner and no earlier value, so a
//! root `null` is never suppressed: it becomes the provider's substitute for
//! the root type, or a literal null.
use serde_json::Value;

use crate::binder::{Binder, ROOT_PATH};
use crate::error::Result;
use crate::target::AssignmentTarget;
use crate::types::TypeKey;
use crate::value::Bound;

#[derive(Clone, Copy, Debug)]
pub struct RootValueBinder<'b, 'a> {
    binder: &'b Binder<'a>,
}

impl<'b, 'a> RootValueBinder<'b, 'a> {
    pub fn new(binder: &'b Binder<'a>) -> Self { Self { binder } }

    pub fn bind(&self, value: &Value, ty: &TypeKey) -> Result<Bound> {
        let mut result = Bound::Null;
        self.binder
            .bind_into(value, ty, ROOT_PATH, AssignmentTarget::Root { result: &mut result })?;
        Ok(result)
    }

    pub fn bind_str(&self, src: &str, ty: &TypeKey) -> Result<Bound> {
        let value: Value = serde_json::from_str(src)?;
        self.bind(&value, ty)
    }

    pub fn bind_slice(&self, bytes: &[u8], ty: &TypeKey) -> Result<Bound> {
        let value: Value = serde_json::from_slice(bytes)?;
        self.bind(&value, ty)
    }

    /// Bind every document of a whitespace-separated stream (NDJSON included).
    /// Stops at the first failing document.
    pub fn bind_stream(&self, src: &str, ty: &TypeKey) -> Result<Vec<Bound>> {
        serde_json::Deserializer::from_str(src)
            .into_iter::<Value>()
            .map(|value| self.bind(&value?, ty))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SuppressionPolicy;
    use crate::provider::{ConstantNull, NullProviderRegistry};
    use crate::types::Schema;

    #[test]
    fn root_null_with_provider_is_substituted() {
        let schema = Schema::new();
        let reg = NullProviderRegistry::new().with(TypeKey::String, ConstantNull(Bound::from("funny")));
        for policy in [SuppressionPolicy::DISABLED, SuppressionPolicy::NEVER_SET_AS_NULL] {
            let binder = Binder::new(&schema, &reg, policy);
            assert_eq!(binder.root().bind_str("null", &TypeKey::String).unwrap(), Bound::from("funny"));
        }
    }

    #[test]
    fn root_null_without_provider_is_null_even_when_suppressing() {
        let schema = Schema::new();
        let reg = NullProviderRegistry::new();
        let binder = Binder::new(&schema, &reg, SuppressionPolicy::NEVER_SET_AS_NULL);
        assert_eq!(binder.root().bind_slice(b"null", &TypeKey::String).unwrap(), Bound::Null);
        assert_eq!(binder.root().bind_str("null", &TypeKey::map_of(TypeKey::String)).unwrap(), Bound::Null);
    }

    #[test]
    fn same_binder_reads_repeatedly() {
        let schema = Schema::new();
        let reg = NullProviderRegistry::new().with(TypeKey::String, ConstantNull(Bound::from("funny")));
        let binder = Binder::new(&schema, &reg, SuppressionPolicy::DISABLED);
        let ty = TypeKey::map_of(TypeKey::String);
        let first = binder.root().bind_str(r#"{"key":null}"#, &ty).unwrap();
        let second = binder.root().bind_str(r#"{"key":null}"#, &ty).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stream_binds_each_document() {
        let schema = Schema::new();
        let reg = NullProviderRegistry::new();
        let binder = Binder::new(&schema, &reg, SuppressionPolicy::NEVER_SET_AS_NULL);
        let docs = binder.root().bind_stream("null\n[null, \"a\"]\n[]\n", &TypeKey::seq_of(TypeKey::String)).unwrap();
        assert_eq!(docs, vec![
            Bound::Null,
            Bound::Seq(vec![Bound::from("a")]),
            Bound::Seq(vec![]),
        ]);
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let schema = Schema::new();
        let binder = Binder::plain(&schema);
        let err = binder.root().bind_str("{\"a\":", &TypeKey::Any).unwrap_err();
        assert!(matches!(err, crate::error::Error::Parse(_)));
    }
}
