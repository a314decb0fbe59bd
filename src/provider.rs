//! Custom null providers and the per-configuration registry that holds them.
//!
//! The registry is filled while the configuration is assembled and is only
//! read afterwards. Share it behind an `Arc`; it needs no locking.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::ProviderError;
use crate::types::TypeKey;
use crate::value::Bound;

/// What a provider is told about the null it is standing in for.
#[derive(Clone, Copy, Debug)]
pub struct NullContext<'a> {
    pub type_key: &'a TypeKey,
    /// JSON path of the binding position, e.g. `.any.fieldName`.
    pub path: &'a str,
}

/// Produces the substitute value for a JSON `null` of one declared type.
///
/// Implementations must be stateless across calls and deterministic.
pub trait NullProvider: Send + Sync {
    fn null_value(&self, ctx: &NullContext<'_>) -> Result<Bound, ProviderError>;
}

/// Provider backed by a closure; see [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F>(F);

/// Wrap a closure as a [`NullProvider`].
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&NullContext<'_>) -> Result<Bound, ProviderError> + Send + Sync,
{
    FromFn(f)
}

impl<F> NullProvider for FromFn<F>
where
    F: Fn(&NullContext<'_>) -> Result<Bound, ProviderError> + Send + Sync,
{
    fn null_value(&self, ctx: &NullContext<'_>) -> Result<Bound, ProviderError> {
        (self.0)(ctx)
    }
}

/// Always answers with the same value.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantNull(pub Bound);

impl NullProvider for ConstantNull {
    fn null_value(&self, _: &NullContext<'_>) -> Result<Bound, ProviderError> {
        Ok(self.0.clone())
    }
}

// ------------------------------- Registry --------------------------------- //

#[derive(Clone, Default)]
pub struct NullProviderRegistry {
    providers: HashMap<TypeKey, Arc<dyn NullProvider>>,
}

impl NullProviderRegistry {
    pub fn new() -> Self { Self::default() }

    /// Install `provider` for `key`. A later registration for the same key wins.
    pub fn register<P>(&mut self, key: TypeKey, provider: P) -> &mut Self
    where
        P: NullProvider + 'static,
    {
        if self.providers.insert(key.clone(), Arc::new(provider)).is_some() {
            debug!("null provider for `{key}` replaced");
        }
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<P>(mut self, key: TypeKey, provider: P) -> Self
    where
        P: NullProvider + 'static,
    {
        self.register(key, provider);
        self
    }

    pub fn lookup(&self, key: &TypeKey) -> Option<&dyn NullProvider> {
        self.providers.get(key).map(|p| p.as_ref())
    }

    pub fn contains(&self, key: &TypeKey) -> bool { self.providers.contains_key(key) }

    pub fn len(&self) -> usize { self.providers.len() }

    pub fn is_empty(&self) -> bool { self.providers.is_empty() }

    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> { self.providers.keys() }

    /// Copy every entry of `other` in; `other` wins on conflicts.
    pub fn extend(&mut self, other: &NullProviderRegistry) {
        for (key, provider) in &other.providers {
            self.providers.insert(key.clone(), Arc::clone(provider));
        }
    }

    /// Freeze into a shareable handle.
    pub fn into_shared(self) -> Arc<Self> { Arc::new(self) }
}

impl fmt::Debug for NullProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.providers.keys().map(|k| k.to_string()).collect::<Vec<_>>();
        keys.sort();
        f.debug_struct("NullProviderRegistry").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(key: &TypeKey) -> NullContext<'_> { NullContext { type_key: key, path: "." } }

    #[test]
    fn absent_key_is_none() {
        let reg = NullProviderRegistry::new();
        assert!(reg.lookup(&TypeKey::String).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn last_registration_wins() {
        let mut reg = NullProviderRegistry::new();
        reg.register(TypeKey::String, ConstantNull(Bound::from("first")));
        reg.register(TypeKey::String, ConstantNull(Bound::from("second")));
        assert_eq!(reg.len(), 1);
        let got = reg.lookup(&TypeKey::String).unwrap().null_value(&ctx(&TypeKey::String)).unwrap();
        assert_eq!(got, Bound::from("second"));
    }

    #[test]
    fn lookup_is_by_declared_key_only() {
        let reg = NullProviderRegistry::new().with(TypeKey::String, ConstantNull(Bound::from("x")));
        assert!(reg.lookup(&TypeKey::Any).is_none());
        assert!(reg.lookup(&TypeKey::seq_of(TypeKey::String)).is_none());
    }

    #[test]
    fn closures_are_providers() {
        let reg = NullProviderRegistry::new().with(TypeKey::Integer, from_fn(|c| {
            Ok(Bound::String(format!("{}@{}", c.type_key, c.path)))
        }));
        let got = reg.lookup(&TypeKey::Integer).unwrap().null_value(&ctx(&TypeKey::Integer)).unwrap();
        assert_eq!(got, Bound::from("integer@."));
    }

    #[test]
    fn shared_registry_is_readable_from_threads() {
        let reg = NullProviderRegistry::new()
            .with(TypeKey::String, ConstantNull(Bound::from("funny")))
            .into_shared();
        let handles = (0..4).map(|_| {
            let reg = Arc::clone(&reg);
            std::thread::spawn(move || {
                let key = TypeKey::String;
                reg.lookup(&key).unwrap().null_value(&ctx(&key)).unwrap()
            })
        }).collect::<Vec<_>>();
        for h in handles {
            assert_eq!(h.join().unwrap(), Bound::from("funny"));
        }
    }
}
