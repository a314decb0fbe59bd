//! Null resolution: decide what a JSON `null` turns into at one position.
//!
//! Precedence, highest first:
//! 1. a custom provider registered for the declared type;
//! 2. the suppression policy (nested targets only);
//! 3. a literal null.
use log::trace;

use crate::error::{Error, Result};
use crate::policy::SuppressionPolicy;
use crate::provider::{NullContext, NullProviderRegistry};
use crate::target::{Applied, AssignmentTarget, TargetKind};
use crate::types::TypeKey;
use crate::value::Bound;

/// Outcome of one null encounter. Never stored.
#[derive(Clone, Debug, PartialEq)]
pub enum NullDecision {
    Substitute(Bound),
    AssignNull,
    Skip,
}

impl NullDecision {
    /// Rewrite decisions that have no meaning for `kind`.
    pub fn normalize_for(self, kind: TargetKind) -> Self {
        match self {
            NullDecision::Skip if !kind.can_skip() => NullDecision::AssignNull,
            other => other,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            NullDecision::Substitute(_) => "substitute",
            NullDecision::AssignNull => "assign-null",
            NullDecision::Skip => "skip",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NullResolutionEngine<'r> {
    registry: &'r NullProviderRegistry,
}

impl<'r> NullResolutionEngine<'r> {
    pub fn new(registry: &'r NullProviderRegistry) -> Self { Self { registry } }

    pub fn registry(&self) -> &'r NullProviderRegistry { self.registry }

    /// Decide for a nested position of declared type `key`.
    pub fn resolve(&self, key: &TypeKey, policy: SuppressionPolicy, path: &str) -> Result<NullDecision> {
        if let Some(decision) = self.substitute(key, path)? {
            return Ok(decision);
        }
        if policy.is_enabled() {
            Ok(NullDecision::Skip)
        } else {
            Ok(NullDecision::AssignNull)
        }
    }

    /// Decide for a position of the given kind. Roots ignore the policy.
    pub fn resolve_for(
        &self,
        key: &TypeKey,
        kind: TargetKind,
        policy: SuppressionPolicy,
        path: &str,
    ) -> Result<NullDecision> {
        let decision = match kind {
            TargetKind::Root => self.substitute(key, path)?.unwrap_or(NullDecision::AssignNull),
            _ => self.resolve(key, policy, path)?,
        };
        Ok(decision.normalize_for(kind))
    }

    /// Resolve and apply the null at this position. Called once per null token.
    pub fn resolve_and_apply(
        &self,
        key: &TypeKey,
        policy: SuppressionPolicy,
        path: &str,
        target: AssignmentTarget<'_>,
    ) -> Result<Applied> {
        let kind = target.kind();
        let decision = self.resolve_for(key, kind, policy, path)?;
        trace!("null at {path} ({}: {key}) -> {}", kind.as_str(), decision.variant_name());
        Ok(target.apply(decision))
    }

    fn substitute(&self, key: &TypeKey, path: &str) -> Result<Option<NullDecision>> {
        let Some(provider) = self.registry.lookup(key) else {
            return Ok(None);
        };
        let ctx = NullContext { type_key: key, path };
        provider
            .null_value(&ctx)
            .map(|v| Some(NullDecision::Substitute(v)))
            .map_err(|source| Error::Provider { type_key: key.clone(), path: path.to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{from_fn, ConstantNull};

    fn funny() -> NullProviderRegistry {
        NullProviderRegistry::new().with(TypeKey::String, ConstantNull(Bound::from("funny")))
    }

    const POLICIES: [SuppressionPolicy; 2] = [SuppressionPolicy::DISABLED, SuppressionPolicy::NEVER_SET_AS_NULL];

    #[test]
    fn provider_wins_over_policy_everywhere() {
        let reg = funny();
        let engine = NullResolutionEngine::new(&reg);
        for policy in POLICIES {
            for kind in TargetKind::ALL {
                let d = engine.resolve_for(&TypeKey::String, kind, policy, ".").unwrap();
                assert_eq!(d, NullDecision::Substitute(Bound::from("funny")), "{kind:?} {policy:?}");
            }
        }
    }

    #[test]
    fn policy_decides_without_provider() {
        let reg = funny();
        let engine = NullResolutionEngine::new(&reg);
        let key = TypeKey::Integer;
        assert_eq!(engine.resolve(&key, SuppressionPolicy::DISABLED, ".").unwrap(), NullDecision::AssignNull);
        assert_eq!(engine.resolve(&key, SuppressionPolicy::NEVER_SET_AS_NULL, ".").unwrap(), NullDecision::Skip);
    }

    #[test]
    fn root_ignores_suppression() {
        let reg = NullProviderRegistry::new();
        let engine = NullResolutionEngine::new(&reg);
        for policy in POLICIES {
            let d = engine.resolve_for(&TypeKey::String, TargetKind::Root, policy, ".").unwrap();
            assert_eq!(d, NullDecision::AssignNull);
        }
    }

    #[test]
    fn repeated_resolution_is_stable() {
        let reg = funny();
        let engine = NullResolutionEngine::new(&reg);
        let policy = SuppressionPolicy::NEVER_SET_AS_NULL;
        for key in [TypeKey::String, TypeKey::Bool] {
            let first = engine.resolve(&key, policy, ".").unwrap();
            for _ in 0..8 {
                assert_eq!(engine.resolve(&key, policy, ".").unwrap(), first);
            }
        }
    }

    #[test]
    fn provider_failure_propagates() {
        let reg = NullProviderRegistry::new().with(TypeKey::String, from_fn(|_| Err("no substitute today".into())));
        let engine = NullResolutionEngine::new(&reg);
        let err = engine.resolve(&TypeKey::String, SuppressionPolicy::DISABLED, ".name").unwrap_err();
        assert!(err.is_provider_failure());
        assert!(err.to_string().contains(".name"));
        assert!(err.to_string().contains("no substitute today"));
    }

    #[test]
    fn apply_sees_prior_decisions() {
        let reg = NullProviderRegistry::new();
        let engine = NullResolutionEngine::new(&reg);
        let mut map = indexmap::IndexMap::new();
        map.insert("a".to_string(), Bound::from("x"));
        let applied = engine.resolve_and_apply(
            &TypeKey::String,
            SuppressionPolicy::NEVER_SET_AS_NULL,
            ".b",
            AssignmentTarget::MapEntry { map: &mut map, key: "b" },
        ).unwrap();
        assert_eq!(applied, Applied::Untouched);
        assert_eq!(map.len(), 1);
    }
}
