use serde::{Deserialize, Serialize};

/// Whether a JSON `null` may overwrite existing state.
///
/// Captured once per run and passed by value. When enabled, nulls that have
/// no custom provider are dropped for nested targets (fields, map entries,
/// sequence elements, catch-all properties). The root value is unaffected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuppressionPolicy {
    pub suppress_null_assignment: bool,
}

impl SuppressionPolicy {
    pub const DISABLED: Self = Self { suppress_null_assignment: false };
    pub const NEVER_SET_AS_NULL: Self = Self { suppress_null_assignment: true };

    pub fn new(suppress_null_assignment: bool) -> Self {
        Self { suppress_null_assignment }
    }

    pub fn is_enabled(self) -> bool { self.suppress_null_assignment }
}
