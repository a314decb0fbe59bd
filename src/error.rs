//! Crate-wide error type.
//!
//! Null resolution itself never fails; everything here comes from the
//! surrounding binding work (parsing, type checks, configuration) or from a
//! custom null provider that gave up while producing its substitute value.
use crate::types::TypeKey;

/// Boxed failure raised by a [`crate::provider::NullProvider`].
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse JSON input: {0}")]
    Parse(#[from] serde_json::Error),

    /// A custom provider failed; aborts the current document.
    #[error("null provider for `{type_key}` failed at {path}: {source}")]
    Provider {
        type_key: TypeKey,
        path: String,
        #[source]
        source: ProviderError,
    },

    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: TypeKey,
        found: &'static str,
    },

    #[error("unknown object type `{0}`")]
    UnknownType(String),

    #[error("unrecognized property `{property}` for `{type_name}` at {path}")]
    UnknownProperty {
        type_name: String,
        property: String,
        path: String,
    },

    #[error("invalid type key `{0}`")]
    InvalidTypeKey(String),

    #[error("configuration: at JSON path {path} → {message}")]
    Config { path: String, message: String },

    #[error("schema: at JSON path {path} → {message}")]
    Schema { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error came out of a custom null provider.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Error::Provider { .. })
    }

    /// Re-label a path-aware decoding error as coming from a schema document.
    pub(crate) fn into_schema(self) -> Self {
        match self {
            Error::Config { path, message } => Error::Schema { path, message },
            other => other,
        }
    }
}

/// Short name of a JSON value's kind, for mismatch messages.
pub(crate) fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
