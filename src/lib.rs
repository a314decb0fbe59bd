//! Null resolution for JSON data binding.
//!
//! When a document presents `null` at some binding position, this crate
//! decides what gets bound there, if anything:
//!
//! - a custom [`NullProvider`] registered for the position's declared type
//!   always wins;
//! - otherwise, with [`SuppressionPolicy`] enabled, nested positions are left
//!   untouched (map entries and sequence elements are omitted, fields keep
//!   their defaults, catch-all sinks are not invoked);
//! - otherwise a literal null is assigned.
//!
//! A root `null` is never suppressed, since there is no earlier value to keep.
pub mod binder;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod jq_exec;
pub mod path_de;
pub mod policy;
pub mod provider;
pub mod root;
pub mod target;
pub mod types;
pub mod value;

pub use binder::{BindOptions, Binder};
pub use config::{BindSettings, BinderConfig};
pub use engine::{NullDecision, NullResolutionEngine};
pub use error::{Error, Result};
pub use policy::SuppressionPolicy;
pub use provider::{from_fn, ConstantNull, NullContext, NullProvider, NullProviderRegistry};
pub use root::RootValueBinder;
pub use target::{Applied, AssignmentTarget, TargetKind};
pub use types::{FieldDescriptor, ObjectType, Schema, TypeKey};
pub use value::{Bound, Instance};
