//! The places a decoded value can land, and what each does with a decision.
use indexmap::IndexMap;
use log::trace;

use crate::engine::NullDecision;
use crate::value::{Bound, Instance};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Field,
    MapEntry,
    SequenceElement,
    CatchAll,
    Root,
}

impl TargetKind {
    pub const ALL: [TargetKind; 5] = [
        TargetKind::Field,
        TargetKind::MapEntry,
        TargetKind::SequenceElement,
        TargetKind::CatchAll,
        TargetKind::Root,
    ];

    /// Whether "skip" has a referent: some existing state to leave alone.
    pub fn can_skip(self) -> bool { !matches!(self, TargetKind::Root) }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Field => "field",
            TargetKind::MapEntry => "map-entry",
            TargetKind::SequenceElement => "sequence-element",
            TargetKind::CatchAll => "catch-all",
            TargetKind::Root => "root",
        }
    }
}

/// A single binding position. Borrows the container it mutates for exactly
/// one resolution; the container stays owned by the run that fills it.
#[derive(Debug)]
pub enum AssignmentTarget<'a> {
    Field { owner: &'a mut Instance, field: &'a str, has_default: bool },
    MapEntry { map: &'a mut IndexMap<String, Bound>, key: &'a str },
    /// Append semantics.
    SequenceElement { seq: &'a mut Vec<Bound> },
    /// Undeclared property routed to the owner's catch-all sink.
    CatchAll { owner: &'a mut Instance, key: &'a str },
    /// The whole result of a single-value parse.
    Root { result: &'a mut Bound },
}

/// Whether applying a decision touched the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Written,
    Untouched,
}

impl<'a> AssignmentTarget<'a> {
    pub fn kind(&self) -> TargetKind {
        match self {
            AssignmentTarget::Field { .. } => TargetKind::Field,
            AssignmentTarget::MapEntry { .. } => TargetKind::MapEntry,
            AssignmentTarget::SequenceElement { .. } => TargetKind::SequenceElement,
            AssignmentTarget::CatchAll { .. } => TargetKind::CatchAll,
            AssignmentTarget::Root { .. } => TargetKind::Root,
        }
    }

    /// Carry out `decision`. `Skip` leaves the container exactly as if the
    /// property or element had been absent from the input.
    pub fn apply(self, decision: NullDecision) -> Applied {
        match decision {
            NullDecision::Substitute(v) => self.put(v),
            NullDecision::AssignNull => self.put(Bound::Null),
            NullDecision::Skip => self.skip(),
        }
    }

    /// Write a value into the position.
    pub fn put(self, value: Bound) -> Applied {
        match self {
            AssignmentTarget::Field { owner, field, .. } => owner.set(field, value),
            AssignmentTarget::MapEntry { map, key } => {
                map.insert(key.to_string(), value);
            }
            AssignmentTarget::SequenceElement { seq } => seq.push(value),
            AssignmentTarget::CatchAll { owner, key } => owner.accept_any(key, value),
            AssignmentTarget::Root { result } => *result = value,
        }
        Applied::Written
    }

    fn skip(self) -> Applied {
        match self {
            AssignmentTarget::Field { owner, field, has_default } => {
                trace!(
                    "null skipped for field `{}.{field}` (default kept: {has_default})",
                    owner.type_name
                );
                Applied::Untouched
            }
            AssignmentTarget::MapEntry { key, .. } => {
                trace!("null skipped for map key `{key}`");
                Applied::Untouched
            }
            AssignmentTarget::SequenceElement { seq } => {
                trace!("null skipped at sequence slot {}", seq.len());
                Applied::Untouched
            }
            AssignmentTarget::CatchAll { key, .. } => {
                trace!("null skipped for catch-all property `{key}`");
                Applied::Untouched
            }
            // The engine normalizes Skip away for roots; nothing to preserve here.
            AssignmentTarget::Root { result } => {
                *result = Bound::Null;
                Applied::Written
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decisions() -> [NullDecision; 3] {
        [NullDecision::Substitute(Bound::from("v")), NullDecision::AssignNull, NullDecision::Skip]
    }

    #[test]
    fn field_table() {
        let expected = [Bound::from("v"), Bound::Null, Bound::from("foo")];
        for (d, want) in decisions().into_iter().zip(expected) {
            let mut inst = Instance::new("T");
            inst.set("s", Bound::from("foo"));
            AssignmentTarget::Field { owner: &mut inst, field: "s", has_default: true }.apply(d);
            assert_eq!(inst.get("s"), Some(&want));
        }
    }

    #[test]
    fn map_entry_table() {
        let expected = [Some(Bound::from("v")), Some(Bound::Null), None];
        for (d, want) in decisions().into_iter().zip(expected) {
            let mut map = IndexMap::new();
            AssignmentTarget::MapEntry { map: &mut map, key: "k" }.apply(d);
            assert_eq!(map.get("k").cloned(), want);
            assert_eq!(map.len(), usize::from(want.is_some()));
        }
    }

    #[test]
    fn sequence_table() {
        let expected = [vec![Bound::from("v")], vec![Bound::Null], vec![]];
        for (d, want) in decisions().into_iter().zip(expected) {
            let mut seq = Vec::new();
            AssignmentTarget::SequenceElement { seq: &mut seq }.apply(d);
            assert_eq!(seq, want);
        }
    }

    #[test]
    fn catch_all_table() {
        let expected = [Some(Bound::from("v")), Some(Bound::Null), None];
        for (d, want) in decisions().into_iter().zip(expected) {
            let mut inst = Instance::new("AnySetter");
            let applied = AssignmentTarget::CatchAll { owner: &mut inst, key: "p" }.apply(d);
            assert_eq!(inst.any().get("p").cloned(), want);
            assert_eq!(applied == Applied::Written, inst.any().contains_key("p"));
        }
    }

    #[test]
    fn root_never_skips() {
        let mut result = Bound::from("stale");
        let applied = AssignmentTarget::Root { result: &mut result }.apply(NullDecision::Skip);
        assert_eq!(applied, Applied::Written);
        assert_eq!(result, Bound::Null);
        assert!(!TargetKind::Root.can_skip());
    }
}
