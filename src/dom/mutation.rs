//! Mutation records: the change log a [`Dom`](super::Dom) accumulates until drained.

use super::node::NodeId;

/// One structural or attribute change to the tree.
///
/// Records are appended regardless of whether the target is connected to
/// any particular container; consumers filter by containment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were added to or removed from `target`.
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// An attribute of `target` was set or removed.
    Attributes {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },
}

impl MutationRecord {
    /// The node the change happened on.
    pub fn target(&self) -> NodeId {
        match self {
            Self::ChildList { target, .. } | Self::Attributes { target, .. } => *target,
        }
    }

    /// Whether this record removed any nodes.
    pub fn has_removals(&self) -> bool {
        matches!(self, Self::ChildList { removed, .. } if !removed.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn target_and_removals() {
        let mut keys: SlotMap<NodeId, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());

        let added = MutationRecord::ChildList {
            target: a,
            added: vec![b],
            removed: vec![],
        };
        assert_eq!(added.target(), a);
        assert!(!added.has_removals());

        let removed = MutationRecord::ChildList {
            target: a,
            added: vec![],
            removed: vec![b],
        };
        assert!(removed.has_removals());

        let attr = MutationRecord::Attributes {
            target: b,
            name: "bind-x".into(),
            old_value: None,
        };
        assert_eq!(attr.target(), b);
        assert!(!attr.has_removals());
    }
}
