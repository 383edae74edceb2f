//! Handle types shared by the reconciler and its backends.

/// Opaque handle to a node owned by a rendering backend.
///
/// The reconciler never interprets the value; backends hand them out and
/// accept them back. `NodeRef::INVALID` is never issued by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub u32);

impl NodeRef {
    /// Reserved sentinel for "unassigned/invalid" handles.
    pub const INVALID: NodeRef = NodeRef(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Identifier a component host assigns when it resolves a mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);
