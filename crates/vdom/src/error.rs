use crate::tree::NodeId;

/// Failure reported by a backend adapter call.
///
/// The reconciler does not interpret these; they are propagated to the caller
/// of the entry point unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterError {
    pub op: &'static str,
    pub detail: String,
}

impl AdapterError {
    pub fn new(op: &'static str, detail: impl Into<String>) -> Self {
        Self {
            op,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend {} failed: {}", self.op, self.detail)
    }
}

impl std::error::Error for AdapterError {}

#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileError {
    /// A backend adapter call failed.
    Adapter(AdapterError),
    /// A component without a resolved child was used where a backend node is required.
    UnmountedComponent(NodeId),
    /// The node id does not name a live node in the tree.
    StaleNode(NodeId),
    /// A live text or element node has no backend reference.
    MissingBackendRef(NodeId),
    /// The tree is borrowed by a pass that has not finished yet.
    TreeBusy,
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::Adapter(err) => write!(f, "{err}"),
            ReconcileError::UnmountedComponent(id) => {
                write!(f, "component {id:?} has no mounted child")
            }
            ReconcileError::StaleNode(id) => write!(f, "node {id:?} is not live"),
            ReconcileError::MissingBackendRef(id) => {
                write!(f, "node {id:?} has no backend reference")
            }
            ReconcileError::TreeBusy => write!(f, "tree is in use by another pass"),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Adapter(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AdapterError> for ReconcileError {
    fn from(err: AdapterError) -> Self {
        ReconcileError::Adapter(err)
    }
}
