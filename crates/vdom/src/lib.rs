pub mod adapter;
pub mod component;
pub mod config;
pub mod dom_diff;
pub mod events;
pub mod hydrate;
pub mod integrity;
pub mod mount;
#[cfg(any(test, feature = "snapshot"))]
pub mod snapshot;
pub mod traverse;
pub mod tree;
pub mod types;

mod error;
mod keyed;

pub use crate::adapter::{
    Delivery, Event, EventAdapter, InspectionAdapter, Listener, MutationAdapter, NodeType,
};
pub use crate::component::{Component, MountResolver};
pub use crate::config::ReconcileConfig;
pub use crate::dom_diff::{diff, resolve_mounts};
pub use crate::error::{AdapterError, ReconcileError};
pub use crate::events::{
    Delegation, EventSpec, TreeContinuation, TreeSource, delegate, dispatch, undelegate,
};
pub use crate::hydrate::hydrate;
pub use crate::integrity::{IntegrityOptions, integrity_check};
pub use crate::mount::Mount;
pub use crate::tree::{ComponentData, ElementData, NodeId, VKind, VNode, VTree};
pub use crate::types::{
    ComponentNode, Element, Handler, HandlerOptions, Key, Namespace, Node, Value,
};
pub use core_types::{ComponentId, NodeRef};
