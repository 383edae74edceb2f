//! Component host contract and the mount continuation queue.
//!
//! A component is mounted by handing its host a one-shot [`MountResolver`].
//! The host resolves it with the component's tree either inside `mount` or at
//! any later point. Resolutions are queued and applied by the reconciler
//! right after each `mount` call, at the end of every `diff`, and from
//! [`resolve_mounts`](crate::resolve_mounts).

use crate::tree::NodeId;
use crate::types::Node;
use core_types::{ComponentId, NodeRef};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

pub trait Component {
    /// Starts mounting under the backend node `parent`.
    fn mount(&self, parent: NodeRef, resolver: MountResolver);
    fn unmount(&self, id: ComponentId);
}

pub(crate) struct Resolution {
    pub(crate) component: NodeId,
    pub(crate) id: ComponentId,
    pub(crate) child: Node,
}

type Queue = Rc<RefCell<VecDeque<Resolution>>>;

/// One-shot continuation that completes a component mount.
pub struct MountResolver {
    component: NodeId,
    queue: Weak<RefCell<VecDeque<Resolution>>>,
}

impl MountResolver {
    /// The component node being mounted.
    pub fn component(&self) -> NodeId {
        self.component
    }

    pub fn resolve(self, id: ComponentId, child: impl Into<Node>) {
        let Some(queue) = self.queue.upgrade() else {
            log::warn!(
                target: "vdom.component",
                "mount of {:?} resolved after its tree was dropped",
                self.component
            );
            return;
        };
        queue.borrow_mut().push_back(Resolution {
            component: self.component,
            id,
            child: child.into(),
        });
    }
}

impl fmt::Debug for MountResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountResolver")
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

/// Where a resolved component tree goes in its backend parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Append,
    /// `None` appends.
    InsertBefore(Option<NodeRef>),
    Replace(NodeRef),
    /// Bound to existing backend nodes, nothing is inserted.
    Hydrate,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingMount {
    pub(crate) parent: NodeRef,
    pub(crate) placement: Placement,
}

#[derive(Default)]
pub(crate) struct MountQueue {
    queue: Queue,
    pending: HashMap<NodeId, PendingMount>,
    /// Unresolved components adopted by a same-key node during a diff.
    moved: HashMap<NodeId, NodeId>,
}

impl MountQueue {
    pub(crate) fn resolver(&self, component: NodeId) -> MountResolver {
        MountResolver {
            component,
            queue: Rc::downgrade(&self.queue),
        }
    }

    pub(crate) fn expect(&mut self, component: NodeId, pending: PendingMount) {
        self.pending.insert(component, pending);
    }

    pub(crate) fn pending(&self, component: NodeId) -> Option<PendingMount> {
        self.pending.get(&component).copied()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn pop(&mut self) -> Option<Resolution> {
        self.queue.borrow_mut().pop_front()
    }

    /// Removes the queued resolution for `component`, leaving others in order.
    pub(crate) fn take_resolution(&mut self, component: NodeId) -> Option<Resolution> {
        let mut queue = self.queue.borrow_mut();
        let pos = queue.iter().position(|r| r.component == component)?;
        queue.remove(pos)
    }

    /// Pending mount for `component`, following adoptions by later nodes.
    pub(crate) fn take_pending(&mut self, component: NodeId) -> Option<(NodeId, PendingMount)> {
        let mut current = component;
        while let Some(next) = self.moved.remove(&current) {
            current = next;
        }
        self.pending
            .remove(&current)
            .map(|pending| (current, pending))
    }

    pub(crate) fn transfer(&mut self, from: NodeId, to: NodeId) {
        if let Some(pending) = self.pending.remove(&from) {
            self.pending.insert(to, pending);
            self.moved.insert(from, to);
        }
    }

    /// Drops the pending mount of `component` and the adoption chain ending
    /// at it. Nodes that handed their mount on keep their chain entries.
    pub(crate) fn forget(&mut self, component: NodeId) {
        if self.pending.remove(&component).is_none() {
            return;
        }
        let mut gone = vec![component];
        while let Some(target) = gone.pop() {
            let sources: Vec<NodeId> = self
                .moved
                .iter()
                .filter(|&(_, to)| *to == target)
                .map(|(&from, _)| from)
                .collect();
            for from in sources {
                self.moved.remove(&from);
                gone.push(from);
            }
        }
    }
}
