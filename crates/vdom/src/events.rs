//! Event delegation at the mount root and synthetic propagation.
//!
//! One backend listener is registered per distinct event name. When it fires,
//! the backend path from the mount root to the target is replayed against the
//! virtual tree: capture handlers run on every element along the path, then
//! the target's bubble handler, then bubble handlers of virtual ancestors
//! through `parent` links. Components are not backend nodes but still take
//! part in bubbling: one with `event_propagation == false` stops it.

use crate::adapter::{Delivery, Event, EventAdapter, Listener};
use crate::error::ReconcileError;
use crate::tree::{NodeId, VKind, VTree};
use crate::types::Handler;
use core_types::NodeRef;
use std::rc::{Rc, Weak};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSpec {
    pub name: Arc<str>,
    pub capture: bool,
}

impl EventSpec {
    pub fn bubble(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            capture: false,
        }
    }

    pub fn capture(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            capture: true,
        }
    }
}

pub type TreeContinuation = Box<dyn FnOnce(&VTree, Option<NodeId>)>;

/// Supplies the current tree to a dispatch.
///
/// Implementations may run the continuation later, e.g. once a render pass
/// that holds the tree has finished.
pub trait TreeSource {
    fn current_tree(&self, continuation: TreeContinuation);
}

struct Registration {
    name: Arc<str>,
    capture: bool,
    listener: Listener,
}

/// Listeners attached by [`delegate`]; hand back to [`undelegate`] to detach.
pub struct Delegation {
    mount: NodeRef,
    registrations: Vec<Registration>,
}

impl Delegation {
    pub fn mount(&self) -> NodeRef {
        self.mount
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|r| &*r.name)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl std::fmt::Debug for Delegation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegation")
            .field("mount", &self.mount)
            .field("events", &self.event_names().collect::<Vec<_>>())
            .finish()
    }
}

pub fn delegate<E: EventAdapter + 'static>(
    mount: NodeRef,
    specs: &[EventSpec],
    source: Rc<dyn TreeSource>,
    debug: bool,
    adapter: &Rc<E>,
) -> Delegation {
    let mut registrations: Vec<Registration> = Vec::new();
    for spec in specs {
        if registrations.iter().any(|r| r.name == spec.name) {
            continue;
        }
        let listener = listener(mount, Rc::clone(&source), debug, Rc::downgrade(adapter));
        adapter.add_event_listener(mount, &spec.name, Rc::clone(&listener), spec.capture);
        registrations.push(Registration {
            name: spec.name.clone(),
            capture: spec.capture,
            listener,
        });
    }
    log::debug!(
        target: "vdom.events",
        "delegated {} event(s) at {mount:?}",
        registrations.len()
    );
    Delegation {
        mount,
        registrations,
    }
}

pub fn undelegate<E: EventAdapter + ?Sized>(delegation: Delegation, adapter: &E) {
    for registration in &delegation.registrations {
        adapter.remove_event_listener(
            delegation.mount,
            &registration.name,
            &registration.listener,
            registration.capture,
        );
    }
}

fn listener<E: EventAdapter + 'static>(
    mount: NodeRef,
    source: Rc<dyn TreeSource>,
    debug: bool,
    adapter: Weak<E>,
) -> Listener {
    Rc::new(move |delivery: &Delivery| {
        let events = delivery.events().to_vec();
        let adapter = adapter.clone();
        source.current_tree(Box::new(move |tree: &VTree, root: Option<NodeId>| {
            let Some(adapter) = adapter.upgrade() else {
                return;
            };
            for event in &events {
                if let Err(err) = dispatch(tree, root, mount, event, &*adapter, debug) {
                    log::error!(
                        target: "vdom.events",
                        "dispatch of \"{}\" failed: {err}",
                        event.name
                    );
                }
            }
        }));
    })
}

/// Routes one backend event through the virtual tree rooted at `root`.
///
/// Returns whether any handler ran.
pub fn dispatch<E: EventAdapter + ?Sized>(
    tree: &VTree,
    root: Option<NodeId>,
    mount: NodeRef,
    event: &Event,
    adapter: &E,
    debug: bool,
) -> Result<bool, ReconcileError> {
    let mut run = Dispatch {
        tree,
        event,
        adapter,
        capture_stopped: false,
        handled: false,
    };
    if let Some(target) = adapter.get_target(event)
        && let Some(root) = root
    {
        let path = target_path(adapter, mount, target);
        if !path.is_empty() {
            run.descend(root, &path)?;
        }
    }
    if !run.handled && debug {
        log::warn!(
            target: "vdom.events",
            "event \"{}\" did not find an event handler to dispatch on",
            event.name
        );
    }
    Ok(run.handled)
}

/// Backend nodes from just below `mount` down to `target`; empty when
/// `target` is not inside `mount`.
fn target_path<E: EventAdapter + ?Sized>(
    adapter: &E,
    mount: NodeRef,
    target: NodeRef,
) -> Vec<NodeRef> {
    let mut path = Vec::new();
    let mut current = target;
    while !adapter.is_equal(current, mount) {
        path.push(current);
        match adapter.parent_node(current) {
            Some(parent) => current = parent,
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

struct Dispatch<'a, E: ?Sized> {
    tree: &'a VTree,
    event: &'a Event,
    adapter: &'a E,
    capture_stopped: bool,
    handled: bool,
}

impl<E: EventAdapter + ?Sized> Dispatch<'_, E> {
    fn descend(&mut self, id: NodeId, path: &[NodeRef]) -> Result<(), ReconcileError> {
        let (tree, adapter) = (self.tree, self.adapter);
        let node = tree.node(id)?;
        match &node.kind {
            VKind::Component(component) => match component.child {
                Some(child) => self.descend(child, path),
                None if path.len() > 1 => Err(ReconcileError::UnmountedComponent(id)),
                None => Ok(()),
            },
            VKind::Text(_) => Ok(()),
            VKind::Element(el) => {
                let backend = node.backend.ok_or(ReconcileError::MissingBackendRef(id))?;
                if !adapter.is_equal(backend, path[0]) {
                    return Ok(());
                }
                let event = self.event;
                let name: &str = &event.name;
                if path.len() > 1 {
                    if let Some(handler) = el.events.captures.get(name) {
                        self.capture(handler, backend);
                    }
                    let next = path[1];
                    let matched = el.children.iter().copied().find(|&child| {
                        tree.try_dom_ref(child)
                            .is_some_and(|r| adapter.is_equal(r, next))
                    });
                    return match matched {
                        Some(child) => self.descend(child, &path[1..]),
                        None => Ok(()),
                    };
                }
                if self.capture_stopped {
                    return Ok(());
                }
                if let Some(handler) = el.events.captures.get(name) {
                    self.capture(handler, backend);
                }
                if self.capture_stopped {
                    return Ok(());
                }
                if let Some(handler) = el.events.bubbles.get(name) {
                    self.bubble(handler, backend);
                    if handler.options.stop_propagation {
                        return Ok(());
                    }
                }
                self.propagate(node.parent)
            }
        }
    }

    fn capture(&mut self, handler: &Handler, backend: NodeRef) {
        if handler.options.prevent_default {
            self.adapter.prevent_default(self.event);
        }
        if !self.capture_stopped {
            handler.run(self.event, backend);
            self.handled = true;
        }
        if handler.options.stop_propagation {
            self.capture_stopped = true;
        }
    }

    fn bubble(&mut self, handler: &Handler, backend: NodeRef) {
        if handler.options.prevent_default {
            self.adapter.prevent_default(self.event);
        }
        handler.run(self.event, backend);
        self.handled = true;
    }

    /// Replays bubble handlers up the virtual ancestors starting at `from`.
    fn propagate(&mut self, from: Option<NodeId>) -> Result<(), ReconcileError> {
        let (tree, event) = (self.tree, self.event);
        let name: &str = &event.name;
        let mut current = from;
        while let Some(id) = current {
            let node = tree.node(id)?;
            match &node.kind {
                VKind::Text(_) => {}
                VKind::Element(el) => {
                    if let Some(handler) = el.events.bubbles.get(name) {
                        let backend = node.backend.ok_or(ReconcileError::MissingBackendRef(id))?;
                        self.bubble(handler, backend);
                        if handler.options.stop_propagation {
                            return Ok(());
                        }
                    }
                }
                VKind::Component(component) => {
                    if !component.event_propagation {
                        return Ok(());
                    }
                }
            }
            current = node.parent;
        }
        Ok(())
    }
}
