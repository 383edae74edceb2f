//! Arena holding the live virtual tree.
//!
//! Invariants:
//! - Ownership is top-down through `ElementData::children` and
//!   `ComponentData::child`; `VNode::parent` is a non-owning back-reference.
//! - A `NodeId` names a slot plus the generation it was allocated in. Freeing
//!   bumps the generation, so stale ids never alias a later node.
//! - `VNode::backend` is assigned once (create or hydration bind) and dropped
//!   with the node.

use crate::component::{Component, MountQueue};
use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::types::{
    ClassSet, ComponentHooks, Element, ElementHooks, EventTable, Key, Namespace, Node, PropMap,
    RefHook, StyleMap,
};
use core_types::{ComponentId, NodeRef};
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

pub struct VNode {
    pub parent: Option<NodeId>,
    pub backend: Option<NodeRef>,
    pub kind: VKind,
}

pub enum VKind {
    Text(String),
    Element(ElementData),
    Component(ComponentData),
}

pub struct ElementData {
    pub tag: Arc<str>,
    pub namespace: Namespace,
    pub key: Option<Key>,
    pub props: PropMap,
    pub classes: ClassSet,
    pub style: StyleMap,
    pub children: Vec<NodeId>,
    pub events: EventTable,
    pub hooks: ElementHooks,
    pub draw: Option<RefHook>,
}

pub struct ComponentData {
    pub key: Option<Key>,
    pub host: Rc<dyn Component>,
    pub event_propagation: bool,
    pub hooks: ComponentHooks,
    /// Set by the mount continuation only.
    pub child: Option<NodeId>,
    pub component_id: Option<ComponentId>,
}

struct Slot {
    generation: u32,
    node: Option<VNode>,
}

pub struct VTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    config: ReconcileConfig,
    pub(crate) mounts: MountQueue,
}

impl VTree {
    pub fn new() -> Self {
        Self::with_config(ReconcileConfig::default())
    }

    pub fn with_config(config: ReconcileConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            config,
            mounts: MountQueue::default(),
        }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Mounts started but not yet resolved.
    pub fn pending_mounts(&self) -> usize {
        self.mounts.pending_len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&VNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut VNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn node(&self, id: NodeId) -> Result<&VNode, ReconcileError> {
        self.get(id).ok_or(ReconcileError::StaleNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut VNode, ReconcileError> {
        self.get_mut(id).ok_or(ReconcileError::StaleNode(id))
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.get(id)?.kind {
            VKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.get_mut(id)?.kind {
            VKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn component(&self, id: NodeId) -> Option<&ComponentData> {
        match &self.get(id)?.kind {
            VKind::Component(component) => Some(component),
            _ => None,
        }
    }

    pub(crate) fn component_mut(&mut self, id: NodeId) -> Option<&mut ComponentData> {
        match &mut self.get_mut(id)?.kind {
            VKind::Component(component) => Some(component),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.kind {
            VKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn key(&self, id: NodeId) -> Option<&Key> {
        match &self.get(id)?.kind {
            VKind::Text(_) => None,
            VKind::Element(element) => element.key.as_ref(),
            VKind::Component(component) => component.key.as_ref(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Element children; empty for text and component nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.element(id) {
            Some(element) => &element.children,
            None => &[],
        }
    }

    /// Backend node that represents `id`, drilling through components.
    pub fn dom_ref(&self, id: NodeId) -> Result<NodeRef, ReconcileError> {
        let mut current = id;
        loop {
            let node = self.node(current)?;
            match &node.kind {
                VKind::Component(component) => match component.child {
                    Some(child) => current = child,
                    None => return Err(ReconcileError::UnmountedComponent(current)),
                },
                _ => return node.backend.ok_or(ReconcileError::MissingBackendRef(current)),
            }
        }
    }

    pub fn try_dom_ref(&self, id: NodeId) -> Option<NodeRef> {
        self.dom_ref(id).ok()
    }

    /// Ingests a description as a detached root.
    pub fn insert(&mut self, node: Node) -> NodeId {
        self.insert_under(node, None)
    }

    pub(crate) fn insert_under(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        match node {
            Node::Text(text) => self.alloc(VNode {
                parent,
                backend: None,
                kind: VKind::Text(text),
            }),
            Node::Element(element) => {
                let Element {
                    tag,
                    namespace,
                    key,
                    props,
                    classes,
                    style,
                    children,
                    events,
                    hooks,
                    draw,
                } = element;
                let id = self.alloc(VNode {
                    parent,
                    backend: None,
                    kind: VKind::Element(ElementData {
                        tag,
                        namespace,
                        key,
                        props,
                        classes,
                        style,
                        children: Vec::new(),
                        events,
                        hooks,
                        draw,
                    }),
                });
                let child_ids: Vec<NodeId> = children
                    .into_iter()
                    .map(|child| self.insert_under(child, Some(id)))
                    .collect();
                if let Some(element) = self.element_mut(id) {
                    element.children = child_ids;
                }
                id
            }
            Node::Component(component) => self.alloc(VNode {
                parent,
                backend: None,
                kind: VKind::Component(ComponentData {
                    key: component.key,
                    host: component.host,
                    event_propagation: component.event_propagation,
                    hooks: component.hooks,
                    child: None,
                    component_id: None,
                }),
            }),
        }
    }

    fn alloc(&mut self, node: VNode) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Frees a single slot. Children are left to the caller.
    pub(crate) fn free(&mut self, id: NodeId) -> Option<VNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        self.mounts.forget(id);
        Some(node)
    }

    /// Frees `id` and everything it owns.
    pub fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.free(current) else {
                continue;
            };
            match node.kind {
                VKind::Text(_) => {}
                VKind::Element(element) => stack.extend(element.children),
                VKind::Component(component) => stack.extend(component.child),
            }
        }
    }

    /// Frees `id` and everything it owns without touching the backend.
    /// Components still mounted in it are unmounted from their hosts.
    pub(crate) fn discard(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.free(current) else {
                continue;
            };
            match node.kind {
                VKind::Text(_) => {}
                VKind::Element(element) => stack.extend(element.children),
                VKind::Component(component) => {
                    if let Some(component_id) = component.component_id {
                        component.host.unmount(component_id);
                    }
                    stack.extend(component.child);
                }
            }
        }
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(node) = self.get_mut(id) {
            node.parent = parent;
        }
    }

    /// Merges runs of adjacent text children of `id` into their first node.
    pub(crate) fn coalesce_text_children(&mut self, id: NodeId) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let children = std::mem::take(&mut element.children);
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            let merge_into = kept.last().copied().filter(|last| {
                self.text(*last).is_some() && self.text(child).is_some()
            });
            match merge_into {
                Some(last) => {
                    let text = self.text(child).unwrap_or_default().to_string();
                    if let Some(VNode {
                        kind: VKind::Text(existing),
                        ..
                    }) = self.get_mut(last)
                    {
                        existing.push_str(&text);
                    }
                    self.free(child);
                }
                None => kept.push(child),
            }
        }
        if let Some(element) = self.element_mut(id) {
            element.children = kept;
        }
    }
}

impl Default for VTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Element;

    #[test]
    fn insert_wires_parent_links() {
        let mut tree = VTree::new();
        let root = tree.insert(
            Element::new("ul")
                .child(Element::new("li").key("a").text("a"))
                .child(Element::new("li").key("b").text("b"))
                .into(),
        );
        assert_eq!(tree.len(), 5);
        let children = tree.children(root).to_vec();
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(tree.parent(*child), Some(root));
        }
        assert_eq!(tree.key(children[1]), Some(&Key::from("b")));
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn freed_ids_go_stale_and_slots_are_reused() {
        let mut tree = VTree::new();
        let first = tree.insert(Node::text("x"));
        tree.free_subtree(first);
        assert!(!tree.contains(first));
        assert!(tree.is_empty());
        let second = tree.insert(Node::text("y"));
        assert_ne!(first, second);
        assert!(tree.get(first).is_none());
        assert_eq!(tree.text(second), Some("y"));
        assert!(matches!(tree.node(first), Err(ReconcileError::StaleNode(_))));
    }

    #[test]
    fn free_subtree_releases_descendants() {
        let mut tree = VTree::new();
        let root = tree.insert(
            Element::new("div")
                .child(Element::new("p").text("one"))
                .text("two")
                .into(),
        );
        assert_eq!(tree.len(), 4);
        tree.free_subtree(root);
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn coalesce_merges_adjacent_text_only() {
        let mut tree = VTree::new();
        let root = tree.insert(
            Element::new("p")
                .text("a")
                .text("b")
                .child(Element::new("br"))
                .text("c")
                .text("d")
                .into(),
        );
        tree.coalesce_text_children(root);
        let children = tree.children(root).to_vec();
        assert_eq!(children.len(), 3);
        assert_eq!(tree.text(children[0]), Some("ab"));
        assert_eq!(tree.text(children[2]), Some("cd"));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn dom_ref_requires_backend() {
        let mut tree = VTree::new();
        let id = tree.insert(Node::text("x"));
        assert!(matches!(
            tree.dom_ref(id),
            Err(ReconcileError::MissingBackendRef(_))
        ));
        tree.node_mut(id).expect("live node").backend = Some(NodeRef(9));
        assert_eq!(tree.dom_ref(id).ok(), Some(NodeRef(9)));
    }
}
