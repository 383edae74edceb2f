//! Diff/patch engine.
//!
//! Contract:
//! - `diff(old, new)` mutates the arena so `new` becomes the live tree: backend
//!   refs are adopted where nodes are reused and assigned where nodes are created.
//! - Consumed `old` nodes are freed as they are visited.
//! - Dispatch order: create, destroy, text update, same-key component adopt,
//!   same tag/namespace/key element patch, otherwise replace.
//! - Element patch order: props, classes, inline style, children, then canvas draw.
//! - Destroy runs before-hooks pre-order, removes the subtree root once, then
//!   runs destroy/unmount hooks pre-order.
//! - `flush` is called once at the end of each top-level pass.

use crate::adapter::MutationAdapter;
use crate::component::{PendingMount, Placement, Resolution};
use crate::config::ReconcileConfig;
use crate::error::{AdapterError, ReconcileError};
use crate::keyed;
use crate::tree::{NodeId, VKind, VTree};
use crate::types::{ClassSet, Namespace, PropMap, StyleMap, XLINK_NAMESPACE};
use core_types::NodeRef;

/// Reconciles `old` into `new` under the backend node `parent`.
pub fn diff<A: MutationAdapter + ?Sized>(
    tree: &mut VTree,
    old: Option<NodeId>,
    new: Option<NodeId>,
    parent: NodeRef,
    adapter: &mut A,
) -> Result<(), ReconcileError> {
    let mut patcher = Patcher { tree, adapter };
    patcher.diff(old, new, parent)?;
    patcher.resolve_pending()?;
    patcher.adapter.flush()?;
    Ok(())
}

/// Applies component mounts resolved after their `diff` pass returned.
///
/// Returns the number of mounts applied. Flushes only when something changed.
pub fn resolve_mounts<A: MutationAdapter + ?Sized>(
    tree: &mut VTree,
    adapter: &mut A,
) -> Result<usize, ReconcileError> {
    let mut patcher = Patcher { tree, adapter };
    let applied = patcher.resolve_pending()?;
    if applied > 0 {
        patcher.adapter.flush()?;
    }
    Ok(applied)
}

enum Shape {
    Text,
    SameComponent,
    SameElement,
    Different,
}

enum Kind {
    Text,
    Element,
    Component,
}

pub(crate) struct Patcher<'a, A: ?Sized> {
    pub(crate) tree: &'a mut VTree,
    pub(crate) adapter: &'a mut A,
}

impl<A: MutationAdapter + ?Sized> Patcher<'_, A> {
    pub(crate) fn diff(
        &mut self,
        old: Option<NodeId>,
        new: Option<NodeId>,
        parent: NodeRef,
    ) -> Result<(), ReconcileError> {
        match (old, new) {
            (None, None) => Ok(()),
            (None, Some(new)) => self.create(new, parent, Placement::Append),
            (Some(old), None) => self.destroy(old, parent),
            (Some(old), Some(new)) => match self.shape(old, new)? {
                Shape::Text => self.patch_text(old, new),
                Shape::SameComponent => self.adopt_component(old, new),
                Shape::SameElement => self.patch_element(old, new),
                Shape::Different => self.replace(old, new, parent),
            },
        }
    }

    fn shape(&self, old: NodeId, new: NodeId) -> Result<Shape, ReconcileError> {
        let old_node = self.tree.node(old)?;
        let new_node = self.tree.node(new)?;
        Ok(match (&old_node.kind, &new_node.kind) {
            (VKind::Text(_), VKind::Text(_)) => Shape::Text,
            (VKind::Component(a), VKind::Component(b)) if a.key == b.key => Shape::SameComponent,
            (VKind::Element(a), VKind::Element(b))
                if a.tag == b.tag && a.namespace == b.namespace && a.key == b.key =>
            {
                Shape::SameElement
            }
            _ => Shape::Different,
        })
    }

    fn patch_text(&mut self, old: NodeId, new: NodeId) -> Result<(), ReconcileError> {
        let backend = self
            .tree
            .node(old)?
            .backend
            .ok_or(ReconcileError::MissingBackendRef(old))?;
        let old_text = self.tree.text(old).unwrap_or_default();
        let new_text = self.tree.text(new).unwrap_or_default();
        if old_text != new_text {
            log::trace!(target: "vdom.diff", "set text {backend:?}");
            self.adapter.set_text_content(backend, new_text)?;
        }
        self.tree.node_mut(new)?.backend = Some(backend);
        self.tree.free(old);
        Ok(())
    }

    /// Same identity: the new node takes over the mounted subtree as is.
    fn adopt_component(&mut self, old: NodeId, new: NodeId) -> Result<(), ReconcileError> {
        let (child, component_id) = match self.tree.component(old) {
            Some(component) => (component.child, component.component_id),
            None => return Err(ReconcileError::StaleNode(old)),
        };
        let component = self
            .tree
            .component_mut(new)
            .ok_or(ReconcileError::StaleNode(new))?;
        component.child = child;
        component.component_id = component_id;
        if let Some(child) = child {
            self.tree.set_parent(child, Some(new));
        }
        self.tree.mounts.transfer(old, new);
        self.tree.free(old);
        Ok(())
    }

    fn patch_element(&mut self, old: NodeId, new: NodeId) -> Result<(), ReconcileError> {
        let backend = self
            .tree
            .node(old)?
            .backend
            .ok_or(ReconcileError::MissingBackendRef(old))?;
        self.tree.node_mut(new)?.backend = Some(backend);
        self.diff_attrs(Some(old), new, backend)?;
        self.tree.free(old);
        Ok(())
    }

    /// Props, classes, style, children, then canvas draw. `old == None` populates.
    fn diff_attrs(
        &mut self,
        old: Option<NodeId>,
        new: NodeId,
        backend: NodeRef,
    ) -> Result<(), ReconcileError> {
        let empty_props = PropMap::new();
        let empty_classes = ClassSet::new();
        let empty_style = StyleMap::new();
        {
            let new_el = self
                .tree
                .element(new)
                .ok_or(ReconcileError::StaleNode(new))?;
            let old_el = match old {
                Some(old) => Some(self.tree.element(old).ok_or(ReconcileError::StaleNode(old))?),
                None => None,
            };
            let svg = new_el.namespace == Namespace::Svg;
            diff_props(
                &mut *self.adapter,
                self.tree.config(),
                old_el.map_or(&empty_props, |el| &el.props),
                &new_el.props,
                backend,
                svg,
            )?;
            diff_classes(
                &mut *self.adapter,
                old_el.map_or(&empty_classes, |el| &el.classes),
                &new_el.classes,
                backend,
            )?;
            diff_style(
                &mut *self.adapter,
                old_el.map_or(&empty_style, |el| &el.style),
                &new_el.style,
                backend,
            )?;
        }

        let old_children = match old.and_then(|old| self.tree.element_mut(old)) {
            Some(old_el) => std::mem::take(&mut old_el.children),
            None => Vec::new(),
        };
        let new_children = self.tree.children(new).to_vec();
        self.diff_children(old_children, &new_children, backend)?;

        if let Some(el) = self.tree.element(new)
            && &*el.tag == "canvas"
            && let Some(draw) = el.draw.clone()
        {
            draw(backend);
        }
        Ok(())
    }

    fn diff_children(
        &mut self,
        old: Vec<NodeId>,
        new: &[NodeId],
        parent: NodeRef,
    ) -> Result<(), ReconcileError> {
        if keyed::can_sync(self.tree, &old, new) {
            return keyed::sync_children(self, old, new, parent);
        }
        for i in 0..old.len().max(new.len()) {
            self.diff(old.get(i).copied(), new.get(i).copied(), parent)?;
        }
        Ok(())
    }

    pub(crate) fn create(
        &mut self,
        id: NodeId,
        parent: NodeRef,
        placement: Placement,
    ) -> Result<(), ReconcileError> {
        let kind = match &self.tree.node(id)?.kind {
            VKind::Text(_) => Kind::Text,
            VKind::Element(_) => Kind::Element,
            VKind::Component(_) => Kind::Component,
        };
        match kind {
            Kind::Text => {
                let backend = {
                    let text = self.tree.text(id).unwrap_or_default();
                    self.adapter.create_text_node(text)?
                };
                self.tree.node_mut(id)?.backend = Some(backend);
                self.place(parent, backend, placement)?;
            }
            Kind::Element => self.create_element(id, parent, placement)?,
            Kind::Component => self.mount_component(id, parent, placement)?,
        }
        Ok(())
    }

    fn create_element(
        &mut self,
        id: NodeId,
        parent: NodeRef,
        placement: Placement,
    ) -> Result<(), ReconcileError> {
        let (before_create, tag, namespace) = {
            let el = self.tree.element(id).ok_or(ReconcileError::StaleNode(id))?;
            (el.hooks.before_create.clone(), el.tag.clone(), el.namespace)
        };
        if let Some(hook) = before_create {
            hook();
        }
        let backend = match namespace.uri() {
            Some(uri) => self.adapter.create_element_ns(uri, &tag)?,
            None => self.adapter.create_element(&tag)?,
        };
        log::trace!(target: "vdom.diff", "create <{tag}> as {backend:?}");
        self.tree.node_mut(id)?.backend = Some(backend);
        self.diff_attrs(None, id, backend)?;
        let on_create = self
            .tree
            .element(id)
            .and_then(|el| el.hooks.on_create.clone());
        if let Some(hook) = on_create {
            hook(backend);
        }
        self.place(parent, backend, placement)?;
        Ok(())
    }

    fn mount_component(
        &mut self,
        id: NodeId,
        parent: NodeRef,
        placement: Placement,
    ) -> Result<(), ReconcileError> {
        let (host, before_mount) = {
            let component = self
                .tree
                .component(id)
                .ok_or(ReconcileError::StaleNode(id))?;
            (component.host.clone(), component.hooks.before_mount.clone())
        };
        if let Some(hook) = before_mount {
            hook();
        }
        self.tree
            .mounts
            .expect(id, PendingMount { parent, placement });
        log::trace!(target: "vdom.component", "mount {id:?} under {parent:?}");
        host.mount(parent, self.tree.mounts.resolver(id));
        self.resolve_pending()?;
        Ok(())
    }

    /// Applies queued component resolutions, including ones queued while applying.
    pub(crate) fn resolve_pending(&mut self) -> Result<usize, ReconcileError> {
        let mut applied = 0;
        while let Some(resolution) = self.tree.mounts.pop() {
            let Resolution {
                component,
                id,
                child,
            } = resolution;
            let Some((component, pending)) = self.tree.mounts.take_pending(component) else {
                log::warn!(
                    target: "vdom.component",
                    "dropping resolution for {component:?}: component is no longer mounting"
                );
                continue;
            };
            if !self.tree.contains(component) {
                log::warn!(
                    target: "vdom.component",
                    "dropping resolution for {component:?}: component was destroyed"
                );
                continue;
            }
            let child = self.tree.insert_under(child, Some(component));
            if let Some(data) = self.tree.component_mut(component) {
                data.child = Some(child);
                data.component_id = Some(id);
            }
            self.create(child, pending.parent, pending.placement)?;
            let on_mount = self
                .tree
                .component(component)
                .and_then(|data| data.hooks.on_mount.clone());
            if let Some(hook) = on_mount {
                match self.tree.dom_ref(component) {
                    Ok(backend) => hook(backend),
                    Err(err) => log::trace!(target: "vdom.component", "skip on_mount: {err}"),
                }
            }
            applied += 1;
        }
        Ok(applied)
    }

    fn place(
        &mut self,
        parent: NodeRef,
        node: NodeRef,
        placement: Placement,
    ) -> Result<(), AdapterError> {
        match placement {
            Placement::Append => self.adapter.append_child(parent, node),
            Placement::InsertBefore(before) => self.adapter.insert_before(parent, node, before),
            Placement::Replace(old) => self.adapter.replace_child(parent, node, old),
            Placement::Hydrate => Ok(()),
        }
    }

    pub(crate) fn destroy(&mut self, old: NodeId, parent: NodeRef) -> Result<(), ReconcileError> {
        self.call_before_destroy(old)?;
        match self.tree.try_dom_ref(old) {
            Some(backend) => self.adapter.remove_child(parent, backend)?,
            None => {
                // The pending mount was going to take this node's place.
                if let Some((target_parent, replaced)) = self.pending_replace(old) {
                    self.adapter.remove_child(target_parent, replaced)?;
                }
            }
        }
        self.call_destroyed(old)?;
        self.tree.free_subtree(old);
        Ok(())
    }

    fn replace(&mut self, old: NodeId, new: NodeId, parent: NodeRef) -> Result<(), ReconcileError> {
        self.call_before_destroy(old)?;
        match self.tree.try_dom_ref(old) {
            Some(backend) => self.create(new, parent, Placement::Replace(backend))?,
            None => match self.pending_replace(old) {
                Some((target_parent, replaced)) => {
                    self.create(new, target_parent, Placement::Replace(replaced))?
                }
                None => self.create(new, parent, Placement::Append)?,
            },
        }
        self.call_destroyed(old)?;
        self.tree.free_subtree(old);
        Ok(())
    }

    /// Backend node an unresolved component mount was going to replace.
    fn pending_replace(&self, id: NodeId) -> Option<(NodeRef, NodeRef)> {
        let mut current = id;
        loop {
            let component = self.tree.component(current)?;
            match component.child {
                Some(child) => current = child,
                None => {
                    let pending = self.tree.mounts.pending(current)?;
                    return match pending.placement {
                        Placement::Replace(replaced) => Some((pending.parent, replaced)),
                        _ => None,
                    };
                }
            }
        }
    }

    fn call_before_destroy(&self, id: NodeId) -> Result<(), ReconcileError> {
        match &self.tree.node(id)?.kind {
            VKind::Text(_) => {}
            VKind::Element(el) => {
                if let Some(hook) = &el.hooks.before_destroy {
                    hook();
                }
                for &child in &el.children {
                    self.call_before_destroy(child)?;
                }
            }
            VKind::Component(component) => {
                if let Some(hook) = &component.hooks.before_unmount {
                    hook();
                }
                if let Some(child) = component.child {
                    self.call_before_destroy(child)?;
                }
            }
        }
        Ok(())
    }

    fn call_destroyed(&self, id: NodeId) -> Result<(), ReconcileError> {
        match &self.tree.node(id)?.kind {
            VKind::Text(_) => {}
            VKind::Element(el) => {
                if let Some(hook) = &el.hooks.on_destroy {
                    hook();
                }
                for &child in &el.children {
                    self.call_destroyed(child)?;
                }
            }
            VKind::Component(component) => {
                if let Some(hook) = &component.hooks.on_unmount
                    && let Ok(backend) = self.tree.dom_ref(id)
                {
                    hook(backend);
                }
                if let Some(component_id) = component.component_id {
                    component.host.unmount(component_id);
                }
                if let Some(child) = component.child {
                    self.call_destroyed(child)?;
                }
            }
        }
        Ok(())
    }
}

fn diff_props<A: MutationAdapter + ?Sized>(
    adapter: &mut A,
    config: &ReconcileConfig,
    old: &PropMap,
    new: &PropMap,
    node: NodeRef,
    svg: bool,
) -> Result<(), AdapterError> {
    for name in old.keys() {
        if new.contains_key(name) {
            continue;
        }
        if svg || !adapter.has_property(node, name) || config.removes_as_attribute(name) {
            adapter.remove_attribute(node, name)?;
        } else {
            adapter.set_attribute(node, name, "")?;
        }
    }
    for (name, value) in new {
        if old.get(name) == Some(value) && !config.always_reapplies(name) {
            continue;
        }
        if svg {
            if &**name == "href" {
                adapter.set_attribute_ns(node, XLINK_NAMESPACE, name, &value.to_attribute())?;
            } else {
                adapter.set_attribute(node, name, &value.to_attribute())?;
            }
        } else if adapter.has_property(node, name) && !config.is_attribute_only(name) {
            adapter.set_property(node, name, value)?;
        } else {
            adapter.set_attribute(node, name, &value.to_attribute())?;
        }
    }
    Ok(())
}

fn diff_classes<A: MutationAdapter + ?Sized>(
    adapter: &mut A,
    old: &ClassSet,
    new: &ClassSet,
    node: NodeRef,
) -> Result<(), AdapterError> {
    for class in old.difference(new) {
        adapter.remove_class(node, class)?;
    }
    for class in new.difference(old) {
        adapter.add_class(node, class)?;
    }
    Ok(())
}

fn diff_style<A: MutationAdapter + ?Sized>(
    adapter: &mut A,
    old: &StyleMap,
    new: &StyleMap,
    node: NodeRef,
) -> Result<(), AdapterError> {
    if old != new {
        adapter.set_inline_style(node, old, new)?;
    }
    Ok(())
}
