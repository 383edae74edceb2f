//! Binding a virtual tree to a backend tree that already exists.
//!
//! The walk is lock-step and all-or-nothing: any mismatch aborts it, every
//! backend ref bound so far is cleared, components mounted during the walk are
//! unmounted again and the mount point is emptied so a full create can follow.

use crate::adapter::{InspectionAdapter, MutationAdapter, NodeType};
use crate::component::{PendingMount, Placement};
use crate::error::ReconcileError;
use crate::tree::{NodeId, VKind, VTree};
use core_types::NodeRef;
use log::{Level, LevelFilter};

/// Binds `root` to the single child of `mount_point` without creating nodes.
///
/// Returns `Ok(false)` when either input is missing or the trees differ; the
/// mount point has no children afterwards. Diagnostics are logged under the
/// `vdom.hydrate` target when they pass `log_level`.
pub fn hydrate<A: MutationAdapter + InspectionAdapter + ?Sized>(
    log_level: LevelFilter,
    mount_point: Option<NodeRef>,
    tree: &mut VTree,
    root: Option<NodeId>,
    adapter: &mut A,
) -> Result<bool, ReconcileError> {
    let (Some(mount_point), Some(root)) = (mount_point, root) else {
        if Level::Warn <= log_level {
            log::warn!(target: "vdom.hydrate", "nothing to hydrate: mount point or tree missing");
        }
        return Ok(false);
    };

    let mut walk = Walk {
        tree,
        adapter,
        log_level,
        bound: Vec::new(),
        mounted: Vec::new(),
    };
    let children = walk.adapter.children(mount_point);
    let matched = match children.as_slice() {
        [only] => walk.node(root, *only, mount_point)?,
        _ => {
            walk.mismatch(
                root,
                format_args!("mount point holds {} children, expected 1", children.len()),
            );
            false
        }
    };

    if matched {
        if Level::Info <= log_level {
            log::info!(
                target: "vdom.hydrate",
                "bound {} nodes to the existing backend tree",
                walk.bound.len()
            );
        }
        return Ok(true);
    }

    if Level::Warn <= log_level {
        log::warn!(
            target: "vdom.hydrate",
            "could not bind the existing backend tree, falling back to a full create"
        );
    }
    walk.rollback();
    while let Some(child) = walk.adapter.last_child(mount_point) {
        walk.adapter.remove_child(mount_point, child)?;
    }
    Ok(false)
}

struct Walk<'a, A: ?Sized> {
    tree: &'a mut VTree,
    adapter: &'a mut A,
    log_level: LevelFilter,
    bound: Vec<NodeId>,
    mounted: Vec<NodeId>,
}

impl<A: MutationAdapter + InspectionAdapter + ?Sized> Walk<'_, A> {
    fn node(
        &mut self,
        id: NodeId,
        backend: NodeRef,
        parent: NodeRef,
    ) -> Result<bool, ReconcileError> {
        match &self.tree.node(id)?.kind {
            VKind::Component(component) => {
                let child = match component.child {
                    Some(child) => child,
                    None => match self.mount(id, parent)? {
                        Some(child) => child,
                        None => {
                            self.mismatch(
                                id,
                                format_args!("component did not resolve synchronously"),
                            );
                            return Ok(false);
                        }
                    },
                };
                if !self.node(child, backend, parent)? {
                    return Ok(false);
                }
                let on_mount = self
                    .tree
                    .component(id)
                    .and_then(|c| c.hooks.on_mount.clone());
                if let Some(hook) = on_mount {
                    hook(backend);
                }
                Ok(true)
            }
            VKind::Text(text) => {
                let matches = self.adapter.node_type(backend) == Some(NodeType::Text)
                    && self
                        .adapter
                        .get_text_content(backend)
                        .is_some_and(|actual| actual.trim() == text.trim());
                if !matches {
                    self.mismatch(id, format_args!("text differs from {backend:?}"));
                    return Ok(false);
                }
                self.bind(id, backend)?;
                Ok(true)
            }
            VKind::Element(el) => {
                let tag_matches = self.adapter.node_type(backend) == Some(NodeType::Element)
                    && self
                        .adapter
                        .get_tag(backend)
                        .is_some_and(|tag| tag.eq_ignore_ascii_case(&el.tag));
                if !tag_matches {
                    self.mismatch(id, format_args!("<{}> differs from {backend:?}", el.tag));
                    return Ok(false);
                }
                let on_create = el.hooks.on_create.clone();
                self.bind(id, backend)?;
                self.tree.coalesce_text_children(id);
                if let Some(hook) = on_create {
                    hook(backend);
                }
                let children = self.tree.children(id).to_vec();
                let backend_children = self.adapter.children(backend);
                if children.len() != backend_children.len() {
                    self.mismatch(
                        id,
                        format_args!(
                            "{} virtual children, {} backend children",
                            children.len(),
                            backend_children.len()
                        ),
                    );
                    return Ok(false);
                }
                for (child, backend_child) in children.into_iter().zip(backend_children) {
                    if !self.node(child, backend_child, backend)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Mounts a component whose host must resolve inside `mount`.
    fn mount(&mut self, id: NodeId, parent: NodeRef) -> Result<Option<NodeId>, ReconcileError> {
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
        self.tree.mounts.expect(
            id,
            PendingMount {
                parent,
                placement: Placement::Hydrate,
            },
        );
        host.mount(parent, self.tree.mounts.resolver(id));
        let resolution = self.tree.mounts.take_resolution(id);
        self.tree.mounts.forget(id);
        let Some(resolution) = resolution else {
            return Ok(None);
        };
        let child = self.tree.insert_under(resolution.child, Some(id));
        if let Some(component) = self.tree.component_mut(id) {
            component.child = Some(child);
            component.component_id = Some(resolution.id);
        }
        self.mounted.push(id);
        Ok(Some(child))
    }

    fn bind(&mut self, id: NodeId, backend: NodeRef) -> Result<(), ReconcileError> {
        self.tree.node_mut(id)?.backend = Some(backend);
        self.bound.push(id);
        Ok(())
    }

    fn mismatch(&self, id: NodeId, detail: std::fmt::Arguments<'_>) {
        if Level::Warn <= self.log_level {
            log::warn!(target: "vdom.hydrate", "tree differs at {id:?}: {detail}");
        }
    }

    fn rollback(&mut self) {
        for id in self.bound.drain(..) {
            if let Some(node) = self.tree.get_mut(id) {
                node.backend = None;
            }
        }
        for id in self.mounted.drain(..).rev() {
            let Some(component) = self.tree.component_mut(id) else {
                continue;
            };
            let child = component.child.take();
            let component_id = component.component_id.take();
            let host = component.host.clone();
            if let Some(component_id) = component_id {
                host.unmount(component_id);
            }
            if let Some(child) = child {
                self.tree.free_subtree(child);
            }
        }
    }
}
