//! One mount point: the live tree, its root and the delegated listeners.
//!
//! Events are dispatched against the tree through [`TreeSource`]. While a
//! render holds the tree mutably, continuations wait in a queue and run once
//! the render finishes, so a dispatch never observes a half-patched tree.

use crate::adapter::{EventAdapter, InspectionAdapter, MutationAdapter};
use crate::config::ReconcileConfig;
use crate::dom_diff::{diff, resolve_mounts};
use crate::error::ReconcileError;
use crate::events::{Delegation, EventSpec, TreeContinuation, TreeSource, delegate, undelegate};
use crate::hydrate::hydrate;
use crate::integrity::{IntegrityOptions, integrity_check};
use crate::tree::{NodeId, VTree};
use crate::types::Node;
use core_types::NodeRef;
use log::LevelFilter;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

struct MountState {
    point: NodeRef,
    tree: RefCell<VTree>,
    root: Cell<Option<NodeId>>,
    waiting: RefCell<VecDeque<TreeContinuation>>,
}

impl TreeSource for MountState {
    fn current_tree(&self, continuation: TreeContinuation) {
        match self.tree.try_borrow() {
            Ok(tree) => continuation(&*tree, self.root.get()),
            Err(_) => self.waiting.borrow_mut().push_back(continuation),
        }
    }
}

impl MountState {
    fn release_waiting(&self) {
        loop {
            let next = self.waiting.borrow_mut().pop_front();
            let Some(continuation) = next else {
                break;
            };
            match self.tree.try_borrow() {
                Ok(tree) => continuation(&*tree, self.root.get()),
                Err(_) => {
                    self.waiting.borrow_mut().push_front(continuation);
                    break;
                }
            }
        }
    }
}

pub struct Mount {
    state: Rc<MountState>,
    delegation: Option<Delegation>,
}

impl Mount {
    pub fn new(point: NodeRef) -> Self {
        Self::with_config(point, ReconcileConfig::default())
    }

    pub fn with_config(point: NodeRef, config: ReconcileConfig) -> Self {
        Self {
            state: Rc::new(MountState {
                point,
                tree: RefCell::new(VTree::with_config(config)),
                root: Cell::new(None),
                waiting: RefCell::new(VecDeque::new()),
            }),
            delegation: None,
        }
    }

    pub fn point(&self) -> NodeRef {
        self.state.point
    }

    pub fn root(&self) -> Option<NodeId> {
        self.state.root.get()
    }

    /// Tree source for [`delegate`](crate::delegate) callers wiring listeners
    /// by hand.
    pub fn source(&self) -> Rc<dyn TreeSource> {
        Rc::clone(&self.state) as Rc<dyn TreeSource>
    }

    /// Reconciles the current tree into `next`. `None` clears the mount point.
    ///
    /// Fails with [`ReconcileError::TreeBusy`] when called from inside a
    /// handler that is dispatching against this tree.
    pub fn render<A: MutationAdapter + ?Sized>(
        &mut self,
        next: Option<Node>,
        adapter: &mut A,
    ) -> Result<(), ReconcileError> {
        let result = {
            let mut tree = self
                .state
                .tree
                .try_borrow_mut()
                .map_err(|_| ReconcileError::TreeBusy)?;
            let new = next.map(|node| tree.insert(node));
            let old = self.state.root.get();
            let result = diff(&mut tree, old, new, self.state.point, adapter);
            match result {
                Ok(()) => self.state.root.set(new),
                Err(_) => self.reset(&mut tree, &[old, new], adapter),
            }
            result
        };
        self.state.release_waiting();
        result
    }

    /// Binds `node` to the backend nodes already under the mount point.
    ///
    /// Falls back to a full create when the backend differs; returns whether
    /// the existing nodes were reused. With a tree already rendered this is
    /// a plain [`render`](Self::render) and returns `false`.
    pub fn hydrate<A: MutationAdapter + InspectionAdapter + ?Sized>(
        &mut self,
        node: Node,
        adapter: &mut A,
        log_level: LevelFilter,
    ) -> Result<bool, ReconcileError> {
        if self.state.root.get().is_some() {
            self.render(Some(node), adapter)?;
            return Ok(false);
        }
        let result = {
            let mut tree = self
                .state
                .tree
                .try_borrow_mut()
                .map_err(|_| ReconcileError::TreeBusy)?;
            let root = tree.insert(node);
            self.state.root.set(Some(root));
            let result =
                match hydrate(log_level, Some(self.state.point), &mut tree, Some(root), adapter) {
                    Ok(true) => Ok(true),
                    Ok(false) => diff(&mut tree, None, Some(root), self.state.point, adapter)
                        .map(|()| false),
                    Err(err) => Err(err),
                };
            if result.is_err() {
                self.reset(&mut tree, &[Some(root)], adapter);
            }
            result
        };
        self.state.release_waiting();
        result
    }

    /// Drops `roots` after a failed pass and detaches whatever they placed
    /// under the mount point, so the next render starts from an empty mount.
    fn reset<A: MutationAdapter + ?Sized>(
        &self,
        tree: &mut VTree,
        roots: &[Option<NodeId>],
        adapter: &mut A,
    ) {
        let point = self.state.point;
        let mut placed: Vec<NodeRef> = Vec::new();
        for &id in roots.iter().flatten() {
            if let Some(backend) = tree.try_dom_ref(id)
                && !placed.contains(&backend)
            {
                placed.push(backend);
            }
            tree.discard(id);
        }
        for backend in placed {
            if let Err(err) = adapter.remove_child(point, backend) {
                log::debug!(target: "vdom.diff", "reset skipped {backend:?}: {err}");
            }
        }
        if let Err(err) = adapter.flush() {
            log::warn!(target: "vdom.diff", "flush after failed render: {err}");
        }
        self.state.root.set(None);
    }

    /// Registers one delegated listener per event name at the mount point,
    /// replacing any earlier delegation made through this handle.
    pub fn delegate<E: EventAdapter + 'static>(
        &mut self,
        specs: &[EventSpec],
        debug: bool,
        adapter: &Rc<E>,
    ) {
        if let Some(previous) = self.delegation.take() {
            undelegate(previous, &**adapter);
        }
        self.delegation = Some(delegate(
            self.state.point,
            specs,
            self.source(),
            debug,
            adapter,
        ));
    }

    pub fn undelegate<E: EventAdapter + ?Sized>(&mut self, adapter: &E) {
        if let Some(delegation) = self.delegation.take() {
            undelegate(delegation, adapter);
        }
    }

    pub fn delegation(&self) -> Option<&Delegation> {
        self.delegation.as_ref()
    }

    /// Applies component mounts that resolved after the last render.
    pub fn resolve_mounts<A: MutationAdapter + ?Sized>(
        &mut self,
        adapter: &mut A,
    ) -> Result<usize, ReconcileError> {
        let result = {
            let mut tree = self
                .state
                .tree
                .try_borrow_mut()
                .map_err(|_| ReconcileError::TreeBusy)?;
            resolve_mounts(&mut tree, adapter)
        };
        self.state.release_waiting();
        result
    }

    pub fn integrity_check<I: InspectionAdapter + ?Sized>(
        &self,
        inspection: &I,
        options: &IntegrityOptions,
    ) -> Result<bool, ReconcileError> {
        self.with_tree(|tree, root| integrity_check(tree, root, inspection, options))
    }

    /// Runs `f` against the current tree and root.
    pub fn with_tree<R>(
        &self,
        f: impl FnOnce(&VTree, Option<NodeId>) -> R,
    ) -> Result<R, ReconcileError> {
        let tree = self
            .state
            .tree
            .try_borrow()
            .map_err(|_| ReconcileError::TreeBusy)?;
        Ok(f(&*tree, self.state.root.get()))
    }
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mount")
            .field("point", &self.state.point)
            .field("root", &self.state.root.get())
            .field("delegation", &self.delegation)
            .finish_non_exhaustive()
    }
}
