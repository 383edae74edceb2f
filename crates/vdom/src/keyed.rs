//! Keyed child list reconciliation.
//!
//! Four cursors walk the old list (mutated in place so it always mirrors the
//! backend child order) and the new list (read-only). Both ranges are
//! half-open: `old_start..old_end` and `new_start..new_end`.
//!
//! Invariants:
//! - Every old entry that has been diffed is replaced by its new counterpart,
//!   so anchors always resolve to live backend nodes.
//! - Moves happen before the diff of the moved pair.
//! - Each iteration advances at least one cursor or shrinks the old range.

use crate::adapter::MutationAdapter;
use crate::component::Placement;
use crate::dom_diff::Patcher;
use crate::error::ReconcileError;
use crate::tree::{NodeId, VTree};
use core_types::NodeRef;

/// Keyed reconciliation applies when both lists are non-empty and fully keyed.
pub(crate) fn can_sync(tree: &VTree, old: &[NodeId], new: &[NodeId]) -> bool {
    !old.is_empty()
        && !new.is_empty()
        && old.iter().all(|&id| tree.key(id).is_some())
        && new.iter().all(|&id| tree.key(id).is_some())
}

pub(crate) fn sync_children<A: MutationAdapter + ?Sized>(
    patcher: &mut Patcher<'_, A>,
    mut os: Vec<NodeId>,
    ns: &[NodeId],
    parent: NodeRef,
) -> Result<(), ReconcileError> {
    let mut old_start = 0usize;
    let mut old_end = os.len();
    let mut new_start = 0usize;
    let mut new_end = ns.len();

    loop {
        let old_done = old_start >= old_end;
        let new_done = new_start >= new_end;
        if old_done && new_done {
            break;
        }

        if old_done {
            let new_head = ns[new_start];
            let before = anchor(patcher.tree, &os, old_start);
            patcher.create(new_head, parent, Placement::InsertBefore(before))?;
            os.insert(old_start, new_head);
            old_start += 1;
            old_end += 1;
            new_start += 1;
            continue;
        }

        if new_done {
            for i in (old_start..old_end).rev() {
                patcher.destroy(os[i], parent)?;
            }
            os.drain(old_start..old_end);
            old_end = old_start;
            continue;
        }

        let old_head = os[old_start];
        let old_tail = os[old_end - 1];
        let new_head = ns[new_start];
        let new_tail = ns[new_end - 1];
        let tree = &*patcher.tree;
        let heads = tree.key(old_head) == tree.key(new_head);
        let tails = tree.key(old_tail) == tree.key(new_tail);
        let head_to_tail = tree.key(old_head) == tree.key(new_tail);
        let tail_to_head = tree.key(old_tail) == tree.key(new_head);

        if heads {
            patcher.diff(Some(old_head), Some(new_head), parent)?;
            os[old_start] = new_head;
            old_start += 1;
            new_start += 1;
        } else if tails {
            patcher.diff(Some(old_tail), Some(new_tail), parent)?;
            os[old_end - 1] = new_tail;
            old_end -= 1;
            new_end -= 1;
        } else if head_to_tail && tail_to_head {
            log::trace!(target: "vdom.keyed", "swap {old_head:?} <-> {old_tail:?}");
            match (
                patcher.tree.try_dom_ref(old_tail),
                patcher.tree.try_dom_ref(old_head),
            ) {
                (Some(a), Some(b)) => patcher.adapter.swap_dom_refs(a, b, parent)?,
                _ => log::trace!(target: "vdom.keyed", "swap skipped: unmounted component"),
            }
            os.swap(old_start, old_end - 1);
            patcher.diff(Some(old_tail), Some(new_head), parent)?;
            os[old_start] = new_head;
            patcher.diff(Some(old_head), Some(new_tail), parent)?;
            os[old_end - 1] = new_tail;
            old_start += 1;
            old_end -= 1;
            new_start += 1;
            new_end -= 1;
        } else if head_to_tail {
            let before = anchor(patcher.tree, &os, old_end);
            move_before(patcher, old_head, parent, before)?;
            let moved = os.remove(old_start);
            os.insert(old_end - 1, moved);
            patcher.diff(Some(old_head), Some(new_tail), parent)?;
            os[old_end - 1] = new_tail;
            old_end -= 1;
            new_end -= 1;
        } else if tail_to_head {
            let before = anchor(patcher.tree, &os, old_start);
            move_before(patcher, old_tail, parent, before)?;
            let moved = os.remove(old_end - 1);
            os.insert(old_start, moved);
            patcher.diff(Some(old_tail), Some(new_head), parent)?;
            os[old_start] = new_head;
            old_start += 1;
            new_start += 1;
        } else {
            let found = {
                let key = tree.key(new_head);
                (old_start..old_end).find(|&i| tree.key(os[i]) == key)
            };
            let before = anchor(patcher.tree, &os, old_start);
            match found {
                Some(index) => {
                    let matched = os.remove(index);
                    move_before(patcher, matched, parent, before)?;
                    os.insert(old_start, matched);
                    patcher.diff(Some(matched), Some(new_head), parent)?;
                    os[old_start] = new_head;
                    old_start += 1;
                    new_start += 1;
                }
                None => {
                    patcher.create(new_head, parent, Placement::InsertBefore(before))?;
                    os.insert(old_start, new_head);
                    // The insert shifted the unvisited old range right by one.
                    old_start += 1;
                    old_end += 1;
                    new_start += 1;
                }
            }
        }
    }
    Ok(())
}

/// First resolvable backend node at or after `from`; `None` appends.
fn anchor(tree: &VTree, os: &[NodeId], from: usize) -> Option<NodeRef> {
    os.get(from..)?.iter().find_map(|&id| tree.try_dom_ref(id))
}

fn move_before<A: MutationAdapter + ?Sized>(
    patcher: &mut Patcher<'_, A>,
    id: NodeId,
    parent: NodeRef,
    before: Option<NodeRef>,
) -> Result<(), ReconcileError> {
    let Some(node) = patcher.tree.try_dom_ref(id) else {
        log::trace!(target: "vdom.keyed", "move skipped: {id:?} is not mounted yet");
        return Ok(());
    };
    if before == Some(node) {
        return Ok(());
    }
    patcher.adapter.insert_before(parent, node, before)?;
    Ok(())
}
