use crate::tree::{NodeId, VKind, VTree};
use crate::types::Key;
use core_types::NodeRef;

/// Pre-order iterator over a subtree, entering resolved components.
pub struct PreOrder<'a> {
    tree: &'a VTree,
    stack: Vec<NodeId>,
}

impl<'a> PreOrder<'a> {
    pub fn new(tree: &'a VTree, root: NodeId) -> Self {
        Self {
            tree,
            stack: vec![root],
        }
    }
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let id = self.stack.pop()?;
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            match &node.kind {
                VKind::Text(_) => {}
                VKind::Element(el) => self.stack.extend(el.children.iter().rev()),
                VKind::Component(component) => self.stack.extend(component.child),
            }
            return Some(id);
        }
    }
}

/// The text or element node bound to `backend`.
pub fn find_by_backend_ref(tree: &VTree, root: NodeId, backend: NodeRef) -> Option<NodeId> {
    PreOrder::new(tree, root).find(|&id| tree.get(id).is_some_and(|n| n.backend == Some(backend)))
}

/// First direct child of `parent` carrying `key`.
pub fn find_by_key(tree: &VTree, parent: NodeId, key: &Key) -> Option<NodeId> {
    tree.children(parent)
        .iter()
        .copied()
        .find(|&child| tree.key(child) == Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Element;

    #[test]
    fn pre_order_visits_parents_first() {
        let mut tree = VTree::new();
        let root = tree.insert(
            Element::new("div")
                .child(Element::new("p").key("first").text("x"))
                .child(Element::new("p").key("second"))
                .into(),
        );
        let order: Vec<String> = PreOrder::new(&tree, root)
            .map(|id| match (tree.element(id), tree.text(id)) {
                (Some(el), _) => el.tag.to_string(),
                (None, Some(text)) => text.to_string(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(order, ["div", "p", "x", "p"]);

        let second = find_by_key(&tree, root, &Key::from("second"));
        assert_eq!(second, tree.children(root).get(1).copied());
        assert_eq!(find_by_key(&tree, root, &Key::from("missing")), None);
        assert_eq!(find_by_backend_ref(&tree, root, NodeRef(1)), None);
    }
}
