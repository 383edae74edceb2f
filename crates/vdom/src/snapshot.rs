use crate::tree::{NodeId, VKind, VTree};
use std::fmt::{self, Write};

/// Deterministic line-per-node rendering of a live virtual tree, for tests.
/// Not a stable format.
///
/// Line shapes:
/// - `<tag key=k a="v" class="x y" style="k: v">` for elements, children
///   indented by two spaces.
/// - `"text"` for text nodes.
/// - `component key=k` for components; an unresolved one renders as
///   `component (pending)`.
/// - Backend refs are appended as `@n` unless ignored.
#[derive(Clone, Copy, Debug)]
pub struct VTreeSnapshotOptions {
    pub ignore_backend_refs: bool,
    pub ignore_keys: bool,
}

impl Default for VTreeSnapshotOptions {
    fn default() -> Self {
        Self {
            ignore_backend_refs: true,
            ignore_keys: false,
        }
    }
}

#[derive(Debug)]
pub struct VTreeSnapshot {
    lines: Vec<String>,
}

impl VTreeSnapshot {
    pub fn new(tree: &VTree, root: NodeId, options: VTreeSnapshotOptions) -> Self {
        let mut lines = Vec::new();
        walk_snapshot(tree, root, &options, 0, &mut lines);
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for VTreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

pub fn assert_tree_snapshot(
    tree: &VTree,
    root: NodeId,
    expected: &[&str],
    options: VTreeSnapshotOptions,
) {
    let snapshot = VTreeSnapshot::new(tree, root, options);
    let actual: Vec<&str> = snapshot.as_lines().iter().map(String::as_str).collect();
    assert_eq!(
        actual,
        expected,
        "tree snapshot mismatch\nactual:\n{}",
        snapshot.render()
    );
}

fn walk_snapshot(
    tree: &VTree,
    id: NodeId,
    options: &VTreeSnapshotOptions,
    depth: usize,
    out: &mut Vec<String>,
) {
    let mut line = "  ".repeat(depth);
    let Some(node) = tree.get(id) else {
        line.push_str("<stale>");
        out.push(line);
        return;
    };
    match &node.kind {
        VKind::Text(text) => {
            let _ = write!(line, "{text:?}");
        }
        VKind::Element(el) => {
            let _ = write!(line, "<{}", el.tag);
            if !options.ignore_keys
                && let Some(key) = &el.key
            {
                let _ = write!(line, " key={key}");
            }
            for (name, value) in &el.props {
                let _ = write!(line, " {name}=\"{}\"", value.to_attribute());
            }
            if !el.classes.is_empty() {
                let classes: Vec<&str> = el.classes.iter().map(|c| &**c).collect();
                let _ = write!(line, " class=\"{}\"", classes.join(" "));
            }
            if !el.style.is_empty() {
                let style: Vec<String> =
                    el.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                let _ = write!(line, " style=\"{}\"", style.join("; "));
            }
            line.push('>');
        }
        VKind::Component(component) => {
            line.push_str("component");
            if !options.ignore_keys
                && let Some(key) = &component.key
            {
                let _ = write!(line, " key={key}");
            }
            if component.child.is_none() {
                line.push_str(" (pending)");
            }
        }
    }
    if !options.ignore_backend_refs
        && let Some(backend) = node.backend
    {
        let _ = write!(line, " @{}", backend.0);
    }
    out.push(line);

    match &node.kind {
        VKind::Element(el) => {
            for &child in &el.children {
                walk_snapshot(tree, child, options, depth + 1, out);
            }
        }
        VKind::Component(component) => {
            if let Some(child) = component.child {
                walk_snapshot(tree, child, options, depth + 1, out);
            }
        }
        VKind::Text(_) => {}
    }
}
