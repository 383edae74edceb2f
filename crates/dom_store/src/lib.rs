//! In-memory backend for the reconciler.
//!
//! `DomStore` is an arena of element and text records under a single root,
//! implementing the mutation and inspection adapters. Every successful
//! mutation is appended to a journal so tests can assert exactly which calls
//! a reconciliation issued. `SharedDom` wraps a store with a listener table
//! and implements the event adapter.

mod shared;

pub use crate::shared::SharedDom;

use core_types::NodeRef;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use vdom::types::StyleMap;
use vdom::{AdapterError, InspectionAdapter, MutationAdapter, NodeType, Value};

/// Property names the store treats as reflected properties, as a browser
/// element would expose them.
pub const DEFAULT_PROPERTIES: &[&str] = &[
    "id", "value", "checked", "disabled", "selected", "hidden", "title", "href", "src",
    "className", "tabIndex", "width", "height", "list", "form", "placeholder",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomStoreError {
    InvalidRef(NodeRef),
    MissingRef(NodeRef),
    WrongNodeKind(NodeRef),
    InvalidParent(NodeRef),
    NotAChild { parent: NodeRef, child: NodeRef },
    CycleDetected { parent: NodeRef, child: NodeRef },
    /// Failure requested with [`DomStore::fail_on`].
    Injected(&'static str),
}

impl fmt::Display for DomStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomStoreError::InvalidRef(node) => write!(f, "{node:?} is not a valid handle"),
            DomStoreError::MissingRef(node) => write!(f, "{node:?} is not a live node"),
            DomStoreError::WrongNodeKind(node) => write!(f, "{node:?} has the wrong node kind"),
            DomStoreError::InvalidParent(node) => write!(f, "{node:?} cannot have children"),
            DomStoreError::NotAChild { parent, child } => {
                write!(f, "{child:?} is not a child of {parent:?}")
            }
            DomStoreError::CycleDetected { parent, child } => {
                write!(f, "inserting {child:?} under {parent:?} would create a cycle")
            }
            DomStoreError::Injected(op) => write!(f, "injected failure in {op}"),
        }
    }
}

impl std::error::Error for DomStoreError {}

impl DomStoreError {
    pub fn during(self, op: &'static str) -> AdapterError {
        AdapterError::new(op, self.to_string())
    }
}

/// One successful backend call, in the order it was applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    CreateElement { node: NodeRef, tag: String },
    CreateElementNs { node: NodeRef, namespace: String, tag: String },
    CreateText { node: NodeRef, text: String },
    AppendChild { parent: NodeRef, child: NodeRef },
    InsertBefore { parent: NodeRef, child: NodeRef, before: Option<NodeRef> },
    ReplaceChild { parent: NodeRef, new_child: NodeRef, old_child: NodeRef },
    RemoveChild { parent: NodeRef, child: NodeRef },
    SetProperty { node: NodeRef, name: String, value: Value },
    SetAttribute { node: NodeRef, name: String, value: String },
    SetAttributeNs { node: NodeRef, namespace: String, name: String, value: String },
    RemoveAttribute { node: NodeRef, name: String },
    SetText { node: NodeRef, text: String },
    SetStyle { node: NodeRef, style: Vec<(String, String)> },
    AddClass { node: NodeRef, class: String },
    RemoveClass { node: NodeRef, class: String },
    Swap { a: NodeRef, b: NodeRef },
    Flush,
}

impl Op {
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Op::AppendChild { .. }
                | Op::InsertBefore { .. }
                | Op::ReplaceChild { .. }
                | Op::RemoveChild { .. }
                | Op::Swap { .. }
        )
    }

    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Op::CreateElement { .. } | Op::CreateElementNs { .. } | Op::CreateText { .. }
        )
    }
}

pub struct DomStore {
    nodes: Vec<NodeRecord>,
    live: HashMap<NodeRef, usize>,
    root: NodeRef,
    properties: HashSet<String>,
    journal: Vec<Op>,
    fail_on: Option<&'static str>,
}

impl DomStore {
    pub fn new() -> Self {
        Self::with_properties(DEFAULT_PROPERTIES.iter().copied())
    }

    pub fn with_properties<'a>(properties: impl IntoIterator<Item = &'a str>) -> Self {
        let root = NodeRef(1);
        let mut live = HashMap::new();
        live.insert(root, 0);
        Self {
            nodes: vec![NodeRecord {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            live,
            root,
            properties: properties.into_iter().map(str::to_string).collect(),
            journal: Vec::new(),
            fail_on: None,
        }
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Creates a detached element outside the journal, e.g. a mount point.
    pub fn create_container(&mut self, tag: &str) -> NodeRef {
        self.alloc(NodeKind::element(tag, None))
    }

    /// Creates an element appended to the root, outside the journal.
    pub fn mount_point(&mut self, tag: &str) -> NodeRef {
        let node = self.create_container(tag);
        if let Some(&root) = self.live.get(&self.root) {
            self.nodes[root].children.push(node);
        }
        if let Some(&index) = self.live.get(&node) {
            self.nodes[index].parent = Some(self.root);
        }
        node
    }

    /// Makes the next call to the adapter method named `op` fail.
    pub fn fail_on(&mut self, op: &'static str) {
        self.fail_on = Some(op);
    }

    pub fn journal(&self) -> &[Op] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.journal)
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Journal entries other than `Flush`.
    pub fn mutation_count(&self) -> usize {
        self.journal.iter().filter(|op| **op != Op::Flush).count()
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.live.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.record(node).ok()?.parent
    }

    pub fn child_refs(&self, node: NodeRef) -> &[NodeRef] {
        match self.record(node) {
            Ok(record) => &record.children,
            Err(_) => &[],
        }
    }

    pub fn property(&self, node: NodeRef, name: &str) -> Option<&Value> {
        match &self.record(node).ok()?.kind {
            NodeKind::Element { properties, .. } => {
                properties.iter().find(|(n, _)| &**n == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn attribute_ns(&self, node: NodeRef, namespace: &str, name: &str) -> Option<&str> {
        match &self.record(node).ok()?.kind {
            NodeKind::Element { namespaced, .. } => namespaced
                .iter()
                .find(|(ns, n, _)| &**ns == namespace && &**n == name)
                .map(|(_, _, v)| v.as_str()),
            _ => None,
        }
    }

    /// Classes in the order they were added.
    pub fn classes(&self, node: NodeRef) -> Vec<String> {
        self.get_attribute(node, "class")
            .map(|class| class.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_content(&self, node: NodeRef) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeRef, out: &mut String) {
        let Ok(record) = self.record(node) else {
            return;
        };
        if let NodeKind::Text { text } = &record.kind {
            out.push_str(text);
        }
        for &child in &record.children {
            self.collect_text(child, out);
        }
    }

    /// Serialized children of `node` (the node itself for elements and text).
    pub fn to_markup(&self, node: NodeRef) -> String {
        let mut out = String::new();
        match self.record(node) {
            Ok(record) if matches!(record.kind, NodeKind::Root) => {
                for &child in &record.children {
                    self.write_markup(child, &mut out);
                }
            }
            Ok(_) => self.write_markup(node, &mut out),
            Err(_) => {}
        }
        out
    }

    /// Serialized children of `node`, without the node's own tag.
    pub fn inner_markup(&self, node: NodeRef) -> String {
        let mut out = String::new();
        for &child in self.child_refs(node) {
            self.write_markup(child, &mut out);
        }
        out
    }

    fn write_markup(&self, node: NodeRef, out: &mut String) {
        let Ok(record) = self.record(node) else {
            return;
        };
        match &record.kind {
            NodeKind::Root => {}
            NodeKind::Text { text } => out.push_str(text),
            NodeKind::Element {
                tag,
                attributes,
                namespaced,
                style,
                ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                for (_, name, value) in namespaced {
                    out.push_str(&format!(" xlink:{name}=\"{value}\""));
                }
                if !style.is_empty() {
                    let decls: Vec<String> =
                        style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    out.push_str(&format!(" style=\"{}\"", decls.join("; ")));
                }
                out.push('>');
                for &child in &record.children {
                    self.write_markup(child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeRef {
        let node = NodeRef(self.nodes.len() as u32 + 1);
        self.live.insert(node, self.nodes.len());
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        });
        node
    }

    fn record(&self, node: NodeRef) -> Result<&NodeRecord, DomStoreError> {
        let index = self.index(node)?;
        Ok(&self.nodes[index])
    }

    fn index(&self, node: NodeRef) -> Result<usize, DomStoreError> {
        if !node.is_valid() {
            debug_assert!(false, "node ref must be non-zero");
            return Err(DomStoreError::InvalidRef(node));
        }
        self.live
            .get(&node)
            .copied()
            .ok_or(DomStoreError::MissingRef(node))
    }

    fn element_mut(&mut self, node: NodeRef) -> Result<&mut NodeKind, DomStoreError> {
        let index = self.index(node)?;
        let kind = &mut self.nodes[index].kind;
        match kind {
            NodeKind::Element { .. } => Ok(kind),
            _ => Err(DomStoreError::WrongNodeKind(node)),
        }
    }

    fn check(&mut self, op: &'static str) -> Result<(), DomStoreError> {
        if self.fail_on == Some(op) {
            self.fail_on = None;
            return Err(DomStoreError::Injected(op));
        }
        Ok(())
    }

    fn is_descendant(&self, ancestor: NodeRef, maybe_descendant: NodeRef) -> bool {
        let Ok(record) = self.record(ancestor) else {
            return false;
        };
        let mut stack: Vec<NodeRef> = record.children.clone();
        while let Some(current) = stack.pop() {
            if current == maybe_descendant {
                return true;
            }
            if let Ok(record) = self.record(current) {
                stack.extend(record.children.iter().copied());
            }
        }
        false
    }

    /// Validates `child` for insertion under `parent` and detaches it from
    /// its current parent.
    fn prepare_insert(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), DomStoreError> {
        let parent_index = self.index(parent)?;
        self.index(child)?;
        if parent == child || self.is_descendant(child, parent) {
            debug_assert!(false, "cannot create cycle");
            return Err(DomStoreError::CycleDetected { parent, child });
        }
        if !self.nodes[parent_index].allows_children() {
            debug_assert!(false, "parent node cannot have children");
            return Err(DomStoreError::InvalidParent(parent));
        }
        self.detach(child)
    }

    fn detach(&mut self, child: NodeRef) -> Result<(), DomStoreError> {
        let index = self.index(child)?;
        if let Some(parent) = self.nodes[index].parent.take() {
            let parent_index = self.index(parent)?;
            self.nodes[parent_index].children.retain(|c| *c != child);
        }
        Ok(())
    }

    fn position(&self, parent: NodeRef, child: NodeRef) -> Result<usize, DomStoreError> {
        self.record(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(DomStoreError::NotAChild { parent, child })
    }

    fn drop_subtree(&mut self, node: NodeRef) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(index) = self.live.remove(&current) {
                stack.extend(self.nodes[index].children.drain(..));
                self.nodes[index].parent = None;
            }
        }
    }

    fn do_insert_before(
        &mut self,
        parent: NodeRef,
        child: NodeRef,
        before: Option<NodeRef>,
    ) -> Result<(), DomStoreError> {
        if before == Some(child) {
            return Ok(());
        }
        if let Some(before) = before {
            self.position(parent, before)?;
        }
        self.prepare_insert(parent, child)?;
        let parent_index = self.index(parent)?;
        let pos = match before {
            Some(before) => self.position(parent, before)?,
            None => self.nodes[parent_index].children.len(),
        };
        self.nodes[parent_index].children.insert(pos, child);
        let child_index = self.index(child)?;
        self.nodes[child_index].parent = Some(parent);
        Ok(())
    }

    fn do_replace_child(
        &mut self,
        parent: NodeRef,
        new_child: NodeRef,
        old_child: NodeRef,
    ) -> Result<(), DomStoreError> {
        self.position(parent, old_child)?;
        self.prepare_insert(parent, new_child)?;
        let pos = self.position(parent, old_child)?;
        let parent_index = self.index(parent)?;
        self.nodes[parent_index].children[pos] = new_child;
        let new_index = self.index(new_child)?;
        self.nodes[new_index].parent = Some(parent);
        let old_index = self.index(old_child)?;
        self.nodes[old_index].parent = None;
        self.drop_subtree(old_child);
        Ok(())
    }

    fn do_remove_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), DomStoreError> {
        let pos = self.position(parent, child)?;
        let parent_index = self.index(parent)?;
        self.nodes[parent_index].children.remove(pos);
        self.drop_subtree(child);
        Ok(())
    }

    fn do_swap(&mut self, a: NodeRef, b: NodeRef, parent: NodeRef) -> Result<(), DomStoreError> {
        let pos_a = self.position(parent, a)?;
        let pos_b = self.position(parent, b)?;
        let parent_index = self.index(parent)?;
        self.nodes[parent_index].children.swap(pos_a, pos_b);
        Ok(())
    }

    fn write_attribute(
        &mut self,
        node: NodeRef,
        name: &str,
        value: Option<String>,
    ) -> Result<(), DomStoreError> {
        let NodeKind::Element { attributes, .. } = self.element_mut(node)? else {
            return Err(DomStoreError::WrongNodeKind(node));
        };
        let existing = attributes.iter().position(|(n, _)| &**n == name);
        match (existing, value) {
            (Some(pos), Some(value)) => attributes[pos].1 = value,
            (None, Some(value)) => attributes.push((Arc::from(name), value)),
            (Some(pos), None) => {
                attributes.remove(pos);
            }
            (None, None) => {}
        }
        Ok(())
    }

    fn do_set_property(
        &mut self,
        node: NodeRef,
        name: &str,
        value: &Value,
    ) -> Result<(), DomStoreError> {
        {
            let NodeKind::Element { properties, .. } = self.element_mut(node)? else {
                return Err(DomStoreError::WrongNodeKind(node));
            };
            match properties.iter_mut().find(|(n, _)| &**n == name) {
                Some((_, existing)) => *existing = value.clone(),
                None => properties.push((Arc::from(name), value.clone())),
            }
        }
        let attribute = if name == "className" { "class" } else { name };
        let reflected = match value {
            Value::Bool(true) => Some(String::new()),
            Value::Bool(false) => None,
            other => Some(other.to_attribute()),
        };
        self.write_attribute(node, attribute, reflected)
    }

    fn do_set_text(&mut self, node: NodeRef, text: &str) -> Result<(), DomStoreError> {
        let index = self.index(node)?;
        match &mut self.nodes[index].kind {
            NodeKind::Text { text: existing } => {
                existing.clear();
                existing.push_str(text);
                Ok(())
            }
            _ => Err(DomStoreError::WrongNodeKind(node)),
        }
    }

    fn do_set_style(
        &mut self,
        node: NodeRef,
        old: &StyleMap,
        new: &StyleMap,
    ) -> Result<(), DomStoreError> {
        let NodeKind::Element { style, .. } = self.element_mut(node)? else {
            return Err(DomStoreError::WrongNodeKind(node));
        };
        style.retain(|(k, _)| !old.contains_key(k.as_str()) || new.contains_key(k.as_str()));
        for (name, value) in new {
            match style.iter_mut().find(|(k, _)| k.as_str() == &**name) {
                Some((_, existing)) => existing.clone_from(value),
                None => style.push((name.to_string(), value.clone())),
            }
        }
        Ok(())
    }

    fn do_class(&mut self, node: NodeRef, class: &str, add: bool) -> Result<(), DomStoreError> {
        let mut classes = self.classes(node);
        self.element_mut(node)?;
        let present = classes.iter().any(|c| c == class);
        match (add, present) {
            (true, false) => classes.push(class.to_string()),
            (false, true) => classes.retain(|c| c != class),
            _ => return Ok(()),
        }
        let value = (!classes.is_empty()).then(|| classes.join(" "));
        self.write_attribute(node, "class", value)
    }

    fn style_of(&self, node: NodeRef) -> Vec<(String, String)> {
        match self.record(node).map(|r| &r.kind) {
            Ok(NodeKind::Element { style, .. }) => style.clone(),
            _ => Vec::new(),
        }
    }
}

impl Default for DomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationAdapter for DomStore {
    fn create_element(&mut self, tag: &str) -> Result<NodeRef, AdapterError> {
        self.check("create_element").map_err(|e| e.during("create_element"))?;
        let node = self.alloc(NodeKind::element(tag, None));
        self.journal.push(Op::CreateElement {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_element_ns(&mut self, namespace: &str, tag: &str) -> Result<NodeRef, AdapterError> {
        self.check("create_element_ns")
            .map_err(|e| e.during("create_element_ns"))?;
        let node = self.alloc(NodeKind::element(tag, Some(namespace)));
        self.journal.push(Op::CreateElementNs {
            node,
            namespace: namespace.to_string(),
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self, text: &str) -> Result<NodeRef, AdapterError> {
        self.check("create_text_node")
            .map_err(|e| e.during("create_text_node"))?;
        let node = self.alloc(NodeKind::Text {
            text: text.to_string(),
        });
        self.journal.push(Op::CreateText {
            node,
            text: text.to_string(),
        });
        Ok(node)
    }

    fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), AdapterError> {
        self.check("append_child")
            .and_then(|()| self.do_insert_before(parent, child, None))
            .map_err(|e| e.during("append_child"))?;
        self.journal.push(Op::AppendChild { parent, child });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeRef,
        child: NodeRef,
        before: Option<NodeRef>,
    ) -> Result<(), AdapterError> {
        self.check("insert_before")
            .and_then(|()| self.do_insert_before(parent, child, before))
            .map_err(|e| e.during("insert_before"))?;
        self.journal.push(Op::InsertBefore {
            parent,
            child,
            before,
        });
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent: NodeRef,
        new_child: NodeRef,
        old_child: NodeRef,
    ) -> Result<(), AdapterError> {
        self.check("replace_child")
            .and_then(|()| self.do_replace_child(parent, new_child, old_child))
            .map_err(|e| e.during("replace_child"))?;
        self.journal.push(Op::ReplaceChild {
            parent,
            new_child,
            old_child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), AdapterError> {
        self.check("remove_child")
            .and_then(|()| self.do_remove_child(parent, child))
            .map_err(|e| e.during("remove_child"))?;
        self.journal.push(Op::RemoveChild { parent, child });
        Ok(())
    }

    fn has_property(&self, node: NodeRef, name: &str) -> bool {
        matches!(
            self.record(node).map(|r| &r.kind),
            Ok(NodeKind::Element { namespace: None, .. })
        ) && self.properties.contains(name)
    }

    fn set_property(
        &mut self,
        node: NodeRef,
        name: &str,
        value: &Value,
    ) -> Result<(), AdapterError> {
        self.check("set_property")
            .and_then(|()| self.do_set_property(node, name, value))
            .map_err(|e| e.during("set_property"))?;
        self.journal.push(Op::SetProperty {
            node,
            name: name.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn set_attribute(
        &mut self,
        node: NodeRef,
        name: &str,
        value: &str,
    ) -> Result<(), AdapterError> {
        self.check("set_attribute")
            .and_then(|()| self.write_attribute(node, name, Some(value.to_string())))
            .map_err(|e| e.during("set_attribute"))?;
        self.journal.push(Op::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn set_attribute_ns(
        &mut self,
        node: NodeRef,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), AdapterError> {
        let result = self.check("set_attribute_ns").and_then(|()| {
            let NodeKind::Element { namespaced, .. } = self.element_mut(node)? else {
                return Err(DomStoreError::WrongNodeKind(node));
            };
            match namespaced
                .iter_mut()
                .find(|(ns, n, _)| &**ns == namespace && &**n == name)
            {
                Some((_, _, existing)) => *existing = value.to_string(),
                None => {
                    namespaced.push((Arc::from(namespace), Arc::from(name), value.to_string()))
                }
            }
            Ok(())
        });
        result.map_err(|e| e.during("set_attribute_ns"))?;
        self.journal.push(Op::SetAttributeNs {
            node,
            namespace: namespace.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeRef, name: &str) -> Result<(), AdapterError> {
        let result = self.check("remove_attribute").and_then(|()| {
            if let NodeKind::Element { properties, .. } = self.element_mut(node)? {
                properties.retain(|(n, _)| &**n != name);
            }
            self.write_attribute(node, name, None)
        });
        result.map_err(|e| e.during("remove_attribute"))?;
        self.journal.push(Op::RemoveAttribute {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_text_content(&mut self, node: NodeRef, text: &str) -> Result<(), AdapterError> {
        self.check("set_text_content")
            .and_then(|()| self.do_set_text(node, text))
            .map_err(|e| e.during("set_text_content"))?;
        self.journal.push(Op::SetText {
            node,
            text: text.to_string(),
        });
        Ok(())
    }

    fn set_inline_style(
        &mut self,
        node: NodeRef,
        old: &StyleMap,
        new: &StyleMap,
    ) -> Result<(), AdapterError> {
        self.check("set_inline_style")
            .and_then(|()| self.do_set_style(node, old, new))
            .map_err(|e| e.during("set_inline_style"))?;
        let style = self.style_of(node);
        self.journal.push(Op::SetStyle { node, style });
        Ok(())
    }

    fn add_class(&mut self, node: NodeRef, class: &str) -> Result<(), AdapterError> {
        self.check("add_class")
            .and_then(|()| self.do_class(node, class, true))
            .map_err(|e| e.during("add_class"))?;
        self.journal.push(Op::AddClass {
            node,
            class: class.to_string(),
        });
        Ok(())
    }

    fn remove_class(&mut self, node: NodeRef, class: &str) -> Result<(), AdapterError> {
        self.check("remove_class")
            .and_then(|()| self.do_class(node, class, false))
            .map_err(|e| e.during("remove_class"))?;
        self.journal.push(Op::RemoveClass {
            node,
            class: class.to_string(),
        });
        Ok(())
    }

    fn swap_dom_refs(
        &mut self,
        a: NodeRef,
        b: NodeRef,
        parent: NodeRef,
    ) -> Result<(), AdapterError> {
        self.check("swap_dom_refs")
            .and_then(|()| self.do_swap(a, b, parent))
            .map_err(|e| e.during("swap_dom_refs"))?;
        self.journal.push(Op::Swap { a, b });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), AdapterError> {
        self.check("flush").map_err(|e| e.during("flush"))?;
        self.journal.push(Op::Flush);
        Ok(())
    }
}

impl InspectionAdapter for DomStore {
    fn node_type(&self, node: NodeRef) -> Option<NodeType> {
        Some(match self.record(node).ok()?.kind {
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text { .. } => NodeType::Text,
            NodeKind::Root => NodeType::Other,
        })
    }

    /// Upper-cased for HTML elements, as a browser reports `tagName`.
    fn get_tag(&self, node: NodeRef) -> Option<String> {
        match &self.record(node).ok()?.kind {
            NodeKind::Element {
                tag,
                namespace: None,
                ..
            } => Some(tag.to_ascii_uppercase()),
            NodeKind::Element { tag, .. } => Some(tag.to_string()),
            NodeKind::Text { .. } => Some("#text".to_string()),
            NodeKind::Root => Some("#document".to_string()),
        }
    }

    fn get_text_content(&self, node: NodeRef) -> Option<String> {
        self.record(node).ok()?;
        Some(self.text_content(node))
    }

    fn get_attribute(&self, node: NodeRef, name: &str) -> Option<String> {
        match &self.record(node).ok()?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| &**n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn get_inline_style(&self, node: NodeRef, name: &str) -> Option<String> {
        match &self.record(node).ok()?.kind {
            NodeKind::Element { style, .. } => style
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.child_refs(node).to_vec()
    }

    fn get_root(&self) -> NodeRef {
        self.root
    }
}

struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Root | NodeKind::Element { .. })
    }
}

enum NodeKind {
    Root,
    Element {
        tag: Arc<str>,
        namespace: Option<Arc<str>>,
        attributes: Vec<(Arc<str>, String)>,
        namespaced: Vec<(Arc<str>, Arc<str>, String)>,
        properties: Vec<(Arc<str>, Value)>,
        style: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
}

impl NodeKind {
    fn element(tag: &str, namespace: Option<&str>) -> Self {
        NodeKind::Element {
            tag: Arc::from(tag),
            namespace: namespace.map(Arc::from),
            attributes: Vec::new(),
            namespaced: Vec::new(),
            properties: Vec::new(),
            style: Vec::new(),
        }
    }
}
