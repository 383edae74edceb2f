//! Backend adapter contracts.
//!
//! The reconciler never touches a concrete widget tree. Every mutation,
//! inspection and listener registration goes through one of these traits.
//!
//! Invariants:
//! - Backend handles are opaque; `NodeRef::INVALID` is never returned by a backend.
//! - `insert_before` with `before == None` appends.
//! - `insert_before`/`append_child` on a node that already has a parent moves it.
//! - `replace_child` and `remove_child` detach the old node; the reconciler never
//!   reuses a detached node afterwards.
//! - `swap_dom_refs` reorders two live siblings without removing either.

use crate::error::AdapterError;
use crate::types::{StyleMap, Value};
use core_types::NodeRef;
use std::rc::Rc;
use std::sync::Arc;

pub trait MutationAdapter {
    fn create_element(&mut self, tag: &str) -> Result<NodeRef, AdapterError>;
    fn create_element_ns(&mut self, namespace: &str, tag: &str) -> Result<NodeRef, AdapterError>;
    fn create_text_node(&mut self, text: &str) -> Result<NodeRef, AdapterError>;
    fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), AdapterError>;
    fn insert_before(
        &mut self,
        parent: NodeRef,
        child: NodeRef,
        before: Option<NodeRef>,
    ) -> Result<(), AdapterError>;
    fn replace_child(
        &mut self,
        parent: NodeRef,
        new_child: NodeRef,
        old_child: NodeRef,
    ) -> Result<(), AdapterError>;
    fn remove_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), AdapterError>;
    /// Whether `name` is a directly settable (reflected) property of `node`.
    fn has_property(&self, node: NodeRef, name: &str) -> bool;
    fn set_property(&mut self, node: NodeRef, name: &str, value: &Value)
    -> Result<(), AdapterError>;
    fn set_attribute(&mut self, node: NodeRef, name: &str, value: &str)
    -> Result<(), AdapterError>;
    fn set_attribute_ns(
        &mut self,
        node: NodeRef,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), AdapterError>;
    fn remove_attribute(&mut self, node: NodeRef, name: &str) -> Result<(), AdapterError>;
    fn set_text_content(&mut self, node: NodeRef, text: &str) -> Result<(), AdapterError>;
    fn set_inline_style(
        &mut self,
        node: NodeRef,
        old: &StyleMap,
        new: &StyleMap,
    ) -> Result<(), AdapterError>;
    fn add_class(&mut self, node: NodeRef, class: &str) -> Result<(), AdapterError>;
    fn remove_class(&mut self, node: NodeRef, class: &str) -> Result<(), AdapterError>;
    fn swap_dom_refs(&mut self, a: NodeRef, b: NodeRef, parent: NodeRef)
    -> Result<(), AdapterError>;
    /// End-of-pass hook, called once per `diff`.
    fn flush(&mut self) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Text,
    Other,
}

/// Read-only view of the backend, used by hydration and the integrity check.
pub trait InspectionAdapter {
    fn node_type(&self, node: NodeRef) -> Option<NodeType>;
    /// Tag name of an element, `#text` for text nodes.
    fn get_tag(&self, node: NodeRef) -> Option<String>;
    fn get_text_content(&self, node: NodeRef) -> Option<String>;
    fn get_attribute(&self, node: NodeRef, name: &str) -> Option<String>;
    fn get_inline_style(&self, node: NodeRef, name: &str) -> Option<String>;
    fn children(&self, node: NodeRef) -> Vec<NodeRef>;
    fn first_child(&self, node: NodeRef) -> Option<NodeRef> {
        self.children(node).first().copied()
    }
    fn last_child(&self, node: NodeRef) -> Option<NodeRef> {
        self.children(node).last().copied()
    }
    fn get_root(&self) -> NodeRef;
}

/// Backend event as seen by the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub name: Arc<str>,
    pub target: Option<NodeRef>,
    /// Backend-assigned identity, used to route `prevent_default`.
    pub stamp: u64,
    pub detail: Option<Value>,
}

/// What a delegated listener receives: one event or a batch dispatched one by one.
#[derive(Clone, Debug)]
pub enum Delivery {
    Single(Event),
    Batch(Vec<Event>),
}

impl Delivery {
    pub fn events(&self) -> &[Event] {
        match self {
            Delivery::Single(event) => std::slice::from_ref(event),
            Delivery::Batch(events) => events,
        }
    }
}

pub type Listener = Rc<dyn Fn(&Delivery)>;

pub trait EventAdapter {
    fn add_event_listener(&self, node: NodeRef, name: &str, listener: Listener, capture: bool);
    /// Removes a listener previously added with the same `Rc` (pointer identity).
    fn remove_event_listener(&self, node: NodeRef, name: &str, listener: &Listener, capture: bool);
    fn get_target(&self, event: &Event) -> Option<NodeRef>;
    fn parent_node(&self, node: NodeRef) -> Option<NodeRef>;
    fn is_equal(&self, a: NodeRef, b: NodeRef) -> bool {
        a == b
    }
    fn prevent_default(&self, event: &Event);
}
