//! Tree descriptions built by application code on every render pass.
//!
//! A `Node` is a plain owned value. The reconciler ingests it into a
//! [`VTree`](crate::VTree) arena before diffing, so descriptions never carry
//! backend references or parent links themselves.

use crate::adapter::Event;
use crate::component::Component;
use core_types::NodeRef;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

pub type PropMap = BTreeMap<Arc<str>, Value>;
pub type ClassSet = BTreeSet<Arc<str>>;
pub type StyleMap = BTreeMap<Arc<str>, String>;

pub type Hook = Rc<dyn Fn()>;
pub type RefHook = Rc<dyn Fn(NodeRef)>;
pub type Callback = Rc<dyn Fn(&Event, NodeRef)>;

/// Sibling identity supplied by the application.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Arc<str>);

impl Key {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Key(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key(Arc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key(Arc::from(value))
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key(Arc::from(value.to_string()))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key(Arc::from(value.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Plain `createElement`.
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn uri(self) -> Option<&'static str> {
        match self {
            Namespace::Html => None,
            Namespace::Svg => Some(SVG_NAMESPACE),
            Namespace::MathMl => Some(MATHML_NAMESPACE),
        }
    }
}

/// Property value as the application declares it.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(Arc<str>),
    Bool(bool),
    Num(f64),
}

impl Value {
    /// Text used when the value goes through the generic attribute setter.
    pub fn to_attribute(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Num(n) => format!("{n}"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Num(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Num(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Num(f64::from(value))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

/// Event handler attached to an element for one event name and phase.
#[derive(Clone)]
pub struct Handler {
    pub options: HandlerOptions,
    callback: Callback,
}

impl Handler {
    pub fn new(callback: impl Fn(&Event, NodeRef) + 'static) -> Self {
        Self {
            options: HandlerOptions::default(),
            callback: Rc::new(callback),
        }
    }

    pub fn prevent_default(mut self) -> Self {
        self.options.prevent_default = true;
        self
    }

    pub fn stop_propagation(mut self) -> Self {
        self.options.stop_propagation = true;
        self
    }

    pub fn run(&self, event: &Event, node: NodeRef) {
        (self.callback)(event, node);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default)]
pub struct EventTable {
    pub captures: HashMap<Arc<str>, Handler>,
    pub bubbles: HashMap<Arc<str>, Handler>,
}

impl EventTable {
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty() && self.bubbles.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct ElementHooks {
    pub before_create: Option<Hook>,
    pub on_create: Option<RefHook>,
    pub before_destroy: Option<Hook>,
    pub on_destroy: Option<Hook>,
}

#[derive(Clone, Default)]
pub struct ComponentHooks {
    pub before_mount: Option<Hook>,
    pub on_mount: Option<RefHook>,
    pub before_unmount: Option<Hook>,
    pub on_unmount: Option<RefHook>,
}

impl fmt::Debug for ElementHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHooks")
            .field("before_create", &self.before_create.is_some())
            .field("on_create", &self.on_create.is_some())
            .field("before_destroy", &self.before_destroy.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

impl fmt::Debug for ComponentHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHooks")
            .field("before_mount", &self.before_mount.is_some())
            .field("on_mount", &self.on_mount.is_some())
            .field("before_unmount", &self.before_unmount.is_some())
            .field("on_unmount", &self.on_unmount.is_some())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum Node {
    Text(String),
    Element(Element),
    Component(ComponentNode),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(text.into())
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            Node::Text(_) => None,
            Node::Element(element) => element.key.as_ref(),
            Node::Component(component) => component.key.as_ref(),
        }
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl From<ComponentNode> for Node {
    fn from(value: ComponentNode) -> Self {
        Node::Component(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

#[derive(Clone)]
pub struct Element {
    pub tag: Arc<str>,
    pub namespace: Namespace,
    pub key: Option<Key>,
    pub props: PropMap,
    pub classes: ClassSet,
    pub style: StyleMap,
    pub children: Vec<Node>,
    pub events: EventTable,
    pub hooks: ElementHooks,
    /// Custom paint callback, run for `canvas` elements after each create or update.
    pub draw: Option<RefHook>,
}

impl Element {
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self {
            tag: tag.into(),
            namespace: Namespace::Html,
            key: None,
            props: PropMap::new(),
            classes: ClassSet::new(),
            style: StyleMap::new(),
            children: Vec::new(),
            events: EventTable::default(),
            hooks: ElementHooks::default(),
            draw: None,
        }
    }

    pub fn svg(tag: impl Into<Arc<str>>) -> Self {
        Self::new(tag).namespace(Namespace::Svg)
    }

    pub fn mathml(tag: impl Into<Arc<str>>) -> Self {
        Self::new(tag).namespace(Namespace::MathMl)
    }

    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prop(mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Adds every whitespace-separated class in `classes`.
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_ascii_whitespace().map(Arc::from));
        self
    }

    pub fn style(mut self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn on(mut self, name: impl Into<Arc<str>>, handler: Handler) -> Self {
        self.events.bubbles.insert(name.into(), handler);
        self
    }

    pub fn on_capture(mut self, name: impl Into<Arc<str>>, handler: Handler) -> Self {
        self.events.captures.insert(name.into(), handler);
        self
    }

    pub fn on_before_create(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.before_create = Some(Rc::new(hook));
        self
    }

    pub fn on_create(mut self, hook: impl Fn(NodeRef) + 'static) -> Self {
        self.hooks.on_create = Some(Rc::new(hook));
        self
    }

    pub fn on_before_destroy(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.before_destroy = Some(Rc::new(hook));
        self
    }

    pub fn on_destroy(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.on_destroy = Some(Rc::new(hook));
        self
    }

    pub fn draw(mut self, draw: impl Fn(NodeRef) + 'static) -> Self {
        self.draw = Some(Rc::new(draw));
        self
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("namespace", &self.namespace)
            .field("key", &self.key)
            .field("props", &self.props)
            .field("classes", &self.classes)
            .field("style", &self.style)
            .field("children", &self.children)
            .field("events", &self.events)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Placeholder for a subtree owned by a component host.
#[derive(Clone)]
pub struct ComponentNode {
    pub key: Option<Key>,
    pub host: Rc<dyn Component>,
    /// When false, bubbling stops at this component.
    pub event_propagation: bool,
    pub hooks: ComponentHooks,
}

impl ComponentNode {
    pub fn new(host: Rc<dyn Component>) -> Self {
        Self {
            key: None,
            host,
            event_propagation: true,
            hooks: ComponentHooks::default(),
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn event_propagation(mut self, enabled: bool) -> Self {
        self.event_propagation = enabled;
        self
    }

    pub fn on_before_mount(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.before_mount = Some(Rc::new(hook));
        self
    }

    pub fn on_mount(mut self, hook: impl Fn(NodeRef) + 'static) -> Self {
        self.hooks.on_mount = Some(Rc::new(hook));
        self
    }

    pub fn on_before_unmount(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.before_unmount = Some(Rc::new(hook));
        self
    }

    pub fn on_unmount(mut self, hook: impl Fn(NodeRef) + 'static) -> Self {
        self.hooks.on_unmount = Some(Rc::new(hook));
        self
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("key", &self.key)
            .field("event_propagation", &self.event_propagation)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_splits_on_whitespace() {
        let el = Element::new("div").class("  a b\tc  ").class("a");
        let names: Vec<&str> = el.classes.iter().map(|c| &**c).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn attribute_text_of_values() {
        assert_eq!(Value::from("x").to_attribute(), "x");
        assert_eq!(Value::from(true).to_attribute(), "true");
        assert_eq!(Value::from(10i32).to_attribute(), "10");
        assert_eq!(Value::from(1.5).to_attribute(), "1.5");
    }

    #[test]
    fn namespace_uris() {
        assert_eq!(Namespace::Html.uri(), None);
        assert_eq!(Namespace::Svg.uri(), Some(SVG_NAMESPACE));
        assert_eq!(Namespace::MathMl.uri(), Some(MATHML_NAMESPACE));
    }

    #[test]
    fn keys_from_numbers_and_strings_compare_by_text() {
        assert_eq!(Key::from(7u32), Key::from("7"));
        assert_eq!(Node::from(Element::new("li").key("a")).key(), Some(&Key::from("a")));
        assert_eq!(Node::text("t").key(), None);
    }
}
