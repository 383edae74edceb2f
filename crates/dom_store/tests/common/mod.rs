#![allow(dead_code)]

use dom_store::DomStore;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use vdom::{
    Component, ComponentId, Element, Handler, InspectionAdapter, MountResolver, MutationAdapter,
    Node, NodeRef, Value,
};

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// Hook that appends `entry` to `log`.
pub fn record(log: &Log, entry: &str) -> impl Fn() + 'static {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    move || log.borrow_mut().push(entry.clone())
}

/// Event handler that appends `entry` to `log`.
pub fn handler(log: &Log, entry: &str) -> Handler {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    Handler::new(move |_event, _node| log.borrow_mut().push(entry.clone()))
}

/// `<ul>` of `<li>`s keyed and labelled by `keys`.
pub fn keyed_list(keys: &[&str]) -> Node {
    Element::new("ul")
        .children(keys.iter().map(|k| Element::new("li").key(*k).text(*k)))
        .into()
}

pub fn unkeyed_list(items: &[&str]) -> Node {
    Element::new("ul")
        .children(items.iter().map(|k| Element::new("li").text(*k)))
        .into()
}

/// Text of every child of `parent`, in backend order.
pub fn child_texts(store: &DomStore, parent: NodeRef) -> Vec<String> {
    store
        .child_refs(parent)
        .iter()
        .map(|&child| store.text_content(child))
        .collect()
}

/// The single element rendered under `mount`.
pub fn rendered_root(store: &DomStore, mount: NodeRef) -> NodeRef {
    let children = store.child_refs(mount);
    assert_eq!(children.len(), 1, "mount point should hold one node");
    children[0]
}

/// Builds backend nodes for `node` directly, the way server output would
/// arrive, and clears the journal afterwards.
pub fn prerender(store: &mut DomStore, parent: NodeRef, node: &Node) -> NodeRef {
    let created = build(store, node);
    store.append_child(parent, created).expect("append prerendered node");
    store.clear_journal();
    created
}

fn build(store: &mut DomStore, node: &Node) -> NodeRef {
    match node {
        Node::Text(text) => store.create_text_node(text).expect("create text"),
        Node::Element(el) => {
            let created = match el.namespace.uri() {
                Some(ns) => store.create_element_ns(ns, &el.tag),
                None => store.create_element(&el.tag),
            }
            .expect("create element");
            for (name, value) in &el.props {
                let text = match value {
                    Value::Bool(true) => String::new(),
                    Value::Bool(false) => continue,
                    other => other.to_attribute(),
                };
                store.set_attribute(created, name, &text).expect("set attribute");
            }
            for class in &el.classes {
                store.add_class(created, class).expect("add class");
            }
            if !el.style.is_empty() {
                store
                    .set_inline_style(created, &Default::default(), &el.style)
                    .expect("set style");
            }
            for child in &el.children {
                let built = build(store, child);
                store.append_child(created, built).expect("append child");
            }
            created
        }
        Node::Component(_) => panic!("prerender does not expand components"),
    }
}

/// Component host that resolves inside `mount` with a fresh tree from `view`.
pub struct SyncHost {
    view: Box<dyn Fn() -> Node>,
    next_id: Cell<u32>,
    pub mounted: RefCell<Vec<ComponentId>>,
    pub unmounted: RefCell<Vec<ComponentId>>,
}

impl SyncHost {
    pub fn new(view: impl Fn() -> Node + 'static) -> Rc<Self> {
        Rc::new(Self {
            view: Box::new(view),
            next_id: Cell::new(1),
            mounted: RefCell::new(Vec::new()),
            unmounted: RefCell::new(Vec::new()),
        })
    }
}

impl Component for SyncHost {
    fn mount(&self, _parent: NodeRef, resolver: MountResolver) {
        let id = ComponentId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.mounted.borrow_mut().push(id);
        resolver.resolve(id, (self.view)());
    }

    fn unmount(&self, id: ComponentId) {
        self.unmounted.borrow_mut().push(id);
    }
}

/// Component host that keeps resolvers until the test resolves them.
#[derive(Default)]
pub struct DeferredHost {
    pub waiting: RefCell<Vec<MountResolver>>,
    pub unmounted: RefCell<Vec<ComponentId>>,
}

impl DeferredHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Resolves the oldest waiting mount with `child`.
    pub fn resolve_next(&self, id: u32, child: impl Into<Node>) {
        let resolver = self.waiting.borrow_mut().remove(0);
        resolver.resolve(ComponentId(id), child);
    }
}

impl Component for DeferredHost {
    fn mount(&self, _parent: NodeRef, resolver: MountResolver) {
        self.waiting.borrow_mut().push(resolver);
    }

    fn unmount(&self, id: ComponentId) {
        self.unmounted.borrow_mut().push(id);
    }
}

pub fn tag_of(store: &DomStore, node: NodeRef) -> String {
    store.get_tag(node).unwrap_or_default().to_ascii_lowercase()
}
