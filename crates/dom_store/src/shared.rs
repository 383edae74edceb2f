use crate::DomStore;
use core_types::NodeRef;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use vdom::{Delivery, Event, EventAdapter, Listener, Value};

struct Registered {
    node: NodeRef,
    name: Arc<str>,
    capture: bool,
    listener: Listener,
}

/// A [`DomStore`] plus the listener table delegated dispatch needs.
///
/// Listeners are invoked with no store borrow held, so they may inspect or
/// mutate the store themselves.
pub struct SharedDom {
    store: RefCell<DomStore>,
    listeners: RefCell<Vec<Registered>>,
    prevented: RefCell<HashSet<u64>>,
    next_stamp: Cell<u64>,
}

impl SharedDom {
    pub fn new(store: DomStore) -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(store),
            listeners: RefCell::new(Vec::new()),
            prevented: RefCell::new(HashSet::new()),
            next_stamp: Cell::new(1),
        })
    }

    pub fn store(&self) -> Ref<'_, DomStore> {
        self.store.borrow()
    }

    pub fn store_mut(&self) -> RefMut<'_, DomStore> {
        self.store.borrow_mut()
    }

    pub fn listener_count(&self, node: NodeRef) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.node == node)
            .count()
    }

    pub fn event(&self, name: &str, target: NodeRef) -> Event {
        let stamp = self.next_stamp.get();
        self.next_stamp.set(stamp + 1);
        Event {
            name: Arc::from(name),
            target: Some(target),
            stamp,
            detail: None,
        }
    }

    pub fn is_prevented(&self, event: &Event) -> bool {
        self.prevented.borrow().contains(&event.stamp)
    }

    /// Fires `name` at `target`: capture listeners from the root down, then
    /// bubble listeners from the target up.
    pub fn fire(&self, target: NodeRef, name: &str) -> Event {
        let event = self.event(name, target);
        self.deliver(target, &name.into(), Delivery::Single(event.clone()));
        event
    }

    pub fn fire_with_detail(&self, target: NodeRef, name: &str, detail: Value) -> Event {
        let mut event = self.event(name, target);
        event.detail = Some(detail);
        self.deliver(target, &name.into(), Delivery::Single(event.clone()));
        event
    }

    /// Delivers `events` as one batch along the path of the first event's target.
    pub fn fire_batch(&self, events: Vec<Event>) {
        let Some(first) = events.first() else {
            return;
        };
        let Some(target) = first.target else {
            return;
        };
        let name = first.name.clone();
        self.deliver(target, &name, Delivery::Batch(events));
    }

    fn deliver(&self, target: NodeRef, name: &Arc<str>, delivery: Delivery) {
        let path: Vec<NodeRef> = {
            let store = self.store.borrow();
            let mut path = vec![target];
            let mut current = target;
            while let Some(parent) = store.parent(current) {
                path.push(parent);
                current = parent;
            }
            path
        };
        let pick = |node: NodeRef, capture: bool| -> Vec<Listener> {
            self.listeners
                .borrow()
                .iter()
                .filter(|r| r.node == node && r.capture == capture && r.name == *name)
                .map(|r| Rc::clone(&r.listener))
                .collect()
        };
        let mut queue: Vec<Listener> = Vec::new();
        for &node in path.iter().rev() {
            queue.extend(pick(node, true));
        }
        for &node in &path {
            queue.extend(pick(node, false));
        }
        for listener in queue {
            listener(&delivery);
        }
    }
}

impl EventAdapter for SharedDom {
    fn add_event_listener(&self, node: NodeRef, name: &str, listener: Listener, capture: bool) {
        self.listeners.borrow_mut().push(Registered {
            node,
            name: Arc::from(name),
            capture,
            listener,
        });
    }

    fn remove_event_listener(&self, node: NodeRef, name: &str, listener: &Listener, capture: bool) {
        self.listeners.borrow_mut().retain(|r| {
            !(r.node == node
                && &*r.name == name
                && r.capture == capture
                && Rc::ptr_eq(&r.listener, listener))
        });
    }

    fn get_target(&self, event: &Event) -> Option<NodeRef> {
        event.target
    }

    fn parent_node(&self, node: NodeRef) -> Option<NodeRef> {
        self.store.borrow().parent(node)
    }

    fn prevent_default(&self, event: &Event) {
        self.prevented.borrow_mut().insert(event.stamp);
    }
}
