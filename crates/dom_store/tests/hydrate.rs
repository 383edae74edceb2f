mod common;

use common::{SyncHost, entries, log, prerender, rendered_root, tag_of};
use dom_store::{DomStore, Op};
use log::LevelFilter;
use std::rc::Rc;
use vdom::{ComponentId, ComponentNode, Element, Mount, Node, VTree};

fn article(title: &str) -> Node {
    Element::new("article")
        .prop("id", "post")
        .class("card")
        .child(Element::new("h1").text(title))
        .child(Element::new("p").text("body"))
        .into()
}

fn setup_with(prerendered: &Node) -> (DomStore, Mount) {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    prerender(&mut store, point, prerendered);
    (store, Mount::new(point))
}

#[test]
fn matching_markup_is_adopted_without_mutations() {
    let (mut store, mut mount) = setup_with(&article("hello"));
    let existing = rendered_root(&store, mount.point());

    let adopted = mount
        .hydrate(article("hello"), &mut store, LevelFilter::Warn)
        .unwrap();
    assert!(adopted);
    assert!(store.journal().is_empty());
    assert_eq!(rendered_root(&store, mount.point()), existing);
    let bound = mount
        .with_tree(|tree, root| root.and_then(|root| tree.try_dom_ref(root)))
        .unwrap();
    assert_eq!(bound, Some(existing));
}

#[test]
fn updates_after_hydration_patch_the_adopted_nodes() {
    let (mut store, mut mount) = setup_with(&article("hello"));
    let heading = store.child_refs(rendered_root(&store, mount.point()))[0];
    let heading_text = store.child_refs(heading)[0];
    assert!(
        mount
            .hydrate(article("hello"), &mut store, LevelFilter::Off)
            .unwrap()
    );

    mount.render(Some(article("bye")), &mut store).unwrap();
    assert_eq!(
        store.take_journal(),
        vec![
            Op::SetText {
                node: heading_text,
                text: "bye".to_string(),
            },
            Op::Flush,
        ]
    );
}

#[test]
fn adjacent_text_children_bind_to_one_backend_text_node() {
    let (mut store, mut mount) = setup_with(&Element::new("p").text("Hello, world").into());
    let view = Element::new("p").text("Hello, ").text("world");

    assert!(
        mount
            .hydrate(view.into(), &mut store, LevelFilter::Warn)
            .unwrap()
    );
    let children = mount
        .with_tree(|tree, root| root.map(|root| tree.children(root).len()))
        .unwrap();
    assert_eq!(children, Some(1));
}

#[test]
fn three_text_fragments_bind_to_one_backend_text_node() {
    let (mut store, mut mount) = setup_with(&Element::new("p").text("abc").into());
    let view = Element::new("p").text("a").text("b").text("c");

    assert!(
        mount
            .hydrate(view.into(), &mut store, LevelFilter::Warn)
            .unwrap()
    );
    assert!(store.journal().is_empty());
    let text = mount
        .with_tree(|tree, root| {
            let root = root.unwrap();
            assert_eq!(tree.children(root).len(), 1);
            tree.text(tree.children(root)[0]).map(str::to_string)
        })
        .unwrap();
    assert_eq!(text.as_deref(), Some("abc"));
}

#[test]
fn failed_hydration_empties_the_mount_point_and_clears_refs() {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    prerender(&mut store, point, &article("server"));
    let mut tree = VTree::new();
    let root = tree.insert(article("client"));
    let heading = tree.children(root)[0];

    let ok = vdom::hydrate(LevelFilter::Off, Some(point), &mut tree, Some(root), &mut store)
        .unwrap();
    assert!(!ok);
    assert!(store.child_refs(point).is_empty());
    assert!(tree.try_dom_ref(root).is_none());
    assert!(tree.try_dom_ref(heading).is_none());
}

#[test]
fn hydrating_without_a_mount_point_reports_false() {
    let mut store = DomStore::new();
    let mut tree = VTree::new();
    let root = tree.insert(article("client"));
    let ok = vdom::hydrate(LevelFilter::Off, None, &mut tree, Some(root), &mut store).unwrap();
    assert!(!ok);
    assert!(store.journal().is_empty());
}

#[test]
fn text_is_compared_ignoring_surrounding_whitespace() {
    let (mut store, mut mount) = setup_with(&Element::new("p").text("  padded \n").into());
    assert!(
        mount
            .hydrate(Element::new("p").text("padded").into(), &mut store, LevelFilter::Warn)
            .unwrap()
    );
}

#[test]
fn mismatch_falls_back_to_a_full_create() {
    let (mut store, mut mount) = setup_with(&article("server"));
    let stale = rendered_root(&store, mount.point());

    let adopted = mount
        .hydrate(article("client"), &mut store, LevelFilter::Off)
        .unwrap();
    assert!(!adopted);
    let fresh = rendered_root(&store, mount.point());
    assert_ne!(fresh, stale);
    assert!(!store.contains(stale));
    assert!(store.journal().iter().any(Op::is_create));
    assert_eq!(
        store.inner_markup(mount.point()),
        "<article id=\"post\" class=\"card\"><h1>client</h1><p>body</p></article>"
    );
}

#[test]
fn extra_backend_children_are_a_mismatch() {
    let prerendered: Node = Element::new("ul")
        .child(Element::new("li").text("a"))
        .child(Element::new("li").text("b"))
        .child(Element::new("li").text("c"))
        .into();
    let (mut store, mut mount) = setup_with(&prerendered);
    let view = Element::new("ul")
        .child(Element::new("li").text("a"))
        .child(Element::new("li").text("b"));

    assert!(
        !mount
            .hydrate(view.into(), &mut store, LevelFilter::Off)
            .unwrap()
    );
    let ul = rendered_root(&store, mount.point());
    assert_eq!(store.child_refs(ul).len(), 2);
}

#[test]
fn tag_mismatch_at_the_root_is_detected() {
    let (mut store, mut mount) = setup_with(&Element::new("section").into());
    assert!(
        !mount
            .hydrate(Element::new("div").into(), &mut store, LevelFilter::Off)
            .unwrap()
    );
    assert_eq!(tag_of(&store, rendered_root(&store, mount.point())), "div");
}

#[test]
fn synchronous_components_are_mounted_while_hydrating() {
    let prerendered: Node = Element::new("div")
        .child(Element::new("span").text("inside"))
        .into();
    let (mut store, mut mount) = setup_with(&prerendered);
    let span = store.child_refs(rendered_root(&store, mount.point()))[0];
    let host = SyncHost::new(|| Element::new("span").text("inside").into());
    let log = log();
    let mounted_at = Rc::new(std::cell::Cell::new(None));
    let view = Element::new("div").child(
        ComponentNode::new(host.clone())
            .on_before_mount(common::record(&log, "before_mount"))
            .on_mount({
                let mounted_at = Rc::clone(&mounted_at);
                move |node| mounted_at.set(Some(node))
            }),
    );

    assert!(
        mount
            .hydrate(view.into(), &mut store, LevelFilter::Warn)
            .unwrap()
    );
    assert!(store.journal().is_empty());
    assert_eq!(*host.mounted.borrow(), [ComponentId(1)]);
    assert_eq!(entries(&log), ["before_mount"]);
    assert_eq!(mounted_at.get(), Some(span));
}

#[test]
fn rollback_unmounts_components_mounted_during_the_walk() {
    let prerendered: Node = Element::new("div")
        .child(Element::new("span").text("inside"))
        .child(Element::new("p").text("server"))
        .into();
    let (mut store, mut mount) = setup_with(&prerendered);
    let host = SyncHost::new(|| Element::new("span").text("inside").into());
    let view = Element::new("div")
        .child(ComponentNode::new(host.clone()))
        .child(Element::new("p").text("client"));

    assert!(
        !mount
            .hydrate(view.into(), &mut store, LevelFilter::Off)
            .unwrap()
    );
    assert_eq!(*host.mounted.borrow(), [ComponentId(1), ComponentId(2)]);
    assert_eq!(*host.unmounted.borrow(), [ComponentId(1)]);
    assert_eq!(
        store.inner_markup(mount.point()),
        "<div><span>inside</span><p>client</p></div>"
    );
}

#[test]
fn empty_mount_point_is_filled_by_create() {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    let mut mount = Mount::new(point);
    assert!(
        !mount
            .hydrate(article("fresh"), &mut store, LevelFilter::Off)
            .unwrap()
    );
    assert_eq!(tag_of(&store, rendered_root(&store, point)), "article");
}

#[test]
fn hydrating_a_rendered_mount_renders_instead() {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    let mut mount = Mount::new(point);
    mount.render(Some(article("one")), &mut store).unwrap();
    let existing = rendered_root(&store, point);

    assert!(
        !mount
            .hydrate(article("two"), &mut store, LevelFilter::Off)
            .unwrap()
    );
    assert_eq!(rendered_root(&store, point), existing);
    assert_eq!(
        store.inner_markup(point),
        "<article id=\"post\" class=\"card\"><h1>two</h1><p>body</p></article>"
    );
}
