mod common;

use common::rendered_root;
use dom_store::DomStore;
use std::sync::Arc;
use url::Url;
use vdom::types::StyleMap;
use vdom::{Element, IntegrityOptions, Mount, MutationAdapter, Node};

fn rendered(view: impl Into<Node>) -> (DomStore, Mount) {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    let mut mount = Mount::new(point);
    mount.render(Some(view.into()), &mut store).unwrap();
    (store, mount)
}

fn check(store: &DomStore, mount: &Mount, options: &IntegrityOptions) -> bool {
    mount.integrity_check(store, options).unwrap()
}

fn style(name: &str, value: &str) -> StyleMap {
    StyleMap::from([(Arc::from(name), value.to_string())])
}

#[test]
fn freshly_rendered_trees_pass() {
    let view = Element::new("form")
        .prop("id", "signup")
        .prop("disabled", false)
        .class("wide dark")
        .style("margin", "0")
        .child(Element::new("input").prop("checked", true).prop("value", "x"))
        .child(Element::new("label").text("Name"));
    let (store, mount) = rendered(view);
    assert!(check(&store, &mount, &IntegrityOptions::default()));
}

#[test]
fn tampered_attributes_and_text_fail() {
    let view = Element::new("div")
        .prop("title", "t")
        .child(Element::new("span").text("x"));
    let (mut store, mount) = rendered(view);
    let div = rendered_root(&store, mount.point());
    let text = store.child_refs(store.child_refs(div)[0])[0];

    store.set_attribute(div, "title", "changed").unwrap();
    assert!(!check(&store, &mount, &IntegrityOptions::default()));
    store.set_attribute(div, "title", "t").unwrap();
    assert!(check(&store, &mount, &IntegrityOptions::default()));

    store.set_text_content(text, "y").unwrap();
    assert!(!check(&store, &mount, &IntegrityOptions::default()));
}

#[test]
fn extra_backend_children_fail() {
    let (mut store, mount) = rendered(Element::new("ul").child(Element::new("li")));
    let ul = rendered_root(&store, mount.point());
    let stray = store.create_element("li").unwrap();
    store.append_child(ul, stray).unwrap();
    assert!(!check(&store, &mount, &IntegrityOptions::default()));
}

#[test]
fn colors_compare_by_value_not_spelling() {
    let (mut store, mount) = rendered(Element::new("p").style("color", "#f00"));
    let p = rendered_root(&store, mount.point());

    store
        .set_inline_style(p, &StyleMap::new(), &style("color", "rgb(255, 0, 0)"))
        .unwrap();
    assert!(check(&store, &mount, &IntegrityOptions::default()));

    store
        .set_inline_style(p, &StyleMap::new(), &style("color", "rgb(0, 0, 255)"))
        .unwrap();
    assert!(!check(&store, &mount, &IntegrityOptions::default()));
}

#[test]
fn relative_urls_match_absolute_ones_under_the_origin() {
    let (mut store, mount) = rendered(Element::new("a").prop("href", "/docs"));
    let link = rendered_root(&store, mount.point());
    store
        .set_attribute(link, "href", "https://example.com/docs")
        .unwrap();

    assert!(!check(&store, &mount, &IntegrityOptions::default()));
    let origin = Url::parse("https://example.com").unwrap();
    let options = IntegrityOptions::default().with_origin(origin);
    assert!(check(&store, &mount, &options));
}

#[test]
fn numeric_attributes_ignore_units() {
    let (mut store, mount) = rendered(Element::new("img").prop("width", 10));
    let img = rendered_root(&store, mount.point());
    store.set_attribute(img, "width", "10px").unwrap();
    assert!(check(&store, &mount, &IntegrityOptions::default()));

    store.set_attribute(img, "width", "12px").unwrap();
    assert!(!check(&store, &mount, &IntegrityOptions::default()));
}

#[test]
fn class_order_does_not_matter() {
    let (mut store, mount) = rendered(Element::new("div").class("a b"));
    let div = rendered_root(&store, mount.point());
    store.set_attribute(div, "class", "b  a").unwrap();
    assert!(check(&store, &mount, &IntegrityOptions::default()));

    store.set_attribute(div, "class", "a").unwrap();
    assert!(!check(&store, &mount, &IntegrityOptions::default()));
}

#[test]
fn empty_mounts_trivially_pass() {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    let mount = Mount::new(point);
    assert!(check(&store, &mount, &IntegrityOptions::default()));
}
