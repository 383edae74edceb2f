mod common;

use common::{child_texts, keyed_list, rendered_root};
use dom_store::{DomStore, Op};
use serde::Deserialize;
use std::collections::HashMap;
use vdom::{Mount, NodeRef};

#[derive(Debug, Deserialize)]
struct KeyedFixtures {
    case: Vec<KeyedCase>,
}

#[derive(Debug, Deserialize)]
struct KeyedCase {
    name: String,
    old: Vec<String>,
    new: Vec<String>,
    #[serde(default)]
    moves: Option<usize>,
}

fn load_cases() -> Vec<KeyedCase> {
    let fixtures: KeyedFixtures = toml::from_str(include_str!("fixtures/keyed_cases.toml"))
        .unwrap_or_else(|err| panic!("failed to parse keyed fixtures: {err}"));
    fixtures.case
}

fn refs_by_key(store: &DomStore, ul: NodeRef) -> HashMap<String, NodeRef> {
    store
        .child_refs(ul)
        .iter()
        .map(|&li| (store.text_content(li), li))
        .collect()
}

fn strs(keys: &[String]) -> Vec<&str> {
    keys.iter().map(String::as_str).collect()
}

#[test]
fn keyed_fixtures_reorder_without_recreating() {
    for case in load_cases() {
        let mut store = DomStore::new();
        let point = store.mount_point("main");
        let mut mount = Mount::new(point);
        mount
            .render(Some(keyed_list(&strs(&case.old))), &mut store)
            .unwrap();
        let ul = rendered_root(&store, point);
        let before = refs_by_key(&store, ul);
        store.clear_journal();

        mount
            .render(Some(keyed_list(&strs(&case.new))), &mut store)
            .unwrap();
        assert_eq!(rendered_root(&store, point), ul, "[{}] list was replaced", case.name);
        assert_eq!(child_texts(&store, ul), case.new, "[{}] child order", case.name);

        let after = refs_by_key(&store, ul);
        for key in case.new.iter().filter(|k| before.contains_key(*k)) {
            assert_eq!(
                before[key], after[key],
                "[{}] {key} lost its backend node",
                case.name
            );
        }

        let journal = store.take_journal();
        let created = journal
            .iter()
            .filter(|op| matches!(op, Op::CreateElement { tag, .. } if tag == "li"))
            .count();
        let expected_creates = case.new.iter().filter(|k| !before.contains_key(*k)).count();
        assert_eq!(created, expected_creates, "[{}] creates", case.name);

        let removed = journal
            .iter()
            .filter(|op| matches!(op, Op::RemoveChild { parent, .. } if *parent == ul))
            .count();
        let expected_removes = case.old.iter().filter(|k| !case.new.contains(k)).count();
        assert_eq!(removed, expected_removes, "[{}] removes", case.name);

        if let Some(moves) = case.moves {
            let old_refs: Vec<NodeRef> = before.values().copied().collect();
            let actual = journal
                .iter()
                .filter(|op| match op {
                    Op::InsertBefore { child, .. } => old_refs.contains(child),
                    Op::Swap { .. } => true,
                    _ => false,
                })
                .count();
            assert_eq!(actual, moves, "[{}] moves", case.name);
        }
    }
}

#[test]
fn rotation_is_a_single_move() {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    let mut mount = Mount::new(point);
    mount
        .render(Some(keyed_list(&["a", "b", "c", "d"])), &mut store)
        .unwrap();
    let ul = rendered_root(&store, point);
    let refs = refs_by_key(&store, ul);
    store.clear_journal();

    mount
        .render(Some(keyed_list(&["d", "a", "b", "c"])), &mut store)
        .unwrap();
    assert_eq!(
        store.take_journal(),
        vec![
            Op::InsertBefore {
                parent: ul,
                child: refs["d"],
                before: Some(refs["a"]),
            },
            Op::Flush,
        ]
    );
}

#[test]
fn two_element_swap_uses_the_swap_fast_path() {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    let mut mount = Mount::new(point);
    mount.render(Some(keyed_list(&["a", "b"])), &mut store).unwrap();
    let ul = rendered_root(&store, point);
    let refs = refs_by_key(&store, ul);
    store.clear_journal();

    mount.render(Some(keyed_list(&["b", "a"])), &mut store).unwrap();
    assert_eq!(
        store.take_journal(),
        vec![
            Op::Swap {
                a: refs["b"],
                b: refs["a"],
            },
            Op::Flush,
        ]
    );
    assert_eq!(store.child_refs(ul), &[refs["b"], refs["a"]]);
}

#[test]
fn one_unkeyed_sibling_disables_keyed_sync() {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    let mut mount = Mount::new(point);
    let view = |keys: &[&str]| -> vdom::Node {
        vdom::Element::new("ul")
            .children(keys.iter().map(|k| vdom::Element::new("li").key(*k).text(*k)))
            .child(vdom::Element::new("li").text("footer"))
            .into()
    };
    mount.render(Some(view(&["a", "b"])), &mut store).unwrap();
    let ul = rendered_root(&store, point);
    store.clear_journal();

    mount.render(Some(view(&["b", "a"])), &mut store).unwrap();
    assert_eq!(child_texts(&store, ul), ["b", "a", "footer"]);
    let journal = store.take_journal();
    assert!(!journal.iter().any(|op| matches!(op, Op::Swap { .. } | Op::InsertBefore { .. })));
    assert_eq!(
        journal
            .iter()
            .filter(|op| matches!(op, Op::ReplaceChild { .. }))
            .count(),
        2
    );
}
