#![no_main]

use dom_store::DomStore;
use libfuzzer_sys::fuzz_target;
use vdom::{Element, IntegrityOptions, Mount, Node};

const MAX_ROUNDS: usize = 8;
const MAX_CHILDREN: usize = 24;

/// One key list per `0xff`-separated chunk. Keys come from a small alphabet
/// so consecutive rounds share most of them; repeats within a list are dropped.
fn lists(data: &[u8]) -> Vec<Vec<u8>> {
    data.split(|&b| b == 0xff)
        .take(MAX_ROUNDS)
        .map(|chunk| {
            let mut keys: Vec<u8> = Vec::new();
            for &b in chunk.iter().take(MAX_CHILDREN) {
                let key = b % 32;
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            keys
        })
        .collect()
}

fn view(keys: &[u8]) -> Node {
    Element::new("ol")
        .children(keys.iter().map(|&key| {
            Element::new("li")
                .key(u32::from(key))
                .text(key.to_string())
        }))
        .into()
}

fuzz_target!(|data: &[u8]| {
    let mut store = DomStore::new();
    let point = store.mount_point("main");
    let mut mount = Mount::new(point);

    for keys in lists(data) {
        mount
            .render(Some(view(&keys)), &mut store)
            .expect("keyed render should not fail");
        let ol = store.child_refs(point)[0];
        let rendered: Vec<String> = store
            .child_refs(ol)
            .iter()
            .map(|&li| store.text_content(li))
            .collect();
        let expected: Vec<String> = keys.iter().map(u8::to_string).collect();
        assert_eq!(rendered, expected, "backend order diverged from keys");
        assert!(
            mount
                .integrity_check(&store, &IntegrityOptions::default())
                .expect("tree should not be busy")
        );
    }

    mount.render(None, &mut store).expect("clear should not fail");
    assert!(store.child_refs(point).is_empty());
});
