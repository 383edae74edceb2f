use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use dom_store::DomStore;
use vdom::{Element, Mount, Node};

const SMALL_ROWS: usize = 100;
const LARGE_ROWS: usize = 10_000;

fn rows(keys: &[usize]) -> Node {
    Element::new("tbody")
        .children(keys.iter().map(|&key| {
            Element::new("tr")
                .key(key)
                .child(Element::new("td").text(key.to_string()))
                .child(Element::new("td").class("label").text("row"))
        }))
        .into()
}

fn mounted(keys: &[usize]) -> (DomStore, Mount) {
    let mut store = DomStore::new();
    let point = store.mount_point("table");
    let mut mount = Mount::new(point);
    mount
        .render(Some(rows(keys)), &mut store)
        .expect("initial render should succeed");
    store.clear_journal();
    (store, mount)
}

fn bench_create_large(c: &mut Criterion) {
    let keys: Vec<usize> = (0..LARGE_ROWS).collect();
    c.bench_function("bench_create_large", |b| {
        b.iter_batched(
            || rows(&keys),
            |view| {
                let mut store = DomStore::new();
                let point = store.mount_point("table");
                let mut mount = Mount::new(point);
                mount
                    .render(Some(black_box(view)), &mut store)
                    .expect("render should succeed");
                black_box(store.len());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_reorder(c: &mut Criterion, name: &str, rows_count: usize, reorder: fn(&mut Vec<usize>)) {
    let keys: Vec<usize> = (0..rows_count).collect();
    let mut next = keys.clone();
    reorder(&mut next);
    c.bench_function(name, |b| {
        b.iter_batched(
            || (mounted(&keys), rows(&next)),
            |((mut store, mut mount), view)| {
                mount
                    .render(Some(black_box(view)), &mut store)
                    .expect("reorder should succeed");
                black_box(store.mutation_count());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_swap_rows_small(c: &mut Criterion) {
    bench_reorder(c, "bench_swap_rows_small", SMALL_ROWS, |keys| {
        let last = keys.len() - 2;
        keys.swap(1, last);
    });
}

fn bench_swap_rows_large(c: &mut Criterion) {
    bench_reorder(c, "bench_swap_rows_large", LARGE_ROWS, |keys| {
        let last = keys.len() - 2;
        keys.swap(1, last);
    });
}

fn bench_reverse_large(c: &mut Criterion) {
    bench_reorder(c, "bench_reverse_large", LARGE_ROWS, |keys| keys.reverse());
}

fn bench_rotate_large(c: &mut Criterion) {
    bench_reorder(c, "bench_rotate_large", LARGE_ROWS, |keys| keys.rotate_right(1));
}

fn bench_remove_every_tenth_large(c: &mut Criterion) {
    bench_reorder(c, "bench_remove_every_tenth_large", LARGE_ROWS, |keys| {
        keys.retain(|key| key % 10 != 0);
    });
}

fn bench_interleave_inserts_large(c: &mut Criterion) {
    bench_reorder(c, "bench_interleave_inserts_large", LARGE_ROWS, |keys| {
        let fresh = keys.len();
        *keys = keys
            .iter()
            .flat_map(|&key| [key, key + fresh])
            .collect();
    });
}

criterion_group!(
    benches,
    bench_create_large,
    bench_swap_rows_small,
    bench_swap_rows_large,
    bench_reverse_large,
    bench_rotate_large,
    bench_remove_every_tenth_large,
    bench_interleave_inserts_large
);
criterion_main!(benches);
