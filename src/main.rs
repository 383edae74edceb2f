use dom_store::{DomStore, Op, SharedDom};
use log::LevelFilter;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use vdom::{Element, EventSpec, Handler, IntegrityOptions, Mount, Node, ReconcileError};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn todo_list(items: &[&str]) -> Node {
    Element::new("ul")
        .class("todos")
        .children(items.iter().map(|item| {
            Element::new("li")
                .key(*item)
                .child(Element::new("button").prop("title", "done").text(*item))
        }))
        .into()
}

fn article(title: &str) -> Node {
    Element::new("article")
        .child(Element::new("h1").text(title))
        .child(Element::new("p").text("Rendered once, adopted later."))
        .into()
}

fn print_journal(label: &str, journal: &[Op]) {
    println!("{label}: {} op(s)", journal.len());
    for op in journal {
        println!("  {op:?}");
    }
}

fn run() -> Result<(), ReconcileError> {
    let mut store = DomStore::new();
    let list_point = store.mount_point("section");
    let article_point = store.mount_point("main");
    let dom = SharedDom::new(store);

    let mut list = Mount::new(list_point);
    list.delegate(&[EventSpec::bubble("click")], true, &dom);
    list.render(Some(todo_list(&["a", "b", "c", "d", "e"])), &mut *dom.store_mut())?;
    println!("{}", dom.store().inner_markup(list_point));
    dom.store_mut().clear_journal();

    list.render(Some(todo_list(&["e", "a", "c", "b"])), &mut *dom.store_mut())?;
    println!("{}", dom.store().inner_markup(list_point));
    print_journal("reorder", &dom.store_mut().take_journal());

    let clicked = Rc::new(std::cell::RefCell::new(Vec::new()));
    let view = Element::new("div")
        .on("click", {
            let clicked = Rc::clone(&clicked);
            Handler::new(move |event, node| {
                clicked.borrow_mut().push(format!("{} reached {node:?}", event.name))
            })
        })
        .child(Element::new("button").text("press"));
    list.render(Some(view.into()), &mut *dom.store_mut())?;
    let button = {
        let store = dom.store();
        let div = store.child_refs(list_point)[0];
        store.child_refs(div)[0]
    };
    dom.fire(button, "click");
    for line in clicked.borrow().iter() {
        println!("{line}");
    }

    let mut server = Mount::new(article_point);
    server.render(Some(article("Hello")), &mut *dom.store_mut())?;
    dom.store_mut().clear_journal();

    let mut client = Mount::new(article_point);
    let adopted = client.hydrate(article("Hello"), &mut *dom.store_mut(), LevelFilter::Warn)?;
    println!("hydrated: {adopted}");
    let intact = client.integrity_check(&*dom.store(), &IntegrityOptions::default())?;
    println!("integrity: {intact}");
    print_journal("hydrate", dom.store().journal());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    if let Err(err) = run() {
        eprintln!("arbor: {err}");
        std::process::exit(1);
    }
}
