use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use fiber_core::{create_element, Element, EventHandler, MemoryHost, ReconcilerOptions};
use fiber_runtime_std::StdRuntime;

fn app(clicks: Rc<Cell<u32>>) -> Element {
    let on_click = EventHandler::new(move |event| {
        clicks.set(clicks.get() + 1);
        log::info!("{} on node {}", event.name, event.target);
    });
    create_element(
        "div",
        vec![("id", "app".into()), ("onClick", on_click.into())],
        vec![
            create_element("h1", vec![], vec!["Hello, Build Your Own React!".into()]).into(),
            create_element("p", vec![], vec!["This is a custom React implementation.".into()])
                .into(),
            create_element(
                "ul",
                vec![],
                vec![
                    create_element("li", vec![], vec!["Step 0: Review".into()]).into(),
                    create_element("li", vec![], vec!["Step 1: The createElement Function".into()])
                        .into(),
                    create_element("li", vec![], vec!["Step 2: The render Function".into()]).into(),
                ],
            )
            .into(),
        ],
    )
}

fn styled() -> Element {
    Element::new("div")
        .prop("style", "background: lightblue; padding: 20px;")
        .child(Element::new("h2").child("Using JSX Syntax!"))
        .child(Element::new("p").child("This JSX is transpiled by Babel to use myReact.createElement"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let runtime = StdRuntime::new();
    let mut host = MemoryHost::new();
    let container = host.create_container("div").context("creating root container")?;
    let mut reconciler = runtime.reconciler(host, ReconcilerOptions::default());

    let clicks = Rc::new(Cell::new(0));
    reconciler.render(app(clicks.clone()), container)?;
    let periods = runtime.run_until_committed(&mut reconciler)?;
    println!("first render committed after {periods} idle period(s):");
    print!("{}", reconciler.host().dump_tree(Some(container)));

    let app_node = reconciler.host().children(container)?[0];
    reconciler.host().dispatch_event(app_node, "click")?;
    println!("clicks so far: {}", clicks.get());

    reconciler.render(styled(), container)?;
    let periods = runtime.run_until_committed(&mut reconciler)?;
    println!("second render committed after {periods} idle period(s):");
    print!("{}", reconciler.host().dump_tree(Some(container)));

    Ok(())
}
