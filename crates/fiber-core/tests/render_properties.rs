use fiber_core::{create_element, Effect, Element, EventHandler, PropValue, ReconcilerOptions};
use fiber_testing::{FiberTestRule, HostOp};

fn app() -> Element {
    create_element(
        "div",
        vec![("id", "app".into())],
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

fn is_structural(op: &HostOp) -> bool {
    matches!(
        op,
        HostOp::CreateNode { .. }
            | HostOp::CreateText { .. }
            | HostOp::AppendChild { .. }
            | HostOp::RemoveChild { .. }
    )
}

#[test]
fn identical_rerender_emits_no_structural_mutations() {
    let mut rule = FiberTestRule::new();
    rule.render(app()).unwrap();
    let first = rule.dump();
    rule.take_ops();

    rule.render(app()).unwrap();

    assert_eq!(rule.dump(), first);
    assert!(rule.take_ops().is_empty());
    assert!(rule
        .effects()
        .iter()
        .all(|(_, effect)| *effect == Effect::Update));
}

#[test]
fn changed_class_only_rewrites_that_property() {
    let node = |class: &str| {
        create_element(
            "div",
            vec![("id", "a".into()), ("className", class.into())],
            vec![],
        )
    };
    let mut rule = FiberTestRule::new();
    rule.render(node("x")).unwrap();
    let div = rule.host().children(rule.container()).unwrap()[0];
    rule.take_ops();

    rule.render(node("y")).unwrap();

    assert_eq!(
        rule.take_ops(),
        [HostOp::SetProperty {
            node: div,
            name: "className".into(),
            value: "y".into()
        }]
    );
    assert_eq!(
        rule.host().property(div, "id").unwrap(),
        Some(&PropValue::from("a"))
    );
}

#[test]
fn swapped_handler_is_removed_before_new_one_is_added() {
    let f1 = EventHandler::new(|_| {});
    let f2 = EventHandler::new(|_| {});
    let mut rule = FiberTestRule::new();
    rule.render(create_element("button", vec![("onClick", f1.into())], vec![]))
        .unwrap();
    let button = rule.host().children(rule.container()).unwrap()[0];
    rule.take_ops();

    rule.render(create_element("button", vec![("onClick", f2.clone().into())], vec![]))
        .unwrap();

    assert_eq!(
        rule.take_ops(),
        [
            HostOp::RemoveListener {
                node: button,
                event: "click".into()
            },
            HostOp::AddListener {
                node: button,
                event: "click".into()
            },
        ]
    );
    assert_eq!(rule.host().node(button).unwrap().listeners("click"), &[f2]);
}

#[test]
fn dropping_on_click_unbinds_the_listener() {
    let handler = EventHandler::new(|_| {});
    let mut rule = FiberTestRule::new();
    rule.render(create_element("button", vec![("onClick", handler.into())], vec![]))
        .unwrap();
    let button = rule.host().children(rule.container()).unwrap()[0];
    rule.take_ops();

    rule.render(create_element("button", vec![], vec![])).unwrap();

    assert_eq!(
        rule.take_ops(),
        [HostOp::RemoveListener {
            node: button,
            event: "click".into()
        }]
    );
    assert!(rule.host().node(button).unwrap().listeners("click").is_empty());
}

#[test]
fn deletions_are_committed_before_placements() {
    let mut rule = FiberTestRule::new();
    rule.render(Element::new("section").child(Element::new("div").child("old")))
        .unwrap();
    let section = rule.host().children(rule.container()).unwrap()[0];
    let old_div = rule.host().children(section).unwrap()[0];
    rule.take_ops();

    rule.render(Element::new("section").child(Element::new("span").child("new")))
        .unwrap();

    let ops = rule.take_ops();
    let structural: Vec<_> = ops.iter().filter(|op| is_structural(op)).collect();
    let removal = structural
        .iter()
        .position(|op| **op == HostOp::RemoveChild { parent: section, child: old_div })
        .expect("old div removed");
    let first_append = structural
        .iter()
        .position(|op| matches!(op, HostOp::AppendChild { .. }))
        .expect("new span appended");
    assert!(removal < first_append);

    let children = rule.host().children(section).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(rule.host().node(children[0]).unwrap().tag(), Some("span"));
    assert_eq!(rule.host().text_content(section).unwrap(), "new");
}

#[test]
fn placements_attach_subtrees_only_during_commit() {
    let mut rule = FiberTestRule::new();
    let container = rule.container();
    rule.reconciler().render(app(), container).unwrap();
    rule.reconciler()
        .work_loop(&fiber_testing::ScriptedDeadline::units(4))
        .unwrap();

    let early = rule.take_ops();
    assert!(!early.is_empty());
    assert!(early
        .iter()
        .all(|op| !matches!(op, HostOp::AppendChild { .. })));
    assert!(rule.host().children(container).unwrap().is_empty());

    rule.reconciler().flush_sync().unwrap();
    assert_eq!(
        rule.host().text_content(container).unwrap(),
        "Hello, Build Your Own React!This is a custom React implementation.\
         Step 0: ReviewStep 1: The createElement FunctionStep 2: The render Function"
    );
}

#[test]
fn slice_size_does_not_change_the_outcome() {
    let generations = || {
        vec![
            app(),
            Element::new("div")
                .prop("style", "background: lightblue; padding: 20px;")
                .child(Element::new("h2").child("Using JSX Syntax!"))
                .child(
                    Element::new("p")
                        .child("This JSX is transpiled by Babel to use myReact.createElement"),
                ),
            app(),
        ]
    };

    let mut reference = FiberTestRule::new();
    let expected: Vec<_> = generations()
        .into_iter()
        .map(|element| {
            reference.render(element).unwrap();
            (reference.dump(), reference.effects())
        })
        .collect();

    for slice in [1, 2, 3, 7] {
        let mut rule = FiberTestRule::new();
        for (element, (dump, effects)) in generations().into_iter().zip(&expected) {
            let slices = rule.render_sliced(element, slice).unwrap();
            assert!(slices >= 1);
            assert_eq!(&rule.dump(), dump, "slice size {slice}");
            assert_eq!(&rule.effects(), effects, "slice size {slice}");
        }
    }
}

#[test]
fn unsupported_type_fails_fast_without_touching_mounted_tree() {
    let mut rule = FiberTestRule::with_options(ReconcilerOptions::default());
    rule.render(app()).unwrap();
    let mounted = rule.dump();

    let err = rule.render(Element::new("div").child(Element::new(""))).unwrap_err();

    assert_eq!(err.to_string(), "host error: unsupported element type \"\"");
    assert_eq!(rule.dump(), mounted);
}
