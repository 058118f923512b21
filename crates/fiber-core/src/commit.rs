//! Applying recorded effects to the host tree.

use crate::element::{PropValue, Props, CHILDREN};
use crate::fiber::{Effect, FiberId, FiberTree, PendingDeletion};
use crate::host::{HostNodeId, HostTree};
use crate::HostError;

fn is_event(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

fn is_property(name: &str) -> bool {
    name != CHILDREN && !is_event(name)
}

/// Host event name for an `on<Name>` prop: `onClick` -> `click`.
pub fn event_name(prop: &str) -> String {
    prop.get(2..).unwrap_or_default().to_lowercase()
}

fn changed(previous: Option<&PropValue>, next: &PropValue) -> bool {
    previous != Some(next)
}

/// Brings `node` from `prev` to `next`, touching only what differs.
///
/// Stale listeners go first, then stale properties are cleared, changed
/// properties set, and new listeners added.
pub fn update_dom<H: HostTree + ?Sized>(
    host: &mut H,
    node: HostNodeId,
    prev: &Props,
    next: &Props,
) -> Result<(), HostError> {
    for (name, value) in prev.attributes().filter(|(name, _)| is_event(name)) {
        if let (true, Some(handler)) = (changed(next.get(name), value), value.as_handler()) {
            host.remove_event_listener(node, &event_name(name), handler)?;
        }
    }

    for (name, _) in prev.attributes().filter(|(name, _)| is_property(name)) {
        if !next.contains(name) {
            host.clear_property(node, name)?;
        }
    }

    for (name, value) in next.attributes().filter(|(name, _)| is_property(name)) {
        if changed(prev.get(name), value) {
            host.set_property(node, name, value)?;
        }
    }

    for (name, value) in next.attributes().filter(|(name, _)| is_event(name)) {
        if let (true, Some(handler)) = (changed(prev.get(name), value), value.as_handler()) {
            host.add_event_listener(node, &event_name(name), handler)?;
        }
    }

    Ok(())
}

/// Removes a fiber of the retiring generation `tree` from the host. Its
/// subtree goes with it, so children are never visited.
pub fn commit_deletion<H: HostTree + ?Sized>(
    host: &mut H,
    tree: &FiberTree,
    deletion: &PendingDeletion,
) -> Result<(), HostError> {
    let parent = tree.parent_node(deletion.id());
    if let (Some(node), Some(parent)) = (deletion.fiber().node(), parent) {
        host.remove_child(parent, node)?;
    }
    Ok(())
}

/// Applies the effects of `tree` below `from`, in the same depth-first order
/// the work loop produced them. `previous` resolves UPDATE alternates.
pub fn commit_work<H: HostTree + ?Sized>(
    host: &mut H,
    tree: &FiberTree,
    previous: Option<&FiberTree>,
    from: FiberId,
) -> Result<usize, HostError> {
    let empty = Props::default();
    let mut applied = 0;
    let mut cursor = Some(from);

    while let Some(id) = cursor {
        let fiber = &tree[id];
        match fiber.effect() {
            Effect::None => {}
            // Deletions are committed from the pending list and never enter
            // a work-in-progress tree.
            Effect::Deletion => debug_assert!(false, "deletion fiber {id:?} in committed tree"),
            Effect::Placement => {
                if let (Some(node), Some(parent)) = (fiber.node(), tree.parent_node(id)) {
                    host.append_child(parent, node)?;
                    applied += 1;
                }
            }
            Effect::Update => {
                if let Some(node) = fiber.node() {
                    let prev = fiber
                        .alternate()
                        .zip(previous)
                        .and_then(|(alternate, previous)| previous.get(alternate))
                        .map(|alternate| alternate.props())
                        .unwrap_or(&empty);
                    update_dom(host, node, prev, fiber.props())?;
                    applied += 1;
                }
            }
        }
        cursor = next_within(tree, id, from);
    }

    Ok(applied)
}

/// Depth-first successor of `id` that stays inside the subtree rooted at `from`.
fn next_within(tree: &FiberTree, id: FiberId, from: FiberId) -> Option<FiberId> {
    if let Some(child) = tree[id].child() {
        return Some(child);
    }
    let mut cursor = id;
    loop {
        if cursor == from {
            return None;
        }
        if let Some(sibling) = tree[cursor].sibling() {
            return Some(sibling);
        }
        cursor = tree[cursor].parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::EventHandler;
    use crate::host::MemoryHost;

    fn props(attributes: Vec<(&str, PropValue)>) -> Props {
        let mut props = Props::new();
        for (name, value) in attributes {
            props.insert(name, value);
        }
        props
    }

    /// Records which mutations reach the host.
    #[derive(Default)]
    struct Spy {
        inner: MemoryHost,
        calls: Vec<String>,
    }

    impl HostTree for Spy {
        fn create_node(&mut self, tag: &str) -> Result<HostNodeId, HostError> {
            self.inner.create_node(tag)
        }

        fn create_text_node(&mut self) -> Result<HostNodeId, HostError> {
            self.inner.create_text_node()
        }

        fn set_property(
            &mut self,
            node: HostNodeId,
            name: &str,
            value: &PropValue,
        ) -> Result<(), HostError> {
            self.calls.push(format!("set {name}={value}"));
            self.inner.set_property(node, name, value)
        }

        fn clear_property(&mut self, node: HostNodeId, name: &str) -> Result<(), HostError> {
            self.calls.push(format!("clear {name}"));
            self.inner.clear_property(node, name)
        }

        fn add_event_listener(
            &mut self,
            node: HostNodeId,
            event: &str,
            handler: &EventHandler,
        ) -> Result<(), HostError> {
            self.calls.push(format!("listen {event}"));
            self.inner.add_event_listener(node, event, handler)
        }

        fn remove_event_listener(
            &mut self,
            node: HostNodeId,
            event: &str,
            handler: &EventHandler,
        ) -> Result<(), HostError> {
            self.calls.push(format!("unlisten {event}"));
            self.inner.remove_event_listener(node, event, handler)
        }

        fn append_child(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError> {
            self.inner.append_child(parent, child)
        }

        fn remove_child(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError> {
            self.inner.remove_child(parent, child)
        }
    }

    #[test]
    fn event_names_are_lowercased_without_prefix() {
        assert_eq!(event_name("onClick"), "click");
        assert_eq!(event_name("onMouseOver"), "mouseover");
        assert!(!is_event("on"));
        assert!(!is_property(CHILDREN));
    }

    #[test]
    fn only_changed_properties_are_written() {
        let mut host = Spy::default();
        let node = host.create_node("div").unwrap();
        let before = props(vec![("id", "a".into()), ("className", "x".into())]);
        update_dom(&mut host, node, &Props::default(), &before).unwrap();
        host.calls.clear();

        let after = props(vec![("id", "a".into()), ("className", "y".into())]);
        update_dom(&mut host, node, &before, &after).unwrap();

        assert_eq!(host.calls, ["set className=y"]);
        assert_eq!(host.inner.property(node, "id").unwrap(), Some(&PropValue::from("a")));
        assert_eq!(host.inner.property(node, "className").unwrap(), Some(&PropValue::from("y")));
    }

    #[test]
    fn removed_properties_are_cleared() {
        let mut host = Spy::default();
        let node = host.create_node("input").unwrap();
        let before = props(vec![("value", "typed".into()), ("disabled", true.into())]);
        update_dom(&mut host, node, &Props::default(), &before).unwrap();
        host.calls.clear();

        update_dom(&mut host, node, &before, &props(vec![("value", "typed".into())])).unwrap();

        assert_eq!(host.calls, ["clear disabled"]);
        assert_eq!(host.inner.property(node, "disabled").unwrap(), Some(&PropValue::from("")));
    }

    #[test]
    fn replaced_handler_is_swapped_not_stacked() {
        let mut host = Spy::default();
        let node = host.create_node("button").unwrap();
        let f1 = EventHandler::new(|_| {});
        let f2 = EventHandler::new(|_| {});
        let before = props(vec![("onClick", f1.clone().into())]);
        update_dom(&mut host, node, &Props::default(), &before).unwrap();
        host.calls.clear();

        update_dom(&mut host, node, &before, &props(vec![("onClick", f2.clone().into())])).unwrap();

        assert_eq!(host.calls, ["unlisten click", "listen click"]);
        let bound = host.inner.node(node).unwrap().listeners("click");
        assert_eq!(bound, &[f2]);
    }

    #[test]
    fn dropped_handler_is_unbound() {
        let mut host = Spy::default();
        let node = host.create_node("button").unwrap();
        let handler = EventHandler::new(|_| {});
        let before = props(vec![("onClick", handler.into())]);
        update_dom(&mut host, node, &Props::default(), &before).unwrap();
        host.calls.clear();

        update_dom(&mut host, node, &before, &Props::default()).unwrap();

        assert_eq!(host.calls, ["unlisten click"]);
        assert!(host.inner.node(node).unwrap().listeners("click").is_empty());
        assert_eq!(host.inner.dispatch_event(node, "click").unwrap(), 0);
    }

    #[test]
    fn unchanged_handler_is_left_alone() {
        let mut host = Spy::default();
        let node = host.create_node("button").unwrap();
        let handler = EventHandler::new(|_| {});
        let before = props(vec![("onClick", handler.clone().into())]);
        update_dom(&mut host, node, &Props::default(), &before).unwrap();
        host.calls.clear();

        update_dom(&mut host, node, &before, &before.clone()).unwrap();

        assert!(host.calls.is_empty());
    }

    #[test]
    fn children_prop_never_reaches_host() {
        let mut host = Spy::default();
        let node = host.create_node("div").unwrap();
        update_dom(
            &mut host,
            node,
            &Props::default(),
            &props(vec![(CHILDREN, "ignored".into()), ("title", "t".into())]),
        )
        .unwrap();

        assert_eq!(host.calls, ["set title=t"]);
    }
}
