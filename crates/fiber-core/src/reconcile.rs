use crate::element::Element;
use crate::fiber::{Fiber, FiberId, FiberTree, PendingDeletion};

/// Diffs `elements` against the previous generation's children of `parent`,
/// position by position.
///
/// Matching types become UPDATE fibers that keep the old host node. A new
/// element without a same-typed predecessor becomes a PLACEMENT fiber. An old
/// fiber without a same-typed successor is recorded in `deletions` as a
/// DELETION copy; it is never part of `wip`. `current` is only read.
pub(crate) fn reconcile_children(
    wip: &mut FiberTree,
    current: Option<&FiberTree>,
    parent: FiberId,
    elements: &[Element],
    deletions: &mut Vec<PendingDeletion>,
) {
    let mut old_fiber = match (current, wip[parent].alternate) {
        (Some(current), Some(alternate)) => current.get(alternate).and_then(Fiber::child),
        _ => None,
    };
    let mut previous: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old_fiber.is_some() {
        let element = elements.get(index);
        let old = old_fiber.zip(current).and_then(|(id, tree)| Some((id, tree.get(id)?)));

        let same_type = match (element, old) {
            (Some(element), Some((_, old))) => old.ty() == Some(element.ty()),
            _ => false,
        };

        let new_fiber = match (element, old) {
            (Some(element), Some((old_id, old))) if same_type => {
                Some(Fiber::update(element, parent, old.node(), old_id))
            }
            (Some(element), _) => Some(Fiber::placement(element, parent)),
            (None, _) => None,
        };

        if let Some((old_id, old)) = old.filter(|_| !same_type) {
            deletions.push(PendingDeletion::new(old_id, old));
        }

        old_fiber = old.and_then(|(_, old)| old.sibling());

        if let Some(fiber) = new_fiber {
            let id = wip.insert(fiber);
            match previous {
                None => wip[parent].child = Some(id),
                Some(prev) => wip[prev].sibling = Some(id),
            }
            previous = Some(id);
        }

        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::Effect;

    fn children(tree: &FiberTree, parent: FiberId) -> Vec<(String, Effect)> {
        let mut out = Vec::new();
        let mut cursor = tree[parent].child();
        while let Some(id) = cursor {
            let fiber = &tree[id];
            out.push((fiber.ty().map(ToString::to_string).unwrap_or_default(), fiber.effect()));
            cursor = fiber.sibling();
        }
        out
    }

    fn committed(elements: &[Element]) -> FiberTree {
        let mut tree = FiberTree::new_root(0, Element::new("div"), None);
        let root = tree.root();
        reconcile_children(&mut tree, None, root, elements, &mut Vec::new());
        tree
    }

    #[test]
    fn first_generation_is_all_placements() {
        let tree = committed(&[Element::new("a"), Element::new("b")]);
        assert_eq!(
            children(&tree, tree.root()),
            [("a".to_string(), Effect::Placement), ("b".to_string(), Effect::Placement)]
        );
    }

    #[test]
    fn positional_type_change_replaces_and_deletes() {
        let old = committed(&[Element::new("div"), Element::new("p"), Element::new("p")]);
        let mut wip = FiberTree::new_root(0, Element::new("div"), Some(old.root()));
        let root = wip.root();
        let mut deletions = Vec::new();

        reconcile_children(
            &mut wip,
            Some(&old),
            root,
            &[Element::new("span"), Element::new("p")],
            &mut deletions,
        );

        assert_eq!(
            children(&wip, root),
            [("span".to_string(), Effect::Placement), ("p".to_string(), Effect::Update)]
        );
        let deleted: Vec<_> = deletions
            .iter()
            .map(|deletion| (deletion.fiber().ty().map(ToString::to_string), deletion.effect()))
            .collect();
        assert_eq!(
            deleted,
            [
                (Some("div".to_string()), Effect::Deletion),
                (Some("p".to_string()), Effect::Deletion)
            ]
        );
        assert!(deletions
            .iter()
            .all(|deletion| old[deletion.id()].effect() == Effect::Placement));

        let update = wip[wip[root].child().unwrap()].sibling().unwrap();
        let alternate = wip[update].alternate().unwrap();
        assert_eq!(old[alternate].ty().map(ToString::to_string).as_deref(), Some("p"));
    }

    #[test]
    fn empty_children_delete_everything_old() {
        let old = committed(&[Element::new("a"), Element::new("b")]);
        let mut wip = FiberTree::new_root(0, Element::new("div"), Some(old.root()));
        let root = wip.root();
        let mut deletions = Vec::new();

        reconcile_children(&mut wip, Some(&old), root, &[], &mut deletions);

        assert!(wip[root].child().is_none());
        assert_eq!(deletions.len(), 2);
    }
}
