//! Fibers: the resumable, linked intermediate tree built from elements.

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::SlotMap;

use crate::element::{Element, ElementType, Props};
use crate::host::HostNodeId;

slotmap::new_key_type! {
    /// Handle to a fiber inside one generation's [`FiberTree`].
    pub struct FiberId;
}

/// Pending host mutation recorded for a fiber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Effect {
    #[default]
    None,
    Placement,
    Update,
    Deletion,
}

#[derive(Clone, Debug)]
pub struct Fiber {
    /// `None` only for the root fiber, which stands for the container.
    pub(crate) ty: Option<ElementType>,
    pub(crate) props: Rc<Props>,
    pub(crate) node: Option<HostNodeId>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    /// Same position in the previously committed generation. Not owned.
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Effect,
}

impl Fiber {
    pub(crate) fn placement(element: &Element, parent: FiberId) -> Self {
        Self {
            ty: Some(element.ty().clone()),
            props: Rc::clone(element.props()),
            node: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect: Effect::Placement,
        }
    }

    pub(crate) fn update(
        element: &Element,
        parent: FiberId,
        node: Option<HostNodeId>,
        alternate: FiberId,
    ) -> Self {
        Self {
            ty: Some(element.ty().clone()),
            props: Rc::clone(element.props()),
            node,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: Some(alternate),
            effect: Effect::Update,
        }
    }

    pub fn ty(&self) -> Option<&ElementType> {
        self.ty.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn node(&self) -> Option<HostNodeId> {
        self.node
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }
}

/// An old fiber without a counterpart in the new generation.
///
/// Holds a copy of the committed fiber marked [`Effect::Deletion`]; the
/// committed tree it came from is left untouched until the commit retires it.
#[derive(Clone, Debug)]
pub struct PendingDeletion {
    id: FiberId,
    fiber: Fiber,
}

impl PendingDeletion {
    pub(crate) fn new(id: FiberId, old: &Fiber) -> Self {
        Self {
            id,
            fiber: Fiber {
                effect: Effect::Deletion,
                ..old.clone()
            },
        }
    }

    /// Position of the fiber in the committed tree.
    pub fn id(&self) -> FiberId {
        self.id
    }

    pub fn fiber(&self) -> &Fiber {
        &self.fiber
    }

    pub fn effect(&self) -> Effect {
        self.fiber.effect
    }
}

/// All fibers of one generation. Alternates held by a newer tree point into
/// this arena, so it must outlive that tree's commit.
#[derive(Debug)]
pub struct FiberTree {
    fibers: SlotMap<FiberId, Fiber>,
    root: FiberId,
}

impl FiberTree {
    pub(crate) fn new_root(
        container: HostNodeId,
        element: Element,
        alternate: Option<FiberId>,
    ) -> Self {
        let mut props = Props::new();
        props.push_child(element);
        let mut fibers = SlotMap::with_key();
        let root = fibers.insert(Fiber {
            ty: None,
            props: Rc::new(props),
            node: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect: Effect::None,
        });
        Self { fibers, root }
    }

    pub fn root(&self) -> FiberId {
        self.root
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    /// Next fiber in depth-first order: child, else sibling, else the sibling
    /// of the closest ancestor that has one.
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.fibers.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        self.next_skipping_children(id)
    }

    /// Like [`FiberTree::next_unit`] but never descends into `id`'s children.
    pub fn next_skipping_children(&self, id: FiberId) -> Option<FiberId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.fibers.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Closest host node at or above the parent of `id`.
    pub fn parent_node(&self, id: FiberId) -> Option<HostNodeId> {
        let mut cursor = self.fibers.get(id)?.parent;
        while let Some(current) = cursor {
            let fiber = self.fibers.get(current)?;
            if fiber.node.is_some() {
                return fiber.node;
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Fibers in the order the work loop visits them, root first.
    pub fn iter(&self) -> Traverse<'_> {
        Traverse {
            tree: self,
            next: Some(self.root),
        }
    }
}

impl Index<FiberId> for FiberTree {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        &self.fibers[id]
    }
}

impl IndexMut<FiberId> for FiberTree {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        &mut self.fibers[id]
    }
}

pub struct Traverse<'a> {
    tree: &'a FiberTree,
    next: Option<FiberId>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = (FiberId, &'a Fiber);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.next_unit(id);
        self.tree.get(id).map(|fiber| (id, fiber))
    }
}
