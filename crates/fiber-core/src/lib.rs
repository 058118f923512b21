#![doc = r"Core runtime pieces for Fiber-RS: elements, fibers, reconciliation and commit."]

pub mod collections;
pub mod commit;
pub mod element;
pub mod fiber;
pub mod host;
pub mod options;
pub mod platform;
mod reconcile;
pub mod reconciler;

pub use commit::update_dom;
pub use element::{
    create_element, create_text_element, Child, Element, ElementType, EventHandler, PropValue,
    Props, CHILDREN, NODE_VALUE, TEXT_ELEMENT,
};
pub use fiber::{Effect, Fiber, FiberId, FiberTree, PendingDeletion};
pub use host::{Event, HostNode, HostNodeId, HostNodeKind, HostTree, MemoryHost};
pub use options::{ReconcilerOptions, ReentrantRender};
pub use platform::{Deadline, DefaultScheduler, IdleScheduler, Unbounded};
pub use reconciler::Reconciler;

use std::fmt;

/// Failure reported by a [`HostTree`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Missing { id: HostNodeId },
    UnsupportedType { tag: String },
    NotAChild { parent: HostNodeId, child: HostNodeId },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Missing { id } => write!(f, "host node {id} missing"),
            HostError::UnsupportedType { tag } => {
                write!(f, "unsupported element type {tag:?}")
            }
            HostError::NotAChild { parent, child } => {
                write!(f, "host node {child} is not a child of {parent}")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Failure surfaced by [`Reconciler::render`] and [`Reconciler::work_loop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Host(HostError),
    /// `render` was called while a previous generation was still in flight and
    /// the reconciler is configured with [`ReentrantRender::Reject`].
    RenderInFlight,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Host(err) => write!(f, "host error: {err}"),
            RenderError::RenderInFlight => {
                write!(f, "render called while a previous render is still in flight")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Host(err) => Some(err),
            RenderError::RenderInFlight => None,
        }
    }
}

impl From<HostError> for RenderError {
    fn from(err: HostError) -> Self {
        RenderError::Host(err)
    }
}
