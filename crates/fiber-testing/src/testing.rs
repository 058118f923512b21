use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fiber_core::{
    Deadline, Effect, Element, EventHandler, HostError, HostNodeId, HostTree, IdleScheduler,
    MemoryHost, PropValue, Reconciler, ReconcilerOptions, RenderError,
};

/// One host mutation as seen by [`RecordingHost`].
#[derive(Clone, Debug, PartialEq)]
pub enum HostOp {
    CreateNode { node: HostNodeId, tag: String },
    CreateText { node: HostNodeId },
    SetProperty { node: HostNodeId, name: String, value: PropValue },
    ClearProperty { node: HostNodeId, name: String },
    AddListener { node: HostNodeId, event: String },
    RemoveListener { node: HostNodeId, event: String },
    AppendChild { parent: HostNodeId, child: HostNodeId },
    RemoveChild { parent: HostNodeId, child: HostNodeId },
    ReleaseNode { node: HostNodeId },
}

/// [`MemoryHost`] wrapper that logs every mutation in the order it arrives.
#[derive(Debug, Default)]
pub struct RecordingHost {
    inner: MemoryHost,
    ops: Vec<HostOp>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn inner(&self) -> &MemoryHost {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut MemoryHost {
        &mut self.inner
    }
}

impl HostTree for RecordingHost {
    fn create_node(&mut self, tag: &str) -> Result<HostNodeId, HostError> {
        let node = self.inner.create_node(tag)?;
        self.ops.push(HostOp::CreateNode {
            node,
            tag: tag.to_owned(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self) -> Result<HostNodeId, HostError> {
        let node = self.inner.create_text_node()?;
        self.ops.push(HostOp::CreateText { node });
        Ok(node)
    }

    fn set_property(
        &mut self,
        node: HostNodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.inner.set_property(node, name, value)?;
        self.ops.push(HostOp::SetProperty {
            node,
            name: name.to_owned(),
            value: value.clone(),
        });
        Ok(())
    }

    fn clear_property(&mut self, node: HostNodeId, name: &str) -> Result<(), HostError> {
        self.inner.clear_property(node, name)?;
        self.ops.push(HostOp::ClearProperty {
            node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.inner.add_event_listener(node, event, handler)?;
        self.ops.push(HostOp::AddListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.inner.remove_event_listener(node, event, handler)?;
        self.ops.push(HostOp::RemoveListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError> {
        self.inner.append_child(parent, child)?;
        self.ops.push(HostOp::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: HostNodeId, child: HostNodeId) -> Result<(), HostError> {
        self.inner.remove_child(parent, child)?;
        self.ops.push(HostOp::RemoveChild { parent, child });
        Ok(())
    }

    fn release_node(&mut self, node: HostNodeId) -> Result<(), HostError> {
        self.inner.release_node(node)?;
        self.ops.push(HostOp::ReleaseNode { node });
        Ok(())
    }
}

/// Deadline that lets a fixed number of units of work through, then reports
/// that the idle window is over.
#[derive(Debug)]
pub struct ScriptedDeadline {
    remaining: Cell<usize>,
}

impl ScriptedDeadline {
    pub fn units(count: usize) -> Self {
        Self {
            remaining: Cell::new(count),
        }
    }
}

impl Deadline for ScriptedDeadline {
    fn time_remaining(&self) -> Duration {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 {
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}

/// Idle scheduler that only counts how often the loop re-armed itself.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: AtomicUsize,
}

impl CountingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl IdleScheduler for CountingScheduler {
    fn request_idle_callback(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Headless harness for exercising the reconciler in tests.
///
/// Owns a reconciler over a [`RecordingHost`] and a container node, and
/// offers helpers to render either in one pass or in fixed-size slices.
pub struct FiberTestRule {
    reconciler: Reconciler<RecordingHost>,
    scheduler: Arc<CountingScheduler>,
    container: HostNodeId,
}

impl FiberTestRule {
    pub fn new() -> Self {
        Self::with_options(ReconcilerOptions::default())
    }

    pub fn with_options(options: ReconcilerOptions) -> Self {
        let mut host = RecordingHost::new();
        let container = host
            .inner_mut()
            .create_container("div")
            .expect("\"div\" is always a valid container tag");
        let scheduler = Arc::new(CountingScheduler::default());
        let reconciler = Reconciler::with_options(host, scheduler.clone(), options);
        Self {
            reconciler,
            scheduler,
            container,
        }
    }

    /// Render `element` and run the generation to completion.
    pub fn render(&mut self, element: Element) -> Result<(), RenderError> {
        self.reconciler.render(element, self.container)?;
        self.reconciler.flush_sync()
    }

    /// Render `element` letting only `units_per_slice` units through per loop
    /// invocation. Returns how many invocations the generation took.
    pub fn render_sliced(
        &mut self,
        element: Element,
        units_per_slice: usize,
    ) -> Result<usize, RenderError> {
        self.reconciler.render(element, self.container)?;
        let mut slices = 0;
        while self.reconciler.has_pending_work() {
            self.reconciler
                .work_loop(&ScriptedDeadline::units(units_per_slice))?;
            slices += 1;
        }
        Ok(slices)
    }

    pub fn container(&self) -> HostNodeId {
        self.container
    }

    pub fn host(&self) -> &MemoryHost {
        self.reconciler.host().inner()
    }

    /// Host mutations recorded since the last call.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        self.reconciler.host_mut().take_ops()
    }

    /// Text dump of everything mounted under the container.
    pub fn dump(&self) -> String {
        self.host().dump_tree(Some(self.container))
    }

    /// `(type, effect)` of every committed fiber in traversal order, root excluded.
    pub fn effects(&self) -> Vec<(String, Effect)> {
        self.reconciler
            .current_tree()
            .map(|tree| {
                tree.iter()
                    .filter_map(|(_, fiber)| Some((fiber.ty()?.to_string(), fiber.effect())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn idle_requests(&self) -> usize {
        self.scheduler.requests()
    }

    pub fn reconciler(&mut self) -> &mut Reconciler<RecordingHost> {
        &mut self.reconciler
    }
}

impl Default for FiberTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `FiberTestRule`.
pub fn run_test_render<R>(f: impl FnOnce(&mut FiberTestRule) -> R) -> R {
    let mut rule = FiberTestRule::new();
    f(&mut rule)
}
