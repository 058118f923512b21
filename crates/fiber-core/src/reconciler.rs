//! The render engine: owns both fiber generations and drives the work loop.

use std::sync::Arc;

use log::{debug, error, trace, warn};

use crate::commit::{commit_deletion, commit_work, update_dom};
use crate::element::{Element, ElementType, Props};
use crate::fiber::{FiberId, FiberTree, PendingDeletion};
use crate::host::{HostNodeId, HostTree};
use crate::options::{ReconcilerOptions, ReentrantRender};
use crate::platform::{Deadline, DefaultScheduler, IdleScheduler, Unbounded};
use crate::reconcile::reconcile_children;
use crate::{HostError, RenderError};

/// Incremental renderer bound to one host tree.
///
/// `render` only seeds a new generation; the host sees nothing until enough
/// calls to [`Reconciler::work_loop`] have visited every fiber, at which point
/// all effects are committed together.
pub struct Reconciler<H: HostTree> {
    host: H,
    scheduler: Arc<dyn IdleScheduler>,
    options: ReconcilerOptions,
    current: Option<FiberTree>,
    work_in_progress: Option<FiberTree>,
    next_unit_of_work: Option<FiberId>,
    pending_deletions: Vec<PendingDeletion>,
}

impl<H: HostTree> Reconciler<H> {
    pub fn new(host: H) -> Self {
        Self::with_scheduler(host, Arc::new(DefaultScheduler))
    }

    pub fn with_scheduler(host: H, scheduler: Arc<dyn IdleScheduler>) -> Self {
        Self::with_options(host, scheduler, ReconcilerOptions::default())
    }

    /// The loop is armed from the start, so the first idle callback is
    /// requested here.
    pub fn with_options(
        host: H,
        scheduler: Arc<dyn IdleScheduler>,
        options: ReconcilerOptions,
    ) -> Self {
        scheduler.request_idle_callback();
        Self {
            host,
            scheduler,
            options,
            current: None,
            work_in_progress: None,
            next_unit_of_work: None,
            pending_deletions: Vec::new(),
        }
    }

    /// Starts a new generation rendering `element` into `container`.
    pub fn render(&mut self, element: Element, container: HostNodeId) -> Result<(), RenderError> {
        if self.work_in_progress.is_some() {
            match self.options.reentrant_render {
                ReentrantRender::Reject => return Err(RenderError::RenderInFlight),
                ReentrantRender::Discard => {
                    warn!("render called before the previous generation committed; discarding it");
                    if let Some(dropped) = self.work_in_progress.take() {
                        self.next_unit_of_work = None;
                        self.pending_deletions.clear();
                        self.release_unmounted(&dropped)?;
                    }
                }
            }
        }

        let alternate = self.current.as_ref().map(FiberTree::root);
        let tree = FiberTree::new_root(container, element, alternate);
        debug!(
            "seeding generation into container {container} (has previous: {})",
            alternate.is_some()
        );
        self.next_unit_of_work = Some(tree.root());
        self.work_in_progress = Some(tree);
        self.pending_deletions.clear();
        self.scheduler.request_idle_callback();
        Ok(())
    }

    /// Processes units of work until none remain or `deadline` asks to yield,
    /// commits if the generation is complete, then re-arms the idle callback.
    ///
    /// At least one unit runs per call, so an already expired deadline still
    /// makes progress.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<(), RenderError> {
        let result = self.run(deadline);
        if let Err(err) = &result {
            error!("render failed, keeping the last committed tree: {err}");
            self.abandon();
        }
        self.scheduler.request_idle_callback();
        result
    }

    /// Runs the current generation to completion in one pass.
    pub fn flush_sync(&mut self) -> Result<(), RenderError> {
        self.work_loop(&Unbounded)
    }

    fn run(&mut self, deadline: &dyn Deadline) -> Result<(), RenderError> {
        let mut units = 0usize;
        let mut should_yield = false;
        while let Some(unit) = self.next_unit_of_work {
            if should_yield {
                debug!("yielding after {units} units of work");
                break;
            }
            self.next_unit_of_work = self.perform_unit_of_work(unit)?;
            units += 1;
            should_yield = deadline.time_remaining() < self.options.yield_threshold;
        }

        if self.next_unit_of_work.is_none() && self.work_in_progress.is_some() {
            self.commit_root()?;
        }
        Ok(())
    }

    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, HostError> {
        let Some(wip) = self.work_in_progress.as_mut() else {
            return Ok(None);
        };
        trace!("performing unit of work {id:?}");

        let fiber = &wip[id];
        let props = fiber.props.clone();
        if fiber.node.is_none() {
            let node = match &fiber.ty {
                Some(ElementType::Text) => self.host.create_text_node()?,
                Some(ElementType::Host(tag)) => self.host.create_node(tag)?,
                None => return Ok(wip.next_unit(id)),
            };
            if let Err(err) = update_dom(&mut self.host, node, &Props::default(), &props) {
                self.host.release_node(node)?;
                return Err(err);
            }
            wip[id].node = Some(node);
        }

        reconcile_children(
            wip,
            self.current.as_ref(),
            id,
            props.children(),
            &mut self.pending_deletions,
        );
        Ok(wip.next_unit(id))
    }

    fn commit_root(&mut self) -> Result<(), HostError> {
        let Some(wip) = self.work_in_progress.as_ref() else {
            return Ok(());
        };

        let deletions = self.pending_deletions.len();
        if let Some(current) = self.current.as_ref() {
            for deletion in &self.pending_deletions {
                commit_deletion(&mut self.host, current, deletion)?;
            }
        }
        let applied = commit_work(&mut self.host, wip, self.current.as_ref(), wip.root())?;
        debug!("committed {deletions} deletions and {applied} placements/updates");

        self.current = self.work_in_progress.take();
        self.pending_deletions.clear();
        Ok(())
    }

    /// Drops an in-flight generation after a host failure. The last committed
    /// tree stays current.
    fn abandon(&mut self) {
        if let Some(dropped) = self.work_in_progress.take() {
            debug!("abandoning in-flight generation");
            if let Err(err) = self.release_unmounted(&dropped) {
                warn!("could not release nodes of the abandoned generation: {err}");
            }
        }
        self.next_unit_of_work = None;
        self.pending_deletions.clear();
    }

    /// Hands back the host nodes `tree` created for itself. Nodes inherited
    /// through an alternate still belong to the committed tree, and the root
    /// node is the container.
    fn release_unmounted(&mut self, tree: &FiberTree) -> Result<(), HostError> {
        let root = tree.root();
        let mut released = 0usize;
        for (id, fiber) in tree.iter() {
            if id == root || fiber.alternate().is_some() {
                continue;
            }
            if let Some(node) = fiber.node() {
                self.host.release_node(node)?;
                released += 1;
            }
        }
        trace!("released {released} host nodes of a dropped generation");
        Ok(())
    }

    /// Whether a seeded generation has not been committed yet.
    pub fn has_pending_work(&self) -> bool {
        self.work_in_progress.is_some()
    }

    pub fn next_unit_of_work(&self) -> Option<FiberId> {
        self.next_unit_of_work
    }

    /// Last committed generation.
    pub fn current_tree(&self) -> Option<&FiberTree> {
        self.current.as_ref()
    }

    pub fn work_in_progress_tree(&self) -> Option<&FiberTree> {
        self.work_in_progress.as_ref()
    }

    /// Fibers of the current generation scheduled for removal at the next
    /// commit, each recorded with [`crate::Effect::Deletion`].
    pub fn pending_deletions(&self) -> &[PendingDeletion] {
        &self.pending_deletions
    }

    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
