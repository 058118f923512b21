//! Idle scheduling and frame deadlines for hosts running on plain `std`.
//!
//! A [`StdRuntime`] builds reconcilers wired to its [`StdIdleScheduler`] and
//! feeds their work loop one [`FrameDeadline`] per idle period.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use fiber_core::{
    Deadline, HostTree, IdleScheduler, Reconciler, ReconcilerOptions, RenderError,
};

/// Default slice of time the work loop gets per idle period, about one frame
/// at 60 Hz.
pub const DEFAULT_FRAME_BUDGET: Duration = Duration::from_micros(16_667);

/// Remembers that the work loop asked for another idle period, and can poke
/// an embedding event loop when that happens.
pub struct StdIdleScheduler {
    idle_requested: AtomicBool,
    idle_waker: RwLock<Option<Arc<dyn Fn() + Send + Sync + 'static>>>,
}

impl StdIdleScheduler {
    pub fn new() -> Self {
        Self {
            idle_requested: AtomicBool::new(false),
            idle_waker: RwLock::new(None),
        }
    }

    /// Consumes the pending idle request, if any.
    pub fn take_idle_request(&self) -> bool {
        self.idle_requested.swap(false, Ordering::SeqCst)
    }

    /// Installs the callback run on every idle request, replacing the old one.
    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    /// Stops poking the event loop; requests are still recorded.
    pub fn clear_idle_waker(&self) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .idle_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdIdleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdIdleScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdIdleScheduler")
            .field("idle_requested", &self.idle_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl IdleScheduler for StdIdleScheduler {
    fn request_idle_callback(&self) {
        self.idle_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Deadline measured against [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct FrameDeadline {
    start: Instant,
    budget: Duration,
}

impl FrameDeadline {
    /// Starts a window of `budget` beginning now.
    pub fn start(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }
}

impl Deadline for FrameDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Convenience container bundling the idle scheduler with a frame budget.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdIdleScheduler>,
    frame_budget: Duration,
}

impl StdRuntime {
    /// Creates a runtime with [`DEFAULT_FRAME_BUDGET`].
    pub fn new() -> Self {
        Self::with_frame_budget(DEFAULT_FRAME_BUDGET)
    }

    pub fn with_frame_budget(frame_budget: Duration) -> Self {
        Self {
            scheduler: Arc::new(StdIdleScheduler::default()),
            frame_budget,
        }
    }

    /// Returns the scheduler implementation.
    pub fn scheduler(&self) -> Arc<StdIdleScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// Builds a reconciler whose idle requests land on this runtime's scheduler.
    pub fn reconciler<H: HostTree>(&self, host: H, options: ReconcilerOptions) -> Reconciler<H> {
        Reconciler::with_options(host, self.scheduler(), options)
    }

    /// Returns whether an idle callback was requested since the last poll.
    pub fn take_idle_request(&self) -> bool {
        self.scheduler.take_idle_request()
    }

    /// Opens a fresh deadline window of the configured budget.
    pub fn frame_deadline(&self) -> FrameDeadline {
        FrameDeadline::start(self.frame_budget)
    }

    /// Runs one idle period if one was requested. Returns whether the loop ran.
    pub fn run_idle<H: HostTree>(
        &self,
        reconciler: &mut Reconciler<H>,
    ) -> Result<bool, RenderError> {
        if !self.take_idle_request() {
            return Ok(false);
        }
        reconciler.work_loop(&self.frame_deadline())?;
        Ok(true)
    }

    /// Keeps granting idle periods until the pending generation has committed.
    /// Returns how many periods it took.
    pub fn run_until_committed<H: HostTree>(
        &self,
        reconciler: &mut Reconciler<H>,
    ) -> Result<usize, RenderError> {
        let mut periods = 0;
        while reconciler.has_pending_work() {
            // The loop re-arms itself on every pass, so a request is always
            // pending here; the flag is consumed to keep it in sync.
            self.take_idle_request();
            if let Err(err) = reconciler.work_loop(&self.frame_deadline()) {
                log::error!("render failed after {periods} idle periods: {err}");
                return Err(err);
            }
            periods += 1;
        }
        log::debug!("generation committed after {periods} idle periods");
        Ok(periods)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("frame_budget", &self.frame_budget)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use fiber_core::{Element, MemoryHost};

    use super::*;

    #[test]
    fn reconciler_arms_idle_callback_and_wakes() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        runtime.scheduler().set_idle_waker({
            let wakes = wakes.clone();
            move || {
                wakes.fetch_add(1, Ordering::SeqCst);
            }
        });

        let _reconciler = runtime.reconciler(MemoryHost::new(), ReconcilerOptions::default());

        assert!(runtime.take_idle_request());
        assert!(!runtime.take_idle_request());
        assert_eq!(wakes.load(Ordering::SeqCst), 1);

        runtime.scheduler().clear_idle_waker();
    }

    #[test]
    fn frame_deadline_counts_down_from_budget() {
        let deadline = FrameDeadline::start(Duration::from_secs(60));
        assert!(deadline.time_remaining() > Duration::from_secs(59));

        let spent = FrameDeadline::start(Duration::ZERO);
        assert_eq!(spent.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn run_until_committed_mounts_tree() {
        let runtime = StdRuntime::new();
        let mut host = MemoryHost::new();
        let container = host.create_container("div").unwrap();
        let mut reconciler = runtime.reconciler(host, ReconcilerOptions::default());

        reconciler
            .render(Element::new("p").child("hello"), container)
            .unwrap();
        let periods = runtime.run_until_committed(&mut reconciler).unwrap();

        assert!(periods >= 1);
        assert!(!reconciler.has_pending_work());
        assert_eq!(reconciler.host().text_content(container).unwrap(), "hello");
    }

    #[test]
    fn run_idle_is_skipped_without_request() {
        let runtime = StdRuntime::new();
        let mut reconciler = runtime.reconciler(MemoryHost::new(), ReconcilerOptions::default());

        assert!(runtime.run_idle(&mut reconciler).unwrap());
        // The pass above re-armed the loop.
        assert!(runtime.run_idle(&mut reconciler).unwrap());

        runtime.take_idle_request();
        assert!(!runtime.run_idle(&mut reconciler).unwrap());
    }
}
