//! Tunables for [`crate::Reconciler`].

use std::time::Duration;

/// What [`crate::Reconciler::render`] does when a previous generation has been
/// seeded but not yet committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReentrantRender {
    /// Drop the in-flight generation and start over from the new element.
    /// Host nodes already created for the dropped generation are never attached.
    #[default]
    Discard,
    /// Refuse the call with [`crate::RenderError::RenderInFlight`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// The work loop yields once the deadline reports less time than this.
    pub yield_threshold: Duration,
    pub reentrant_render: ReentrantRender,
}

impl ReconcilerOptions {
    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_reentrant_render(mut self, policy: ReentrantRender) -> Self {
        self.reentrant_render = policy;
        self
    }
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            reentrant_render: ReentrantRender::default(),
        }
    }
}
