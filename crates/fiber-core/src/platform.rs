//! Platform abstraction traits for the reconciler's scheduling needs.
//!
//! The reconciler never sleeps or spawns anything itself. It asks the host
//! platform to call back when it is idle and, once called, consults a
//! [`Deadline`] to decide when to hand control back.

use std::time::Duration;

/// Arranges for the work loop to be invoked during the next idle period.
///
/// Implementations must be safe to share across threads even though the
/// reconciler itself is driven from a single thread.
pub trait IdleScheduler: Send + Sync {
    /// Request that the host invoke the work loop when it is next idle.
    fn request_idle_callback(&self);
}

/// Time left in the idle window the work loop is currently running in.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

impl<F> Deadline for F
where
    F: Fn() -> Duration,
{
    fn time_remaining(&self) -> Duration {
        self()
    }
}

/// A deadline that never expires. Running the loop with it processes every
/// pending unit of work in one pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Scheduler that ignores idle requests. Callers drive the loop by hand.
#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl IdleScheduler for DefaultScheduler {
    fn request_idle_callback(&self) {}
}
