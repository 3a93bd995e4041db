//! Platform abstraction traits for the fiber runtime.
//!
//! These traits let the host environment drive the work loop: the runtime
//! asks for an idle callback whenever work is pending, and each callback
//! hands the loop a [`Deadline`] describing how much of the idle period is
//! left.

use std::time::Duration;

/// Requests idle-time callbacks from the host platform.
///
/// Implementations must be safe to use from multiple threads so a platform
/// waker can live outside the UI thread. The callback itself always runs on
/// the thread that owns the [`Scheduler`](crate::Scheduler).
pub trait IdleScheduler: Send + Sync {
    /// Ask the host to invoke the work loop during its next idle period.
    fn request_idle_callback(&self);
}

/// Remaining time budget for one work loop invocation.
///
/// The loop consults this after every unit of work; it is the only place
/// rendering may be suspended.
pub trait Deadline {
    /// Time left in the current idle period.
    fn time_remaining(&self) -> Duration;
}

/// A deadline that never runs out. Used by `Scheduler::flush`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

impl<D: Deadline + ?Sized> Deadline for &D {
    fn time_remaining(&self) -> Duration {
        (**self).time_remaining()
    }
}

/// Provides timing information for the runtime.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the time elapsed since `since`.
    fn elapsed(&self, since: Self::Instant) -> Duration;
}
