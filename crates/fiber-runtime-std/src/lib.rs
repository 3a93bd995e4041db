//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `fiber-core`. Applications construct a
//! [`StdRuntime`], hand its [`Runtime`] to a [`Scheduler`], and call
//! [`StdRuntime::run_idle_callback`] whenever the host is idle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use fiber_core::{
    Clock, Deadline, HostAdapter, HostError, IdleScheduler, Runtime, RuntimeHandle, Scheduler,
    WorkStatus,
};
use log::trace;

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Idle scheduler that records requests and optionally wakes an event
/// loop.
pub struct StdScheduler {
    idle_requested: AtomicBool,
    waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            idle_requested: AtomicBool::new(false),
            waker: RwLock::new(None),
        }
    }

    /// Returns whether an idle callback has been requested since the last
    /// call.
    pub fn take_idle_request(&self) -> bool {
        self.idle_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever an idle callback is requested.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.waker.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_waker(&self) {
        *self.waker.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("idle_requested", &self.idle_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl IdleScheduler for StdScheduler {
    fn request_idle_callback(&self) {
        self.idle_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed(&self, since: Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Deadline measured against the wall clock: `budget` from the moment it
/// was created.
#[derive(Debug, Clone, Copy)]
pub struct IdleDeadline {
    start: Instant,
    budget: Duration,
}

impl IdleDeadline {
    pub fn new(budget: Duration) -> Self {
        Self::starting_at(Instant::now(), budget)
    }

    pub fn starting_at(start: Instant, budget: Duration) -> Self {
        Self { start, budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl Deadline for IdleDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Convenience container bundling the standard scheduler and clock.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: Arc<StdClock>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            clock: Arc::new(StdClock),
            runtime,
        }
    }

    /// Returns a [`fiber_core::Runtime`] wired to the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn clock(&self) -> Arc<StdClock> {
        Arc::clone(&self.clock)
    }

    /// Returns whether an idle callback was requested since the last poll.
    pub fn take_idle_request(&self) -> bool {
        self.scheduler.take_idle_request()
    }

    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_waker(waker);
    }

    pub fn clear_waker(&self) {
        self.scheduler.clear_waker();
    }

    /// Runs one idle period of `budget` against `scheduler` when a callback
    /// has been requested. Returns `None` if nothing asked for one.
    pub fn run_idle_callback<H: HostAdapter>(
        &self,
        scheduler: &mut Scheduler<H>,
        budget: Duration,
    ) -> Result<Option<WorkStatus>, HostError> {
        if !self.take_idle_request() {
            return Ok(None);
        }
        let deadline = IdleDeadline::starting_at(self.clock.now(), budget);
        let status = scheduler.work_loop(&deadline)?;
        trace!(
            "idle callback finished with {status:?} after {:?}",
            self.clock.elapsed(deadline.start)
        );
        Ok(Some(status))
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
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
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::AtomicUsize;

    use fiber_core::{element, Component, MemoryHost, Setter};

    use super::*;

    #[test]
    fn idle_deadline_counts_down_from_its_budget() {
        let deadline = IdleDeadline::new(Duration::from_secs(60));
        assert!(deadline.time_remaining() <= deadline.budget());
        assert!(deadline.time_remaining() > Duration::from_secs(30));

        let spent = IdleDeadline::starting_at(Instant::now(), Duration::ZERO);
        assert_eq!(spent.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn waker_runs_on_every_idle_request() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        runtime.set_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        runtime.runtime().schedule_frame();
        runtime.runtime_handle().schedule_frame();
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert!(runtime.take_idle_request());
        assert!(!runtime.take_idle_request());

        runtime.clear_waker();
        runtime.runtime().schedule_frame();
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn std_runtime_requests_idle_time_and_re_renders_on_state_change() {
        let setter: Rc<RefCell<Option<Setter<i32>>>> = Rc::new(RefCell::new(None));
        let captured = setter.clone();
        let counter = Component::new("Counter", move |_, hooks| {
            let (count, set_count) = hooks.use_state(0);
            captured.borrow_mut().replace(set_count);
            element("p").text(count).build()
        });

        let runtime = StdRuntime::new();
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let mut scheduler = Scheduler::with_runtime(host, runtime.runtime());
        scheduler.render(element(counter).build(), container);

        let status = runtime
            .run_idle_callback(&mut scheduler, Duration::from_secs(1))
            .expect("initial render");
        assert!(matches!(status, Some(WorkStatus::Committed(_))));
        assert_eq!(
            runtime.run_idle_callback(&mut scheduler, Duration::from_secs(1)),
            Ok(None)
        );

        let set_count = setter.borrow().clone().expect("state captured during render");
        set_count.set(1);
        assert!(scheduler.has_pending_work());

        let status = runtime
            .run_idle_callback(&mut scheduler, Duration::from_secs(1))
            .expect("re-render");
        assert!(matches!(status, Some(WorkStatus::Committed(_))));
        assert_eq!(scheduler.host().text_content(container), "1");
    }
}
