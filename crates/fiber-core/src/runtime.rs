use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::IdleScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn IdleScheduler>,
    needs_frame: Cell<bool>,
    rerender_requested: Cell<bool>,
    // setter calls since the last installed update root
    batched_updates: Cell<usize>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn IdleScheduler>) -> Self {
        Self {
            scheduler,
            needs_frame: Cell::new(false),
            rerender_requested: Cell::new(false),
            batched_updates: Cell::new(0),
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.request_idle_callback();
    }

    fn request_rerender(&self) {
        self.batched_updates.set(self.batched_updates.get() + 1);
        self.rerender_requested.set(true);
        self.schedule();
    }

    fn take_rerender_request(&self) -> Option<usize> {
        if !self.rerender_requested.replace(false) {
            return None;
        }
        Some(self.batched_updates.replace(0))
    }
}

/// Shared runtime state between a [`Scheduler`](crate::Scheduler) and the
/// state setters handed out to components.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn IdleScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn set_needs_frame(&self, value: bool) {
        self.inner.needs_frame.set(value);
    }

    /// Ask the platform for another idle callback.
    pub fn schedule_frame(&self) {
        self.inner.schedule();
    }

    pub fn has_rerender_request(&self) -> bool {
        self.inner.rerender_requested.get()
    }

    /// Consume a pending re-render request, returning how many setter calls
    /// were batched into it.
    pub(crate) fn take_rerender_request(&self) -> Option<usize> {
        self.inner.take_rerender_request()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("needs_frame", &self.inner.needs_frame.get())
            .field("rerender_requested", &self.inner.rerender_requested.get())
            .finish()
    }
}

/// Weak handle to a [`Runtime`]. Setters hold one so a component's state
/// never keeps its scheduler alive.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Returns `false` when the runtime has already been dropped.
    pub fn request_rerender(&self) -> bool {
        match self.0.upgrade() {
            Some(inner) => {
                inner.request_rerender();
                true
            }
            None => false,
        }
    }

    pub fn schedule_frame(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuntimeHandle").field(&self.is_alive()).finish()
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl IdleScheduler for DefaultScheduler {
    fn request_idle_callback(&self) {}
}

#[cfg(test)]
#[derive(Default)]
pub struct TestScheduler {
    requests: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl TestScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl IdleScheduler for TestScheduler {
    fn request_idle_callback(&self) {
        self.requests
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
