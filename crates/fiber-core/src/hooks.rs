//! Order-indexed state slots for function components.
//!
//! A component receives a [`Hooks`] cursor for every evaluation. Each
//! `use_state` call claims the next slot; the slot's previous value comes
//! from the alternate fiber's hook at the same index, folded forward by the
//! transitions queued on it since that render.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use log::{debug, warn};

use crate::owned::Owned;
use crate::runtime::RuntimeHandle;

type StateAction<T> = Rc<dyn Fn(&T) -> T>;

// Queued transitions are type-erased `StateAction<T>` values.
type ActionQueue = Owned<Vec<Box<dyn Any>>>;

/// One state slot owned by a component fiber.
#[derive(Clone)]
pub struct Hook {
    state: Rc<dyn Any>,
    queue: ActionQueue,
}

impl Hook {
    pub fn state<T: 'static>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }

    /// Number of transitions queued for the next render.
    pub fn queued(&self) -> usize {
        self.queue.with(|queue| queue.len())
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("queued", &self.queued()).finish()
    }
}

/// Hook cursor handed to a component while it renders.
pub struct Hooks<'a> {
    previous: &'a [Hook],
    hooks: Vec<Hook>,
    runtime: RuntimeHandle,
    component: &'static str,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(previous: &'a [Hook], runtime: RuntimeHandle, component: &'static str) -> Self {
        Self {
            previous,
            hooks: Vec::with_capacity(previous.len()),
            runtime,
            component,
        }
    }

    /// Index of the next slot to be claimed.
    pub fn cursor(&self) -> usize {
        self.hooks.len()
    }

    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
        self.use_state_with(move || initial)
    }

    /// Like [`use_state`](Self::use_state) but only computes the initial
    /// value when the slot has no previous state.
    pub fn use_state_with<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, Setter<T>) {
        let index = self.hooks.len();
        let prior = self.previous.get(index);
        let state = match prior.map(|hook| (hook, hook.state::<T>())) {
            Some((hook, Some(seed))) => fold_queue(hook, seed.clone()),
            Some((_, None)) => {
                warn!(
                    "{}: hook {index} changed type between renders; resetting its state",
                    self.component
                );
                init()
            }
            None => init(),
        };

        let hook = Hook {
            state: Rc::new(state.clone()),
            queue: ActionQueue::default(),
        };
        let setter = Setter {
            queue: hook.queue.clone(),
            runtime: self.runtime.clone(),
            _marker: PhantomData,
        };
        self.hooks.push(hook);
        (state, setter)
    }

    pub(crate) fn finish(self) -> Vec<Hook> {
        if !self.previous.is_empty() && self.previous.len() != self.hooks.len() {
            debug!(
                "{}: hook count changed from {} to {}",
                self.component,
                self.previous.len(),
                self.hooks.len()
            );
        }
        self.hooks
    }
}

// Replays without draining: a superseded pass must not lose transitions.
fn fold_queue<T: 'static>(hook: &Hook, seed: T) -> T {
    let actions: Vec<StateAction<T>> = hook.queue.with(|queue| {
        queue
            .iter()
            .filter_map(|action| action.downcast_ref::<StateAction<T>>().cloned())
            .collect()
    });
    actions.iter().fold(seed, |state, action| action(&state))
}

/// Enqueues transitions on one hook slot and requests a re-render.
pub struct Setter<T: 'static> {
    queue: ActionQueue,
    runtime: RuntimeHandle,
    _marker: PhantomData<fn(&T) -> T>,
}

impl<T: 'static> Setter<T> {
    /// Queue `transition`; it is applied to the slot's state on the next
    /// render, after any transitions queued before it.
    pub fn update(&self, transition: impl Fn(&T) -> T + 'static) {
        let action: StateAction<T> = Rc::new(transition);
        self.queue.update(|queue| queue.push(Box::new(action)));
        if !self.runtime.request_rerender() {
            warn!("state update ignored: its scheduler has been dropped");
        }
    }

    /// Number of transitions queued through this setter's slot.
    pub fn pending(&self) -> usize {
        self.queue.with(|queue| queue.len())
    }
}

impl<T: Clone + 'static> Setter<T> {
    pub fn set(&self, value: T) {
        self.update(move |_| value.clone());
    }
}

impl<T: 'static> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            runtime: self.runtime.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> PartialEq for Setter<T> {
    fn eq(&self, other: &Self) -> bool {
        self.queue.ptr_eq(&other.queue)
    }
}

impl<T: 'static> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("pending", &self.pending())
            .finish()
    }
}
