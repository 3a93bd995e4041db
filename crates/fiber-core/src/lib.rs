#![doc = r"Core of the fiber reconciliation engine: elements, fibers, hooks, the work loop and commit."]

extern crate self as fiber_core;

pub mod collections;
pub mod commit;
pub mod component;
pub mod config;
pub mod element;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod memory;
pub mod owned;
pub mod platform;
pub mod props;
mod reconcile;
pub mod runtime;
pub mod scheduler;

pub use commit::CommitSummary;
pub use component::Component;
pub use config::SchedulerConfig;
pub use element::{
    create_element, element, text_element, Child, Element, ElementBuilder, ElementType, Event,
    EventHandler, PropMap, PropValue, Props, CHILDREN, NODE_VALUE, TEXT_ELEMENT,
};
pub use fiber::{EffectTag, Fiber, FiberId, FiberTree};
pub use hooks::{Hook, Hooks, Setter};
pub use host::{HostAdapter, HostError};
pub use memory::{MemoryHost, MemoryNode, MemoryNodeKind, Mutation, MutationCounts};
pub use owned::Owned;
pub use platform::{Clock, Deadline, IdleScheduler, Unbounded};
pub use props::{diff_props, PropPatch};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use scheduler::{Phase, Scheduler, WorkStatus};

#[cfg(test)]
pub use runtime::TestScheduler;

/// Identifier of a node owned by a [`HostAdapter`].
pub type NodeId = usize;

#[cfg(test)]
#[path = "tests/hook_continuity_tests.rs"]
mod hook_continuity_tests;
