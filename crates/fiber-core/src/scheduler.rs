//! Cooperative work loop and render entry point.
//!
//! A [`Scheduler`] owns one fiber tree rendered into one host. Rendering
//! is split into units of work (one per fiber) that run until the
//! [`Deadline`] runs low; the loop then yields and picks up from the saved
//! cursor on the next call. Once no unit remains the finished tree is
//! committed to the host in a single pass.

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::commit::{commit_root, CommitSummary};
use crate::component::Component;
use crate::config::SchedulerConfig;
use crate::element::{Element, ElementType, PropMap, Props};
use crate::fiber::{Fiber, FiberId, FiberTree};
use crate::hooks::{Hook, Hooks};
use crate::host::{HostAdapter, HostError};
use crate::platform::{Deadline, Unbounded};
use crate::props::materialize;
use crate::reconcile::{reconcile_children, Deletions};
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};
use crate::NodeId;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Render,
    Commit,
}

/// Outcome of one [`Scheduler::work_loop`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing to do.
    Idle,
    /// The deadline ran low with units left; call again to resume.
    Yielded,
    Committed(CommitSummary),
}

pub struct Scheduler<H: HostAdapter> {
    tree: FiberTree,
    host: H,
    runtime: Runtime,
    config: SchedulerConfig,
    committed_root: Option<FiberId>,
    wip_root: Option<FiberId>,
    next_unit_of_work: Option<FiberId>,
    deletions: Deletions,
    phase: Phase,
}

impl<H: HostAdapter> Scheduler<H> {
    /// Creates a scheduler whose idle requests go nowhere. Drive it with
    /// [`flush`](Self::flush).
    pub fn new(host: H) -> Self {
        Self::with_runtime(host, Runtime::new(Arc::new(DefaultScheduler)))
    }

    /// Creates a scheduler sharing `runtime` with its setters.
    pub fn with_runtime(host: H, runtime: Runtime) -> Self {
        Self::with_config(host, runtime, SchedulerConfig::default())
    }

    pub fn with_config(host: H, runtime: Runtime, config: SchedulerConfig) -> Self {
        Self {
            tree: FiberTree::new(),
            host,
            runtime,
            config,
            committed_root: None,
            wip_root: None,
            next_unit_of_work: None,
            deletions: Deletions::default(),
            phase: Phase::Idle,
        }
    }

    /// Starts a render pass of `element` into `container`.
    ///
    /// Any pass still in progress is discarded, and so is a re-render
    /// request raised before this call: the new pass re-renders every
    /// component and folds its queued updates anyway. Nothing reaches the
    /// host until [`work_loop`](Self::work_loop) finishes the pass.
    pub fn render(&mut self, element: Element, container: NodeId) {
        if let Some(batched) = self.runtime.take_rerender_request() {
            debug!("render supersedes {batched} queued state update(s)");
        }
        let props = Props::new(PropMap::default(), vec![element]);
        self.install_root(container, props);
        self.runtime.schedule_frame();
    }

    /// Performs units of work until `deadline` runs low or the pass is
    /// done, committing a finished pass before returning.
    ///
    /// A host error aborts the pass: the work in progress is dropped and
    /// the committed tree stays as it was. A pass interrupted by a panic is
    /// dropped on the next call instead of being resumed.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, HostError> {
        self.runtime.set_needs_frame(false);
        // The cursor is only empty mid-pass if the last unit or commit unwound.
        if self.wip_root.is_some() && self.next_unit_of_work.is_none() {
            warn!("dropping render pass interrupted by a panic");
            self.abort_pass();
        }
        loop {
            self.install_pending_update();
            let Some(unit) = self.next_unit_of_work.take() else {
                break;
            };
            let next = match self.perform_unit_of_work(unit) {
                Ok(next) => next,
                Err(err) => {
                    warn!("render pass aborted: {err}");
                    self.abort_pass();
                    return Err(err);
                }
            };
            self.next_unit_of_work = next;
            if next.is_some() && deadline.time_remaining() < self.config.yield_threshold {
                trace!("work loop yielding");
                self.runtime.schedule_frame();
                return Ok(WorkStatus::Yielded);
            }
        }

        if self.wip_root.is_none() {
            return Ok(WorkStatus::Idle);
        }
        let summary = self.commit()?;
        self.install_pending_update();
        if self.has_pending_work() {
            self.runtime.schedule_frame();
        }
        Ok(WorkStatus::Committed(summary))
    }

    /// Runs the work loop without a deadline until nothing is pending.
    /// Returns the summary of the last commit, if any.
    pub fn flush(&mut self) -> Result<Option<CommitSummary>, HostError> {
        let mut last = None;
        loop {
            match self.work_loop(&Unbounded)? {
                WorkStatus::Idle => return Ok(last),
                WorkStatus::Committed(summary) => last = Some(summary),
                WorkStatus::Yielded => {}
            }
        }
    }

    /// Whether a pass is in progress or a state update is waiting to be installed.
    pub fn has_pending_work(&self) -> bool {
        self.next_unit_of_work.is_some()
            || self.wip_root.is_some()
            || (self.committed_root.is_some() && self.runtime.has_rerender_request())
    }

    /// Phase the scheduler is currently in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the host the tree is committed to.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host, e.g. to drain recorded mutations.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the scheduler and returns its host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Returns the runtime shared with state setters.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Returns a weak handle to the runtime.
    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    /// Returns the configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the fiber arena holding both the committed and in-progress trees.
    pub fn fibers(&self) -> &FiberTree {
        &self.tree
    }

    /// Root of the tree currently reflected in the host.
    pub fn committed_root(&self) -> Option<FiberId> {
        self.committed_root
    }

    /// Root of the pass being rendered, if any.
    pub fn work_in_progress_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// Fibers collected for deletion by the current pass.
    pub fn pending_deletions(&self) -> &[FiberId] {
        self.deletions.as_slice()
    }

    /// Indented outline of the committed tree.
    pub fn dump_fibers(&self) -> String {
        match self.committed_root {
            Some(root) => self.tree.dump(root),
            None => "(nothing committed)\n".to_owned(),
        }
    }

    fn install_root(&mut self, container: NodeId, props: Props) {
        self.deletions.discard(&mut self.tree);
        if let Some(stale) = self.wip_root.take() {
            debug!("discarding unfinished pass at {stale:?}");
            if self.config.sweep_after_commit {
                self.tree.sweep(self.committed_root);
            }
        }
        let root = self
            .tree
            .insert(Fiber::root(container, props, self.committed_root));
        debug!("render pass installed at {root:?} into #{container}");
        self.wip_root = Some(root);
        self.next_unit_of_work = Some(root);
        self.phase = Phase::Render;
    }

    // Requests raised before the first commit stay queued on the runtime.
    fn install_pending_update(&mut self) {
        let Some(committed) = self.committed_root else {
            return;
        };
        let Some((container, props)) = self
            .tree
            .get(committed)
            .and_then(|root| root.host_node.map(|node| (node, root.props.clone())))
        else {
            return;
        };
        let Some(batched) = self.runtime.take_rerender_request() else {
            return;
        };
        debug!("re-rendering for {batched} state update(s)");
        self.install_root(container, props);
    }

    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, HostError> {
        let Some(fiber) = self.tree.get(id) else {
            return Ok(None);
        };
        match fiber.ty.clone() {
            Some(ElementType::Component(component)) => {
                self.update_function_component(id, &component)
            }
            Some(ElementType::Host(tag)) => self.update_host_component(id, Some(&*tag))?,
            None => self.update_host_component(id, None)?,
        }
        Ok(self.tree.next_unit_of_work(id))
    }

    fn update_function_component(&mut self, id: FiberId, component: &Component) {
        trace!("render component {}", component.name());
        let runtime = self.runtime.handle();
        let Some(fiber) = self.tree.get(id) else {
            return;
        };
        let previous: &[Hook] = fiber
            .alternate
            .and_then(|alternate| self.tree.get(alternate))
            .map(|alternate| alternate.hooks.as_slice())
            .unwrap_or_default();
        let mut hooks = Hooks::new(previous, runtime, component.name());
        let output = component.render(&fiber.props, &mut hooks);
        let hooks = hooks.finish();

        if let Some(fiber) = self.tree.get_mut(id) {
            fiber.hooks = hooks;
        }
        reconcile_children(&mut self.tree, id, std::slice::from_ref(&output), &mut self.deletions);
    }

    // `tag` is `None` for the root, whose host node is the container.
    fn update_host_component(&mut self, id: FiberId, tag: Option<&str>) -> Result<(), HostError> {
        let Some(fiber) = self.tree.get(id) else {
            return Ok(());
        };
        let props = fiber.props.clone();
        if let (Some(tag), None) = (tag, fiber.host_node) {
            trace!("materialize <{tag}>");
            let node = materialize(&mut self.host, tag, &props, &self.config.event_prefix)?;
            self.tree.set_host_node(id, node);
        }
        reconcile_children(&mut self.tree, id, props.children(), &mut self.deletions);
        Ok(())
    }

    fn commit(&mut self) -> Result<CommitSummary, HostError> {
        let Some(root) = self.wip_root else {
            return Ok(CommitSummary::default());
        };
        self.phase = Phase::Commit;
        let result = commit_root(
            &self.tree,
            root,
            self.deletions.as_slice(),
            &mut self.host,
            &self.config.event_prefix,
        );
        let summary = match result {
            Ok(summary) => summary,
            Err(err) => {
                warn!("commit failed: {err}");
                self.abort_pass();
                return Err(err);
            }
        };

        self.committed_root = Some(root);
        self.wip_root = None;
        self.next_unit_of_work = None;
        self.deletions.clear();
        self.phase = Phase::Idle;
        debug!(
            "committed {} placement(s), {} update(s), {} deletion(s)",
            summary.placements, summary.updates, summary.deletions
        );
        if self.config.sweep_after_commit {
            let freed = self.tree.sweep(Some(root));
            debug!("swept {freed} fiber(s), {} live", self.tree.len());
        }
        Ok(summary)
    }

    fn abort_pass(&mut self) {
        self.wip_root = None;
        self.next_unit_of_work = None;
        self.deletions.discard(&mut self.tree);
        self.phase = Phase::Idle;
        if self.config.sweep_after_commit {
            self.tree.sweep(self.committed_root);
        }
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
