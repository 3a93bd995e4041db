use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fiber_core::{
    CommitSummary, Deadline, Element, HostError, IdleScheduler, MemoryHost, Mutation,
    MutationCounts, NodeId, Runtime, Scheduler, SchedulerConfig, WorkStatus,
};
use log::trace;

/// Deadline that lets exactly `units` units of work run before the loop
/// yields.
#[derive(Debug)]
pub struct StepDeadline {
    units: usize,
    consulted: Cell<usize>,
}

impl StepDeadline {
    pub fn new(units: usize) -> Self {
        Self {
            units: units.max(1),
            consulted: Cell::new(0),
        }
    }
}

impl Deadline for StepDeadline {
    fn time_remaining(&self) -> Duration {
        let consulted = self.consulted.get() + 1;
        self.consulted.set(consulted);
        if consulted >= self.units {
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}

/// Deadline that is already spent: one unit per work loop call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExhaustedDeadline;

impl Deadline for ExhaustedDeadline {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

/// Idle scheduler that only counts requests.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: AtomicUsize,
}

impl CountingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl IdleScheduler for CountingScheduler {
    fn request_idle_callback(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// A [`Scheduler`] over a [`MemoryHost`] with a container already created.
pub struct TestRenderer {
    scheduler: Scheduler<MemoryHost>,
    container: NodeId,
    idle: Arc<CountingScheduler>,
}

impl TestRenderer {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        let idle = Arc::new(CountingScheduler::default());
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let scheduler = Scheduler::with_config(host, Runtime::new(idle.clone()), config);
        Self {
            scheduler,
            container,
            idle,
        }
    }

    /// Renders `root` and runs every pending pass to completion. Mutations
    /// from earlier renders are discarded first.
    pub fn render(&mut self, root: Element) -> Result<Option<CommitSummary>, HostError> {
        self.take_mutations();
        self.scheduler.render(root, self.container);
        self.flush()
    }

    /// Installs a render pass without performing any work.
    pub fn start(&mut self, root: Element) {
        self.scheduler.render(root, self.container);
    }

    pub fn step(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, HostError> {
        self.scheduler.work_loop(deadline)
    }

    pub fn flush(&mut self) -> Result<Option<CommitSummary>, HostError> {
        self.scheduler.flush()
    }

    /// Drives pending work in slices of `units` units of work until
    /// nothing is pending. Returns the summaries of every commit along the
    /// way and how many slices it took.
    pub fn run_in_slices(
        &mut self,
        units: usize,
    ) -> Result<(Vec<CommitSummary>, usize), HostError> {
        let mut commits = Vec::new();
        let mut slices = 0;
        loop {
            slices += 1;
            match self.scheduler.work_loop(&StepDeadline::new(units))? {
                WorkStatus::Idle => break,
                WorkStatus::Yielded => trace!("slice {slices} yielded"),
                WorkStatus::Committed(summary) => commits.push(summary),
            }
        }
        Ok((commits, slices))
    }

    /// Fires `event_type` on the first `tag` element. `None` if there is
    /// no such element.
    pub fn dispatch(&self, tag: &str, event_type: &str) -> Option<usize> {
        let host = self.scheduler.host();
        let node = host.find_first(self.container, tag)?;
        host.dispatch(node, event_type).ok()
    }

    pub fn click(&self, tag: &str) -> Option<usize> {
        self.dispatch(tag, "click")
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn host(&self) -> &MemoryHost {
        self.scheduler.host()
    }

    pub fn scheduler(&self) -> &Scheduler<MemoryHost> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<MemoryHost> {
        &mut self.scheduler
    }

    pub fn mutations(&self) -> &[Mutation] {
        self.scheduler.host().mutations()
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        self.scheduler.host_mut().take_mutations()
    }

    pub fn counts(&self) -> MutationCounts {
        self.scheduler.host().counts()
    }

    pub fn dump(&self) -> String {
        self.scheduler.host().dump_tree(self.container)
    }

    pub fn text(&self) -> String {
        self.scheduler.host().text_content(self.container)
    }

    pub fn idle_requests(&self) -> usize {
        self.idle.requests()
    }
}

impl Default for TestRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
