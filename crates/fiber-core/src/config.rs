use std::borrow::Cow;
use std::time::Duration;

/// Tunables for a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// The work loop yields once the deadline reports less than this.
    pub yield_threshold: Duration,
    /// Props whose name starts with this prefix are event handlers.
    pub event_prefix: Cow<'static, str>,
    /// Free the previous generation of fibers after every commit.
    pub sweep_after_commit: bool,
}

impl SchedulerConfig {
    pub const DEFAULT_YIELD_THRESHOLD: Duration = Duration::from_millis(1);

    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_event_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> Self {
        self.event_prefix = prefix.into();
        self
    }

    pub fn with_sweep_after_commit(mut self, sweep: bool) -> Self {
        self.sweep_after_commit = sweep;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Self::DEFAULT_YIELD_THRESHOLD,
            event_prefix: Cow::Borrowed("on"),
            sweep_after_commit: true,
        }
    }
}
