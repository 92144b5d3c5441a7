// src/task/context.rs

//! Per-task execution context handed to [`TaskBody::run`](super::TaskBody::run).

/// Collects what a task reports about its own execution.
///
/// The engine resets the context before each task and reads it back afterwards
/// for the throughput log line.
#[derive(Debug, Default, Clone)]
pub struct ExecutionContext {
    flops: u64,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `flops` floating-point operations performed by the current task.
    pub fn add_flops(&mut self, flops: u64) {
        self.flops = self.flops.saturating_add(flops);
    }

    pub fn flops(&self) -> u64 {
        self.flops
    }

    /// Throughput in Gflops/sec over `seconds` of wall time.
    pub fn gflops(&self, seconds: f64) -> f64 {
        if seconds > 0.0 {
            self.flops as f64 / seconds / 1e9
        } else {
            0.0
        }
    }

    pub(crate) fn reset(&mut self) {
        self.flops = 0;
    }
}
