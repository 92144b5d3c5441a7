// src/dag/scheduler.rs

//! Execution engine.
//!
//! Repeatedly collects every pending task whose requirements all exist, runs
//! that batch one task at a time in discovery order, and loops until a scan
//! finds nothing ready. The first failing task aborts the rest of its batch and
//! the whole execution; pending tasks left over when nothing is ready are
//! reported as a deadlock.

use std::time::Instant;

use tracing::{debug, error, info};

use crate::dag::graph::check_cycles;
use crate::dag::task_dag::CompletedTask;
use crate::dag::TaskDag;
use crate::errors::{DagError, Result};
use crate::task::{ExecutionContext, Task};

/// A product that was bound to some requirement but not produced by its task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnproducedProduct {
    pub task: String,
    pub product: String,
}

/// Summary of a successful execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Task names per round, in execution order.
    pub rounds: Vec<Vec<String>>,
    /// Used products that were missing after their task returned, during
    /// this execution.
    pub unproduced: Vec<UnproducedProduct>,
}

impl ExecutionReport {
    /// All executed task names, in order.
    pub fn executed(&self) -> impl Iterator<Item = &str> {
        self.rounds.iter().flatten().map(|s| s.as_str())
    }

    /// Zero-based round in which `task` ran.
    pub fn round_of(&self, task: &str) -> Option<usize> {
        self.rounds
            .iter()
            .position(|round| round.iter().any(|t| t == task))
    }
}

impl TaskDag {
    /// Resolve all requirements, then run every task in dependency order.
    pub fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ExecutionReport> {
        self.resolve()?;

        if self.check_cycles() {
            check_cycles(&self.pending)?;
        }

        self.run_ready_batches(ctx)
    }

    fn run_ready_batches(&mut self, ctx: &mut ExecutionContext) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();

        loop {
            let batch = self.take_ready();
            if batch.is_empty() {
                break;
            }

            let names: Vec<String> = batch.iter().map(|t| t.name().to_string()).collect();
            debug!(round = report.rounds.len(), tasks = ?names, "executing ready batch");
            report.rounds.push(names);

            let mut batch = batch.into_iter();
            while let Some(mut task) = batch.next() {
                if let Err(source) = self.run_task(&mut task, ctx) {
                    let discarded: Vec<String> = batch.map(|t| t.name().to_string()).collect();
                    error!(
                        task = %task.name(),
                        error = %format!("{source:#}"),
                        ?discarded,
                        "task failed; aborting DAG execution"
                    );
                    return Err(DagError::TaskFailed {
                        task: task.name().to_string(),
                        source,
                    });
                }

                for product in task.products() {
                    if product.is_used() && !product.exists() {
                        error!(
                            task = %task.name(),
                            product = %product.name(),
                            "product was not successfully produced"
                        );
                        let missing = UnproducedProduct {
                            task: task.name().to_string(),
                            product: product.name().to_string(),
                        };
                        self.unproduced.push(missing.clone());
                        report.unproduced.push(missing);
                    }
                }

                self.completed.push(CompletedTask::from_task(&task));
            }
        }

        if !self.pending.is_empty() {
            let pending = self.pending_names();
            error!(?pending, "some tasks were not executed");
            return Err(DagError::Deadlock { pending });
        }

        info!(
            rounds = report.rounds.len(),
            tasks = report.rounds.iter().map(Vec::len).sum::<usize>(),
            "all tasks executed"
        );
        Ok(report)
    }

    /// Remove and return every ready task, preserving pending order.
    fn take_ready(&mut self) -> Vec<Task> {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.task.is_ready());
        self.pending = waiting;
        ready.into_iter().map(|p| p.task).collect()
    }

    fn run_task(&mut self, task: &mut Task, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        info!(task = %task.name(), "starting task");
        ctx.reset();

        let started = Instant::now();
        let result = task.run(self, ctx);
        let seconds = started.elapsed().as_secs_f64();

        info!(task = %task.name(), seconds = %format!("{seconds:.3}"), "finished task");
        info!(
            task = %task.name(),
            gflops = %format!("{:.3}", ctx.gflops(seconds)),
            "task throughput"
        );
        result
    }
}
