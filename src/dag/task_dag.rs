// src/dag/task_dag.rs

//! The task DAG aggregate: pending tasks with their raw configuration, plus a
//! record of tasks that already ran.

use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;

use toml::Table;
use tracing::debug;

use crate::config::loader::load_from_path;
use crate::dag::parser::parse_tasks;
use crate::dag::resolver;
use crate::dag::scheduler::UnproducedProduct;
use crate::errors::{DagError, Result};
use crate::task::{Product, ProductRef, Task, TaskRegistry};

/// A task waiting to run, with the configuration it was created from.
///
/// The raw configuration still holds the `using` table until the resolver
/// consumes it.
#[derive(Debug)]
pub(crate) struct PendingTask {
    pub(crate) task: Task,
    pub(crate) config: Table,
}

/// What remains of a task after it ran successfully: its identity and handles
/// on the products it created.
#[derive(Debug, Clone)]
pub struct CompletedTask {
    pub kind: String,
    pub name: String,
    pub products: Vec<ProductRef>,
}

impl CompletedTask {
    pub(crate) fn from_task(task: &Task) -> Self {
        Self {
            kind: task.kind().to_string(),
            name: task.name().to_string(),
            products: task.products().iter().map(Product::handle).collect(),
        }
    }

    pub fn product(&self, name: &str) -> Option<&ProductRef> {
        self.products.iter().find(|p| p.name() == name)
    }
}

/// Ordered collection of tasks not yet executed.
///
/// Tasks leave the pending list when they run; tasks added while the DAG is
/// executing (e.g. from inside another task's `run`) join the end of the list
/// and are picked up by later rounds.
#[derive(Debug, Default)]
pub struct TaskDag {
    pub(crate) pending: Vec<PendingTask>,
    pub(crate) completed: Vec<CompletedTask>,
    pub(crate) unproduced: Vec<UnproducedProduct>,
    /// Every name ever registered in this DAG, pending or not.
    names: HashSet<String>,
    check_cycles: bool,
}

impl TaskDag {
    /// An empty DAG; populate it with [`TaskDag::add_task`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a DAG from a configuration tree.
    pub fn parse(registry: &TaskRegistry, mut input: Table) -> Result<Self> {
        let mut dag = Self::new();
        parse_tasks(&mut dag, registry, "", &mut input)?;
        debug!(tasks = dag.pending.len(), "parsed task DAG");
        Ok(dag)
    }

    /// Load a TOML file and build a DAG from it.
    pub fn from_path(registry: &TaskRegistry, path: impl AsRef<Path>) -> Result<Self> {
        let input = load_from_path(path)?;
        Self::parse(registry, input)
    }

    /// Enable the explicit cycle check that runs after resolution.
    ///
    /// Without it a cycle only shows up as a deadlock once execution stalls.
    pub fn set_check_cycles(&mut self, enabled: bool) {
        self.check_cycles = enabled;
    }

    pub fn check_cycles(&self) -> bool {
        self.check_cycles
    }

    /// Add a task together with its raw configuration (which may carry a
    /// `using` table for the resolver).
    ///
    /// The name must be non-empty dot-separated segments without `:`, and
    /// product names must be unique within the task.
    pub fn add_task(&mut self, task: Task, config: Table) -> Result<()> {
        if !is_valid_task_name(task.name()) {
            return Err(DagError::InvalidTaskName {
                name: task.name().to_string(),
            });
        }

        let mut seen = HashSet::new();
        if let Some(dup) = task.products().iter().find(|p| !seen.insert(p.name())) {
            return Err(DagError::DuplicateProductName {
                task: task.name().to_string(),
                product: dup.name().to_string(),
            });
        }

        if !self.names.insert(task.name().to_string()) {
            return Err(DagError::DuplicateTaskName {
                name: task.name().to_string(),
            });
        }
        debug!(task = %task.name(), kind = %task.kind(), "task added to DAG");
        self.pending.push(PendingTask { task, config });
        Ok(())
    }

    /// Whether `name` was ever registered in this DAG.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Pending tasks, in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.pending.iter().map(|p| &p.task)
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks().find(|t| t.name() == name)
    }

    pub fn pending_names(&self) -> Vec<String> {
        self.tasks().map(|t| t.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Tasks that already ran successfully, in execution order.
    pub fn completed(&self) -> &[CompletedTask] {
        &self.completed
    }

    /// Used products whose task returned without producing them.
    pub fn unproduced(&self) -> &[UnproducedProduct] {
        &self.unproduced
    }

    /// Handle on product `product` of task `task`, pending or completed.
    pub fn product(&self, task: &str, product: &str) -> Option<ProductRef> {
        if let Some(t) = self.task(task) {
            return t.product(product).map(Product::handle);
        }
        self.completed
            .iter()
            .find(|c| c.name == task)
            .and_then(|c| c.product(product))
            .cloned()
    }

    /// Name of the task owning `product`, if it belongs to this DAG.
    pub fn producer_of(&self, product: &ProductRef) -> Option<&str> {
        let pending = self.tasks().find(|t| {
            t.products()
                .iter()
                .any(|p| Rc::ptr_eq(&p.handle(), product))
        });
        if let Some(task) = pending {
            return Some(task.name());
        }
        self.completed
            .iter()
            .find(|c| c.products.iter().any(|p| Rc::ptr_eq(p, product)))
            .map(|c| c.name.as_str())
    }

    /// Bind every unfulfilled requirement of every pending task: explicit
    /// `using` bindings first, then greedy inference.
    ///
    /// [`TaskDag::execute`] calls this itself; it is public so callers can
    /// inspect the bindings without running anything.
    pub fn resolve(&mut self) -> Result<()> {
        resolver::resolve(self)
    }
}

fn is_valid_task_name(name: &str) -> bool {
    !name.contains(':') && name.split('.').all(|segment| !segment.is_empty())
}
