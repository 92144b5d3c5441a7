// src/dag/mod.rs

//! Task DAG: parsing, requirement resolution and execution.
//!
//! - [`task_dag`] holds the [`TaskDag`] aggregate (pending and completed tasks).
//! - [`parser`] turns a configuration tree into tasks with hierarchical names.
//! - [`binding`] parses explicit `using` directives.
//! - [`resolver`] binds requirements to products (explicit, then greedy).
//! - [`graph`] builds the producer -> consumer graph for the cycle check.
//! - [`scheduler`] runs ready batches until the DAG drains or stalls.

pub mod binding;
pub mod graph;
pub mod parser;
pub mod resolver;
pub mod scheduler;
pub mod task_dag;

pub use binding::{BindingDirective, ProductReference};
pub use scheduler::{ExecutionReport, UnproducedProduct};
pub use task_dag::{CompletedTask, TaskDag};
