// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod task;
pub mod tasks;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::dag::TaskDag;
use crate::task::{ExecutionContext, TaskRegistry};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the built-in task registry
/// - config loading and parsing into a [`TaskDag`]
/// - requirement resolution
/// - execution (or the `--dry-run` listing)
pub fn run(args: CliArgs) -> Result<()> {
    let registry = TaskRegistry::with_builtins();
    let mut dag = TaskDag::from_path(&registry, &args.input)?;
    dag.set_check_cycles(args.check_cycles);

    info!(input = %args.input, tasks = dag.len(), "task DAG loaded");

    if args.dry_run {
        dag.resolve()?;
        print_dry_run(&dag);
        return Ok(());
    }

    let mut ctx = ExecutionContext::new();
    let report = dag.execute(&mut ctx)?;

    if !report.unproduced.is_empty() {
        anyhow::bail!(
            "{} used product(s) were not produced: {}",
            report.unproduced.len(),
            report
                .unproduced
                .iter()
                .map(|u| format!("{}.{}", u.task, u.product))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}

/// Dry-run output: every task, its products, and where each requirement
/// is bound.
fn print_dry_run(dag: &TaskDag) {
    println!("taskdag dry-run");
    println!("  check_cycles = {}", dag.check_cycles());
    println!();

    println!("tasks ({}):", dag.len());
    for task in dag.tasks() {
        println!("  - {} ({})", task.name(), task.kind());
        for product in task.products() {
            println!("      product {}: {}", product.name(), product.ty());
            for req in product.requirements() {
                let source = match req.product() {
                    Some(bound) => match dag.producer_of(bound) {
                        Some(producer) => format!("{producer}:{}", bound.name()),
                        None => "<literal>".to_string(),
                    },
                    None => "<unbound>".to_string(),
                };
                println!("        requires {}: {} <- {source}", req.name(), req.ty());
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
