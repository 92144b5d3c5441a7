// src/tasks/compare.rs

use anyhow::bail;
use serde::Deserialize;
use toml::Table;
use tracing::{error, info};

use crate::dag::TaskDag;
use crate::task::{
    BOOL_TYPE, ExecutionContext, FieldKind, Product, Requirement, SCALAR_TYPE, Schema, Task,
    TaskBody, TaskIo,
};

pub const KIND: &str = "compare";

const DEFAULT_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, Deserialize)]
struct CompareConfig {
    tolerance: f64,
}

pub fn schema() -> Schema {
    Schema::new().optional("tolerance", FieldKind::Float, DEFAULT_TOLERANCE)
}

pub fn create(name: &str, config: &Table) -> anyhow::Result<Task> {
    let cfg: CompareConfig = super::typed_config(config)?;
    if cfg.tolerance.is_nan() || cfg.tolerance <= 0.0 {
        bail!("tolerance must be positive (got {})", cfg.tolerance);
    }

    let product = Product::new(BOOL_TYPE, "match")
        .requires(Requirement::new(SCALAR_TYPE, "val1"))
        .requires(Requirement::new(SCALAR_TYPE, "val2"));

    Ok(Task::new(KIND, name, CompareScalars::new(cfg.tolerance)).with_product(product))
}

/// Checks `|val1 - val2| < tolerance` and publishes the outcome as `match`.
///
/// A mismatch fails the task after the `match` product has been stored.
#[derive(Debug, Clone)]
pub struct CompareScalars {
    tolerance: f64,
}

impl CompareScalars {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Digits needed to show a difference on the scale of the tolerance.
    fn precision(&self) -> usize {
        (0.5 - self.tolerance.log10()).max(0.0) as usize
    }
}

impl TaskBody for CompareScalars {
    fn run(
        &mut self,
        io: &TaskIo<'_>,
        _dag: &mut TaskDag,
        ctx: &mut ExecutionContext,
    ) -> anyhow::Result<()> {
        let val1 = *io.get::<f64>("val1")?;
        let val2 = *io.get::<f64>("val2")?;
        ctx.add_flops(2);

        let matched = (val1 - val2).abs() < self.tolerance;
        io.put("match", matched)?;

        if matched {
            info!(task = %io.task_name(), "passed");
            return Ok(());
        }

        let prec = self.precision();
        error!(
            task = %io.task_name(),
            "failed: {val1:.prec$} vs {val2:.prec$}"
        );
        bail!("comparison failed: {val1:.prec$} vs {val2:.prec$}")
    }
}
