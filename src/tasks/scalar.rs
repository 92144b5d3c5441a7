// src/tasks/scalar.rs

use serde::Deserialize;
use toml::Table;
use tracing::debug;

use crate::dag::TaskDag;
use crate::task::{ExecutionContext, FieldKind, Product, SCALAR_TYPE, Schema, Task, TaskBody, TaskIo};

pub const KIND: &str = "scalar";

#[derive(Debug, Clone, Deserialize)]
struct ScalarConfig {
    value: f64,
    product: String,
}

pub fn schema() -> Schema {
    Schema::new()
        .required("value", FieldKind::Float)
        .optional("product", FieldKind::String, "value")
}

pub fn create(name: &str, config: &Table) -> anyhow::Result<Task> {
    let cfg: ScalarConfig = super::typed_config(config)?;
    let product = Product::new(SCALAR_TYPE, cfg.product.clone());

    Ok(Task::new(KIND, name, ScalarValue::new(cfg.value, cfg.product)).with_product(product))
}

/// Publishes a fixed value; no requirements.
#[derive(Debug, Clone)]
pub struct ScalarValue {
    value: f64,
    product: String,
}

impl ScalarValue {
    pub fn new(value: f64, product: impl Into<String>) -> Self {
        Self {
            value,
            product: product.into(),
        }
    }
}

impl TaskBody for ScalarValue {
    fn run(
        &mut self,
        io: &TaskIo<'_>,
        _dag: &mut TaskDag,
        _ctx: &mut ExecutionContext,
    ) -> anyhow::Result<()> {
        debug!(task = %io.task_name(), value = self.value, "publishing scalar");
        io.put(&self.product, self.value)
    }
}
