//! A configurable task type for scheduler tests.
//!
//! ```toml
//! [[probe]]
//! name = "A"
//! produces = ["matrix:fock"]     # type:name, first product carries requirements
//! requires = ["double:energy"]
//! fail = false                   # return an error from run
//! skip_products = false          # return Ok without producing anything
//! ```
//!
//! Every run is appended to a shared [`RunLog`]. Products of type `double`
//! receive `value` (default 1.0); all others receive the task name.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, bail};
use taskdag::dag::TaskDag;
use taskdag::task::{
    ExecutionContext, FieldKind, Product, Requirement, Schema, Task, TaskBody, TaskIo,
    TaskRegistry, SCALAR_TYPE,
};
use toml::{Table, Value};

pub const PROBE: &str = "probe";

/// Product type used to carry requirements of a probe that produces nothing.
pub const SINK_TYPE: &str = "sink";

/// Shared record of task runs, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunLog(Rc<RefCell<Vec<String>>>);

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name: &str) {
        self.0.borrow_mut().push(name.to_string());
    }

    pub fn runs(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.borrow().iter().position(|n| n == name)
    }
}

/// Registry with the built-in task types plus `probe`, logging into `log`.
pub fn probe_registry(log: &RunLog) -> TaskRegistry {
    let mut registry = TaskRegistry::with_builtins();
    register_probe(&mut registry, log);
    registry
}

pub fn register_probe(registry: &mut TaskRegistry, log: &RunLog) {
    let log = log.clone();
    registry.register(PROBE, probe_schema(), move |name, config| {
        create_probe(name, config, log.clone())
    });
}

fn probe_schema() -> Schema {
    Schema::new()
        .optional("produces", FieldKind::Array, Value::Array(Vec::new()))
        .optional("requires", FieldKind::Array, Value::Array(Vec::new()))
        .optional("fail", FieldKind::Bool, false)
        .optional("skip_products", FieldKind::Bool, false)
        .optional("value", FieldKind::Float, 1.0)
}

fn create_probe(name: &str, config: &Table, log: RunLog) -> anyhow::Result<Task> {
    let mut products = Vec::new();
    for spec in string_list(config, "produces")? {
        let (ty, product) = split_spec(&spec)?;
        products.push(Product::new(ty, product));
    }

    let requirements = string_list(config, "requires")?;
    if products.is_empty() && !requirements.is_empty() {
        products.push(Product::new(SINK_TYPE, "done"));
    }
    for spec in requirements {
        let (ty, req) = split_spec(&spec)?;
        products[0].add_requirement(Requirement::new(ty, req));
    }

    let body = Probe {
        log,
        fail: config.get("fail").and_then(Value::as_bool).unwrap_or(false),
        skip_products: config
            .get("skip_products")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        value: config.get("value").and_then(Value::as_float).unwrap_or(1.0),
    };

    let mut task = Task::new(PROBE, name, body);
    for product in products {
        task.add_product(product);
    }
    Ok(task)
}

fn string_list(config: &Table, key: &str) -> anyhow::Result<Vec<String>> {
    let Some(Value::Array(items)) = config.get(key) else {
        return Ok(Vec::new());
    };
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("'{key}' entries must be strings"))
        })
        .collect()
}

fn split_spec(spec: &str) -> anyhow::Result<(&str, &str)> {
    spec.split_once(':')
        .ok_or_else(|| anyhow!("expected type:name, got '{spec}'"))
}

struct Probe {
    log: RunLog,
    fail: bool,
    skip_products: bool,
    value: f64,
}

impl TaskBody for Probe {
    fn run(
        &mut self,
        io: &TaskIo<'_>,
        _dag: &mut TaskDag,
        _ctx: &mut ExecutionContext,
    ) -> anyhow::Result<()> {
        self.log.push(io.task_name());

        if self.fail {
            bail!("probe '{}' failed on purpose", io.task_name());
        }
        if self.skip_products {
            return Ok(());
        }

        for product in io.products() {
            if product.ty() == SCALAR_TYPE {
                io.put(product.name(), self.value)?;
            } else {
                io.put(product.name(), io.task_name().to_string())?;
            }
        }
        Ok(())
    }
}
