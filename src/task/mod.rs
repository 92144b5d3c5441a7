// src/task/mod.rs

//! Tasks: named, typed units of work with a fixed set of products.
//!
//! - [`product`] defines [`Product`] / [`Requirement`] and their shared payload cells.
//! - [`context`] holds the [`ExecutionContext`] passed to every run.
//! - [`registry`] maps task type tags to constructors.
//! - [`schema`] validates and defaults a task's configuration.

pub mod context;
pub mod product;
pub mod registry;
pub mod schema;

use std::fmt;
use std::rc::Rc;

use anyhow::{anyhow, bail};

use crate::dag::TaskDag;

pub use context::ExecutionContext;
pub use product::{
    BOOL_TYPE, Payload, Product, ProductCell, ProductRef, Requirement, SCALAR_TYPE,
};
pub use registry::{TaskFactory, TaskRegistry};
pub use schema::{FieldKind, Schema};

/// The computation behind a task.
///
/// `run` reads its inputs through [`TaskIo`], stores its outputs with
/// [`TaskIo::put`], and may add further tasks to `dag`.
pub trait TaskBody {
    fn run(
        &mut self,
        io: &TaskIo<'_>,
        dag: &mut TaskDag,
        ctx: &mut ExecutionContext,
    ) -> anyhow::Result<()>;
}

/// A named, typed unit of work.
pub struct Task {
    kind: String,
    name: String,
    products: Vec<Product>,
    body: Box<dyn TaskBody>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("products", &self.products)
            .finish_non_exhaustive()
    }
}

impl Task {
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        body: impl TaskBody + 'static,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            products: Vec::new(),
            body: Box::new(body),
        }
    }

    /// Builder-style: declare a product this task promises to create.
    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn add_product(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Type tag this task was created from.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope of this task: its name up to and including the last `.`.
    pub fn context(&self) -> &str {
        context_of(&self.name)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn products_mut(&mut self) -> &mut [Product] {
        &mut self.products
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name() == name)
    }

    /// Every requirement of every product exists.
    pub fn is_ready(&self) -> bool {
        self.products.iter().all(Product::is_ready)
    }

    pub(crate) fn run(&mut self, dag: &mut TaskDag, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        let Task {
            name,
            products,
            body,
            ..
        } = self;
        let io = TaskIo {
            task: name.as_str(),
            products: products.as_slice(),
        };
        body.run(&io, dag, ctx)
    }
}

/// Name prefix up to and including the last `.`, or `""` for top-level names.
pub fn context_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(sep) => &name[..=sep],
        None => "",
    }
}

/// Read/write access to a running task's requirements and products.
pub struct TaskIo<'a> {
    task: &'a str,
    products: &'a [Product],
}

impl TaskIo<'_> {
    pub fn task_name(&self) -> &str {
        self.task
    }

    /// Products of the running task.
    pub fn products(&self) -> &[Product] {
        self.products
    }

    /// The product bound to the requirement called `requirement`.
    pub fn requirement(&self, requirement: &str) -> anyhow::Result<&ProductRef> {
        let req = self
            .products
            .iter()
            .flat_map(|p| p.requirements())
            .find(|r| r.name() == requirement)
            .ok_or_else(|| anyhow!("task '{}' has no requirement '{requirement}'", self.task))?;

        req.product()
            .ok_or_else(|| anyhow!("requirement '{requirement}' of task '{}' not fulfilled", self.task))
    }

    /// Typed value of a fulfilled requirement.
    pub fn get<T: 'static>(&self, requirement: &str) -> anyhow::Result<Rc<T>> {
        let product = self.requirement(requirement)?;
        if !product.exists() {
            bail!(
                "requirement '{requirement}' of task '{}' has not been produced",
                self.task
            );
        }
        product.value::<T>().ok_or_else(|| {
            anyhow!(
                "requirement '{requirement}' of task '{}' does not hold a {}",
                self.task,
                std::any::type_name::<T>()
            )
        })
    }

    /// Store the payload of one of this task's products.
    pub fn put<T: 'static>(&self, product: &str, value: T) -> anyhow::Result<()> {
        let target = self
            .products
            .iter()
            .find(|p| p.name() == product)
            .ok_or_else(|| anyhow!("product '{product}' not found on task '{}'", self.task))?;

        if !target.handle().set(Rc::new(value)) {
            bail!("product '{product}' of task '{}' was already produced", self.task);
        }
        Ok(())
    }
}
