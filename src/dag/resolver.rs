// src/dag/resolver.rs

//! Requirement resolution.
//!
//! Two phases, always in this order:
//!
//! 1. **Explicit**: every `using.<req>` entry of a task's configuration binds
//!    all unfulfilled requirements called `<req>` on that task, either to a
//!    literal scalar or to a named product of another task.
//! 2. **Greedy**: every requirement still unbound is bound to the first
//!    product of matching type found on a task in the same or an enclosing
//!    context (task order, then product order). A product whose own
//!    requirement of that type is already bound can forward that binding.
//!
//! Errors are collected per offense; any error in a phase aborts resolution.

use std::rc::Rc;

use toml::Value;
use tracing::{debug, error};

use crate::dag::binding::BindingDirective;
use crate::dag::task_dag::{CompletedTask, PendingTask};
use crate::dag::TaskDag;
use crate::errors::{DagError, Result};
use crate::task::{Product, ProductRef, SCALAR_TYPE, context_of};

const USING_KEY: &str = "using";

pub(crate) fn resolve(dag: &mut TaskDag) -> Result<()> {
    let errors = resolve_explicit(&mut dag.pending, &dag.completed);
    fail_on(errors, "explicit")?;

    let errors = resolve_greedy(&mut dag.pending);
    fail_on(errors, "greedy")
}

fn fail_on(errors: Vec<DagError>, phase: &str) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for err in &errors {
        error!(phase, error = %err, "requirement resolution failed");
    }
    Err(DagError::Resolution(errors))
}

fn resolve_explicit(pending: &mut [PendingTask], completed: &[CompletedTask]) -> Vec<DagError> {
    let mut errors = Vec::new();

    for index in 0..pending.len() {
        let Some(using) = pending[index].config.remove(USING_KEY) else {
            continue;
        };
        let task = pending[index].task.name().to_string();

        let Value::Table(using) = using else {
            errors.push(DagError::ConfigError(format!(
                "'using' of task '{task}' must be a table"
            )));
            continue;
        };

        for (requirement, directive) in using.iter() {
            if let Err(err) = bind_explicit(pending, completed, index, requirement, directive) {
                errors.push(err);
            }
        }
    }

    errors
}

fn bind_explicit(
    pending: &mut [PendingTask],
    completed: &[CompletedTask],
    index: usize,
    requirement: &str,
    directive: &Value,
) -> Result<()> {
    let task = pending[index].task.name().to_string();
    let context = context_of(&task).to_string();

    let ty = requirement_type(&pending[index], requirement)?;

    let directive =
        BindingDirective::from_value(directive).map_err(|message| DagError::InvalidBinding {
            task: task.clone(),
            requirement: requirement.to_string(),
            message,
        })?;

    let fulfiller: ProductRef = match directive {
        BindingDirective::Literal(value) => {
            if ty != SCALAR_TYPE {
                return Err(DagError::LiteralForNonScalar {
                    task,
                    requirement: requirement.to_string(),
                    ty,
                });
            }
            Product::literal(SCALAR_TYPE, requirement, value).handle()
        }
        BindingDirective::From(reference) => {
            let producer = reference.resolve_task(&context);
            let product_name = reference.product_or(requirement);

            let products = products_of(pending, completed, &producer).ok_or_else(|| {
                DagError::TaskNotFound {
                    task: task.clone(),
                    reference: producer.clone(),
                }
            })?;

            let product = products
                .into_iter()
                .find(|p| p.name() == product_name)
                .ok_or_else(|| DagError::ProductNotFound {
                    task: producer.clone(),
                    product: product_name.to_string(),
                })?;

            if product.ty() != ty {
                return Err(DagError::ProductTypeMismatch {
                    task,
                    requirement: requirement.to_string(),
                    producer,
                    product: product_name.to_string(),
                    expected: ty,
                    found: product.ty().to_string(),
                });
            }
            product
        }
    };

    let mut bound = 0;
    for req in pending[index]
        .task
        .products_mut()
        .iter_mut()
        .flat_map(|p| p.requirements_mut().iter_mut())
    {
        if req.name() == requirement && req.bind(Rc::clone(&fulfiller)) {
            bound += 1;
        }
    }

    debug!(
        task = %task,
        requirement,
        product = %fulfiller.name(),
        bound,
        "explicitly bound requirement"
    );
    Ok(())
}

/// Common type of the unfulfilled requirements called `requirement`.
fn requirement_type(pending: &PendingTask, requirement: &str) -> Result<String> {
    let task = pending.task.name();
    let mut types = pending
        .task
        .products()
        .iter()
        .flat_map(Product::requirements)
        .filter(|r| r.name() == requirement && !r.is_fulfilled())
        .map(|r| r.ty());

    let ty = types.next().ok_or_else(|| DagError::UnknownRequirement {
        task: task.to_string(),
        requirement: requirement.to_string(),
    })?;

    if types.any(|other| other != ty) {
        return Err(DagError::RequirementTypeConflict {
            task: task.to_string(),
            requirement: requirement.to_string(),
        });
    }

    Ok(ty.to_string())
}

fn products_of(
    pending: &[PendingTask],
    completed: &[CompletedTask],
    task: &str,
) -> Option<Vec<ProductRef>> {
    if let Some(p) = pending.iter().find(|p| p.task.name() == task) {
        return Some(p.task.products().iter().map(Product::handle).collect());
    }
    completed
        .iter()
        .find(|c| c.name == task)
        .map(|c| c.products.clone())
}

fn resolve_greedy(pending: &mut [PendingTask]) -> Vec<DagError> {
    let mut errors = Vec::new();

    for index in 0..pending.len() {
        let task = pending[index].task.name().to_string();
        let context = context_of(&task).to_string();

        for p in 0..pending[index].task.products().len() {
            for r in 0..pending[index].task.products()[p].requirements().len() {
                let req = &pending[index].task.products()[p].requirements()[r];
                if req.is_fulfilled() {
                    continue;
                }

                let ty = req.ty().to_string();
                let requirement = req.name().to_string();

                if ty == SCALAR_TYPE {
                    errors.push(DagError::UnboundScalar {
                        task: task.clone(),
                        requirement,
                    });
                    continue;
                }

                match find_greedy(pending, index, &context, &ty) {
                    Some(product) => {
                        debug!(
                            task = %task,
                            requirement = %requirement,
                            product = %product.name(),
                            "greedily bound requirement"
                        );
                        pending[index].task.products_mut()[p].requirements_mut()[r].bind(product);
                    }
                    None => errors.push(DagError::Unresolved {
                        task: task.clone(),
                        requirement,
                        ty,
                    }),
                }
            }
        }
    }

    errors
}

/// First product of type `ty` visible from `context`, skipping task `skip`.
///
/// Only tasks whose own context is a prefix of `context` are candidates, so a
/// requirement never binds to a product of a deeper scope.
fn find_greedy(pending: &[PendingTask], skip: usize, context: &str, ty: &str) -> Option<ProductRef> {
    for (index, candidate) in pending.iter().enumerate() {
        if index == skip || !context.starts_with(candidate.task.context()) {
            continue;
        }

        for product in candidate.task.products() {
            if product.ty() == ty {
                return Some(product.handle());
            }
            let forwarded = product
                .requirements()
                .iter()
                .find(|r| r.ty() == ty && r.is_fulfilled())
                .and_then(|r| r.product());
            if let Some(bound) = forwarded {
                return Some(Rc::clone(bound));
            }
        }
    }

    None
}
