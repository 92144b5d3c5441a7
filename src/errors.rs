// src/errors.rs

//! Crate-wide error type.
//!
//! Every fatal condition the scheduler can hit carries the identity of the
//! offending task, requirement or product so callers (and tests) can match on
//! it instead of parsing log output.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task type '{task_type}' not found")]
    UnknownTaskType { task_type: String },

    #[error("Invalid task name '{name}' (segments must be non-empty and free of '.:')")]
    InvalidTaskName { name: String },

    #[error("More than one task with name '{name}'")]
    DuplicateTaskName { name: String },

    #[error("More than one product named '{product}' on task '{task}'")]
    DuplicateProductName { task: String, product: String },

    #[error("Invalid configuration for task '{task}': {message}")]
    Schema { task: String, message: String },

    #[error("Could not construct task '{task}': {source}")]
    TaskConstruction {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("No requirement '{requirement}' found on task '{task}'")]
    UnknownRequirement { task: String, requirement: String },

    #[error("Multiple requirements named '{requirement}' with different types on task '{task}'")]
    RequirementTypeConflict { task: String, requirement: String },

    #[error("Invalid binding for requirement '{requirement}' of task '{task}': {message}")]
    InvalidBinding {
        task: String,
        requirement: String,
        message: String,
    },

    #[error(
        "Attempting to specify non-scalar requirement '{requirement}' of task '{task}' by value (type '{ty}')"
    )]
    LiteralForNonScalar {
        task: String,
        requirement: String,
        ty: String,
    },

    #[error("Task '{reference}' not found (referenced by '{task}')")]
    TaskNotFound { task: String, reference: String },

    #[error("Product '{product}' not found on task '{task}'")]
    ProductNotFound { task: String, product: String },

    #[error(
        "Product {producer}.{product} is wrong type for requirement {task}.{requirement} (expected '{expected}', found '{found}')"
    )]
    ProductTypeMismatch {
        task: String,
        requirement: String,
        producer: String,
        product: String,
        expected: String,
        found: String,
    },

    #[error("Scalar requirement '{requirement}' of task '{task}' must be explicitly fulfilled")]
    UnboundScalar { task: String, requirement: String },

    #[error("Could not fulfil requirement '{requirement}' (type '{ty}') of task '{task}'")]
    Unresolved {
        task: String,
        requirement: String,
        ty: String,
    },

    #[error("{} requirement error(s): {}", .0.len(), join_errors(.0))]
    Resolution(Vec<DagError>),

    #[error("Cycle detected in task DAG: {0}")]
    DagCycle(String),

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Some tasks were not executed: {}", .pending.join(", "))]
    Deadlock { pending: Vec<String> },
}

fn join_errors(errors: &[DagError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, DagError>;
