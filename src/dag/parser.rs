// src/dag/parser.rs

//! Configuration tree -> tasks.
//!
//! ```toml
//! [[scalar]]
//! name = "T1"
//! value = 1.0
//!
//! [section.cc.compare]
//! using.val1.from = ".T1"
//! using.val2."=" = 1.0
//! ```
//!
//! `section` entries open a naming context (`cc.` above) and are expanded
//! first; every other key is a task type tag holding one table or an array of
//! tables.

use toml::{Table, Value};
use tracing::debug;

use crate::dag::TaskDag;
use crate::errors::{DagError, Result};
use crate::task::TaskRegistry;

const SECTION_KEY: &str = "section";
const NAME_KEY: &str = "name";
const USING_KEY: &str = "using";

/// Instantiate one task per entry of `input`, naming them under `context`.
///
/// The `section` node is removed from `input` once expanded.
pub(crate) fn parse_tasks(
    dag: &mut TaskDag,
    registry: &TaskRegistry,
    context: &str,
    input: &mut Table,
) -> Result<()> {
    if let Some(sections) = input.remove(SECTION_KEY) {
        let Value::Table(sections) = sections else {
            return Err(DagError::ConfigError(format!(
                "'{context}{SECTION_KEY}' must be a table of named sections"
            )));
        };

        for (section, body) in sections {
            if section.contains(['.', ':']) {
                return Err(DagError::ConfigError(format!(
                    "section names may not contain any of '.:' ({context}{section})"
                )));
            }
            let Value::Table(mut body) = body else {
                return Err(DagError::ConfigError(format!(
                    "section '{context}{section}' must be a table"
                )));
            };
            let nested = format!("{context}{section}.");
            debug!(section = %nested, "expanding section");
            parse_tasks(dag, registry, &nested, &mut body)?;
        }
    }

    for (kind, entry) in input.iter() {
        match entry {
            Value::Table(config) => parse_task(dag, registry, context, kind, config)?,
            Value::Array(items) => {
                for item in items {
                    let Value::Table(config) = item else {
                        return Err(DagError::ConfigError(format!(
                            "entries of '{context}{kind}' must be tables"
                        )));
                    };
                    parse_task(dag, registry, context, kind, config)?;
                }
            }
            other => {
                return Err(DagError::ConfigError(format!(
                    "'{context}{kind}' is a {}, expected a task table",
                    other.type_str()
                )));
            }
        }
    }

    Ok(())
}

fn parse_task(
    dag: &mut TaskDag,
    registry: &TaskRegistry,
    context: &str,
    kind: &str,
    raw: &Table,
) -> Result<()> {
    if !registry.contains(kind) {
        return Err(DagError::UnknownTaskType {
            task_type: kind.to_string(),
        });
    }

    let mut config = raw.clone();
    let name = match config.remove(NAME_KEY) {
        Some(Value::String(explicit)) => {
            if explicit.is_empty() || explicit.contains(['.', ':']) {
                return Err(DagError::InvalidTaskName { name: explicit });
            }
            format!("{context}{explicit}")
        }
        Some(other) => {
            return Err(DagError::ConfigError(format!(
                "'name' of a '{context}{kind}' task must be a string (got {})",
                other.type_str()
            )));
        }
        None => default_name(dag, context, kind),
    };

    if dag.contains_name(&name) {
        return Err(DagError::DuplicateTaskName { name });
    }

    config.remove(USING_KEY);

    let task = registry.create(kind, &name, config)?;
    if task.name() != name {
        return Err(DagError::ConfigError(format!(
            "constructor for '{kind}' named its task '{}' instead of '{name}'",
            task.name()
        )));
    }

    debug!(task = %name, kind = %kind, "parsed task");
    dag.add_task(task, raw.clone())
}

/// `context + kind`, suffixed with the number of tasks of the same type
/// already registered under `context` (no suffix for the first one).
fn default_name(dag: &TaskDag, context: &str, kind: &str) -> String {
    let num = dag
        .tasks()
        .filter(|t| t.name().starts_with(context) && t.kind() == kind)
        .count();

    if num == 0 {
        format!("{context}{kind}")
    } else {
        format!("{context}{kind}{num}")
    }
}
