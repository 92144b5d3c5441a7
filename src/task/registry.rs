// src/task/registry.rs

//! Registry of task types.
//!
//! The registry is an ordinary value: build it once at startup (usually with
//! [`TaskRegistry::with_builtins`]), register any extra task types, and pass
//! it to [`TaskDag::parse`](crate::dag::TaskDag::parse).

use std::collections::HashMap;

use toml::Table;
use tracing::{debug, warn};

use crate::errors::{DagError, Result};
use crate::task::{Schema, Task};

/// Constructor for one task type: `(name, validated config) -> Task`.
pub type TaskFactory = Box<dyn Fn(&str, &Table) -> anyhow::Result<Task>>;

struct Entry {
    schema: Schema,
    factory: TaskFactory,
}

/// Maps a task type tag to its schema and constructor.
#[derive(Default)]
pub struct TaskRegistry {
    entries: HashMap<String, Entry>,
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.kinds().collect();
        kinds.sort_unstable();
        f.debug_struct("TaskRegistry").field("kinds", &kinds).finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in task type registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::tasks::register_builtins(&mut registry);
        registry
    }

    /// Register (or replace) the task type `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, schema: Schema, factory: F) -> &mut Self
    where
        F: Fn(&str, &Table) -> anyhow::Result<Task> + 'static,
    {
        let kind = kind.into();
        let entry = Entry {
            schema,
            factory: Box::new(factory),
        };
        if self.entries.insert(kind.clone(), entry).is_some() {
            warn!(kind = %kind, "task type registered twice; replacing previous constructor");
        } else {
            debug!(kind = %kind, "registered task type");
        }
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Apply the schema of `kind` to `config` and construct the task `name`.
    pub fn create(&self, kind: &str, name: &str, mut config: Table) -> Result<Task> {
        let entry = self
            .entries
            .get(kind)
            .ok_or_else(|| DagError::UnknownTaskType {
                task_type: kind.to_string(),
            })?;

        entry
            .schema
            .apply(&mut config)
            .map_err(|message| DagError::Schema {
                task: name.to_string(),
                message,
            })?;

        (entry.factory)(name, &config).map_err(|source| DagError::TaskConstruction {
            task: name.to_string(),
            source,
        })
    }
}
