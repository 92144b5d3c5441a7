#![allow(dead_code)]

use toml::{Table, Value};

/// Builder for a task configuration tree, to avoid hand-writing TOML in tests.
///
/// Tasks of one type are stored as an array of tables, so several tasks of
/// the same type can be added in order.
pub struct DagConfigBuilder {
    root: Table,
}

impl DagConfigBuilder {
    pub fn new() -> Self {
        Self { root: Table::new() }
    }

    pub fn with_task(mut self, kind: &str, task: TaskEntryBuilder) -> Self {
        let entry = self
            .root
            .entry(kind.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(Value::Table(task.build()));
        }
        self
    }

    pub fn with_section(mut self, name: &str, section: DagConfigBuilder) -> Self {
        let sections = self
            .root
            .entry("section".to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if let Value::Table(sections) = sections {
            sections.insert(name.to_string(), Value::Table(section.build()));
        }
        self
    }

    pub fn build(self) -> Table {
        self.root
    }
}

impl Default for DagConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one task table.
pub struct TaskEntryBuilder {
    table: Table,
}

impl TaskEntryBuilder {
    pub fn new() -> Self {
        Self { table: Table::new() }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.table.insert("name".to_string(), Value::from(name));
        self
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.table.insert(key.to_string(), value.into());
        self
    }

    /// `using.<requirement>.from = "<reference>"`
    pub fn using_from(self, requirement: &str, reference: &str) -> Self {
        self.using(requirement, "from", Value::from(reference))
    }

    /// `using.<requirement>."=" = <value>`
    pub fn using_literal(self, requirement: &str, value: f64) -> Self {
        self.using(requirement, "=", Value::from(value))
    }

    fn using(mut self, requirement: &str, key: &str, value: Value) -> Self {
        let using = self
            .table
            .entry("using".to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if let Value::Table(using) = using {
            let mut directive = Table::new();
            directive.insert(key.to_string(), value);
            using.insert(requirement.to_string(), Value::Table(directive));
        }
        self
    }

    pub fn build(self) -> Table {
        self.table
    }
}

impl Default for TaskEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `scalar` task publishing `value` as product `product`.
pub fn scalar(name: &str, value: f64, product: &str) -> TaskEntryBuilder {
    TaskEntryBuilder::new()
        .name(name)
        .set("value", value)
        .set("product", product)
}
