// src/task/schema.rs

//! Per-task-type configuration schema.
//!
//! A schema is applied to a task's configuration table before the task is
//! constructed: missing optional fields receive their defaults, missing
//! required fields and values of the wrong kind are rejected. Keys the schema
//! does not mention pass through untouched.

use toml::{Table, Value};

/// Kind of value a schema field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Floats; integers are accepted and widened.
    Float,
    Integer,
    Bool,
    String,
    Array,
    Table,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldKind::Float, Value::Float(_) | Value::Integer(_))
                | (FieldKind::Integer, Value::Integer(_))
                | (FieldKind::Bool, Value::Boolean(_))
                | (FieldKind::String, Value::String(_))
                | (FieldKind::Array, Value::Array(_))
                | (FieldKind::Table, Value::Table(_))
        )
    }

    fn label(self) -> &'static str {
        match self {
            FieldKind::Float => "float",
            FieldKind::Integer => "integer",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Array => "array",
            FieldKind::Table => "table",
        }
    }
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    kind: FieldKind,
    default: Option<Value>,
}

/// Ordered set of typed fields, some with defaults.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// A schema with no fields; accepts any table unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field that must be present.
    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind,
            default: None,
        });
        self
    }

    /// Add a field that falls back to `default` when absent.
    pub fn optional(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind,
            default: Some(default.into()),
        });
        self
    }

    /// Validate `config` in place, filling defaults.
    ///
    /// Integer values of `Float` fields are rewritten as floats so that task
    /// constructors can deserialize them as `f64` directly.
    pub fn apply(&self, config: &mut Table) -> Result<(), String> {
        for field in &self.fields {
            match config.get_mut(&field.name) {
                Some(value) => {
                    if !field.kind.accepts(value) {
                        return Err(format!(
                            "field '{}' must be a {} (got {})",
                            field.name,
                            field.kind.label(),
                            value.type_str()
                        ));
                    }
                    if field.kind == FieldKind::Float {
                        if let Some(i) = value.as_integer() {
                            *value = Value::Float(i as f64);
                        }
                    }
                }
                None => match &field.default {
                    Some(default) => {
                        config.insert(field.name.clone(), default.clone());
                    }
                    None => {
                        return Err(format!("missing required field '{}'", field.name));
                    }
                },
            }
        }
        Ok(())
    }
}
