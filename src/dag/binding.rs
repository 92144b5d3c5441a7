// src/dag/binding.rs

//! Explicit binding directives from a task's `using` table.
//!
//! ```toml
//! using.val1.from = "T1"          # product `val1` of task T1 in this context
//! using.val2.from = ".T2:energy"  # product `energy` of top-level task T2
//! using.shift."=" = 0.5           # literal scalar
//! ```

use std::sync::LazyLock;

use regex::Regex;
use toml::Value;

const LITERAL_KEY: &str = "=";
const FROM_KEY: &str = "from";

/// `task[:product]`; the task part may carry a leading `.` and dotted context.
static PRODUCT_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<task>\.?[^.:\s]+(?:\.[^.:\s]+)*)(?::(?<product>[^.:\s]+))?$")
        .expect("product reference pattern is valid")
});

/// How a requirement is bound explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingDirective {
    /// `using.<req>."=" = <number>`: a synthesized scalar product.
    Literal(f64),
    /// `using.<req>.from = "task[:product]"`.
    From(ProductReference),
}

impl BindingDirective {
    /// Parse the value stored under `using.<req>`.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Value::Table(table) = value else {
            return Err(format!(
                "expected a table with '{FROM_KEY}' or '{LITERAL_KEY}', got {}",
                value.type_str()
            ));
        };

        match (table.get(LITERAL_KEY), table.get(FROM_KEY)) {
            (Some(_), Some(_)) => Err(format!(
                "'{FROM_KEY}' and '{LITERAL_KEY}' are mutually exclusive"
            )),
            (Some(Value::Float(v)), None) => Ok(BindingDirective::Literal(*v)),
            (Some(Value::Integer(v)), None) => Ok(BindingDirective::Literal(*v as f64)),
            (Some(other), None) => Err(format!(
                "literal value must be a number, got {}",
                other.type_str()
            )),
            (None, Some(Value::String(reference))) => {
                ProductReference::parse(reference).map(BindingDirective::From)
            }
            (None, Some(other)) => Err(format!(
                "'{FROM_KEY}' must be a string, got {}",
                other.type_str()
            )),
            (None, None) => Err(format!("missing '{FROM_KEY}' or '{LITERAL_KEY}'")),
        }
    }
}

/// Reference to a product of another task, as written in `using.<req>.from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReference {
    pub task: String,
    pub product: Option<String>,
}

impl ProductReference {
    pub fn parse(reference: &str) -> Result<Self, String> {
        let caps = PRODUCT_REFERENCE
            .captures(reference.trim())
            .ok_or_else(|| format!("malformed reference '{reference}' (expected task[:product])"))?;

        Ok(Self {
            task: caps["task"].to_string(),
            product: caps.name("product").map(|m| m.as_str().to_string()),
        })
    }

    /// Full name of the referenced task as seen from a task in `context`.
    ///
    /// Bare names are looked up in `context`; dotted names are taken as
    /// written, with a leading `.` selecting the top level.
    pub fn resolve_task(&self, context: &str) -> String {
        let task = if self.task.contains('.') {
            self.task.clone()
        } else {
            format!("{context}{}", self.task)
        };

        match task.strip_prefix('.') {
            Some(top_level) => top_level.to_string(),
            None => task,
        }
    }

    /// Referenced product name, defaulting to the requirement's own name.
    pub fn product_or<'a>(&'a self, requirement: &'a str) -> &'a str {
        self.product.as_deref().unwrap_or(requirement)
    }
}
