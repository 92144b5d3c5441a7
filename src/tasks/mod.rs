// src/tasks/mod.rs

//! Built-in task types.
//!
//! - `scalar`: publishes a configured `f64` as a `"double"` product.
//! - `compare`: checks two `"double"` requirements against a tolerance.

pub mod compare;
pub mod scalar;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::task::TaskRegistry;

pub use compare::CompareScalars;
pub use scalar::ScalarValue;

/// Register every built-in task type.
pub fn register_builtins(registry: &mut TaskRegistry) {
    registry.register(scalar::KIND, scalar::schema(), scalar::create);
    registry.register(compare::KIND, compare::schema(), compare::create);
}

/// Deserialize a (schema-validated) task configuration into its typed form.
pub(crate) fn typed_config<T: DeserializeOwned>(config: &Table) -> anyhow::Result<T> {
    Ok(Value::Table(config.clone()).try_into()?)
}
