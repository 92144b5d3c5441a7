// src/config/loader.rs

use std::fs;
use std::path::Path;

use toml::Table;
use tracing::debug;

use crate::errors::Result;

/// Load a configuration file and return its raw task tree.
///
/// This only performs TOML deserialization; task types, names and bindings
/// are checked when the tree is parsed into a [`TaskDag`](crate::dag::TaskDag).
/// Entry order is preserved, so default task names follow the file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let input = load_from_str(&contents)?;
    debug!(path = %path.display(), entries = input.len(), "loaded task configuration");

    Ok(input)
}

/// Parse a configuration tree from TOML text.
pub fn load_from_str(contents: &str) -> Result<Table> {
    Ok(toml::from_str::<Table>(contents)?)
}
