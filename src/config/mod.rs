// src/config/mod.rs

//! Configuration loading for taskdag.
//!
//! The configuration is an ordered TOML tree; its structure (sections, task
//! entries, `name`, `using`) is interpreted by [`crate::dag::parser`].

pub mod loader;

pub use loader::{load_from_path, load_from_str};
