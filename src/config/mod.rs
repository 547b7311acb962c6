//! Configuration management.
//!
//! Settings are collected in a single [`Config`], either assembled through
//! [`ConfigBuilder`], loaded from a file, or read from the environment.

pub mod core;

pub use self::core::{Config, ConfigBuilder};

/// Conventional name of a configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "forest_lower.toml";
