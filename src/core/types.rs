//! Core data types shared across the forest model, the graph and the
//! lowering pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric type for features, predictor outputs and sums.
pub type Real = f64;

/// Index of an interior node in a forest's flat interior-node array.
pub type NodeIndex = usize;

/// Index of an edge in a forest's flat edge-index space.
pub type EdgeIndex = usize;

/// Index of a tree within a forest.
pub type TreeIndex = usize;

/// Index of an element of the input feature vector.
pub type FeatureIndex = usize;

/// Logging verbosity, mapped onto a `log::LevelFilter` at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Errors only
    Fatal = -1,
    /// Warnings and errors
    Warning = 0,
    /// Information, warnings, and errors
    Info = 1,
    /// Debug information
    Debug = 2,
}

impl Default for VerbosityLevel {
    fn default() -> Self {
        VerbosityLevel::Info
    }
}

impl VerbosityLevel {
    /// Corresponding filter for the `log` facade.
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            VerbosityLevel::Fatal => log::LevelFilter::Error,
            VerbosityLevel::Warning => log::LevelFilter::Warn,
            VerbosityLevel::Info => log::LevelFilter::Info,
            VerbosityLevel::Debug => log::LevelFilter::Debug,
        }
    }

    /// Parses the names accepted in config files and environment variables.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fatal" | "error" | "-1" => Some(VerbosityLevel::Fatal),
            "warning" | "warn" | "0" => Some(VerbosityLevel::Warning),
            "info" | "1" => Some(VerbosityLevel::Info),
            "debug" | "2" => Some(VerbosityLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbosityLevel::Fatal => write!(f, "fatal"),
            VerbosityLevel::Warning => write!(f, "warning"),
            VerbosityLevel::Info => write!(f, "info"),
            VerbosityLevel::Debug => write!(f, "debug"),
        }
    }
}
