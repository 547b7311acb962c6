//! Core configuration structure and builder.
//!
//! [`Config`] carries the settings shared by logging, the refinement driver,
//! the equivalence harness and batch evaluation. It can be built fluently,
//! loaded from `.json`/`.toml` files, or overridden through `FOREST_LOWER_*`
//! environment variables.

use crate::core::constants::*;
use crate::core::error::{ForestError, Result};
use crate::core::types::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging verbosity used by `forest_lower::init_with_config`
    pub verbosity: VerbosityLevel,
    /// Upper bound on refinement passes over a model
    pub max_refine_iterations: usize,
    /// Check forest invariants before a forest node is lowered
    pub validate_forest: bool,
    /// Absolute tolerance when comparing lowered and direct numeric outputs
    pub equivalence_tolerance: f64,
    /// Threads used by batch evaluation (0 = all cores)
    pub num_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbosity: DEFAULT_VERBOSITY,
            max_refine_iterations: DEFAULT_MAX_REFINE_ITERATIONS,
            validate_forest: true,
            equivalence_tolerance: DEFAULT_EQUIVALENCE_TOLERANCE,
            num_threads: DEFAULT_NUM_THREADS,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_refine_iterations == 0 {
            return Err(ForestError::invalid_parameter(
                "max_refine_iterations",
                self.max_refine_iterations.to_string(),
                "must be at least 1",
            ));
        }

        if !self.equivalence_tolerance.is_finite() || self.equivalence_tolerance < 0.0 {
            return Err(ForestError::invalid_parameter(
                "equivalence_tolerance",
                self.equivalence_tolerance.to_string(),
                "must be a finite, non-negative number",
            ));
        }

        Ok(())
    }

    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ForestError::config(format!("Failed to read config file: {}", e)))?;

        let config: Config = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ForestError::config(format!("Failed to parse JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ForestError::config(format!("Failed to parse TOML config: {}", e)))?,
            _ => {
                return Err(ForestError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| ForestError::config(format!("Failed to serialize to JSON: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| ForestError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(ForestError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| ForestError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load configuration from `FOREST_LOWER_*` environment variables
    pub fn load_from_environment() -> Result<Self> {
        let mut config = Config::default();
        config.apply_environment_overrides()?;
        Ok(config)
    }

    /// Apply `FOREST_LOWER_*` environment variable overrides to this configuration
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, which maps a full variable name
    /// (prefix included) to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));
        let invalid = |suffix: &str| ForestError::config(format!("Invalid {}{}", ENV_PREFIX, suffix));

        if let Some(val) = var("VERBOSITY") {
            self.verbosity = VerbosityLevel::parse(&val).ok_or_else(|| invalid("VERBOSITY"))?;
        }

        if let Some(val) = var("MAX_REFINE_ITERATIONS") {
            self.max_refine_iterations = val
                .parse()
                .map_err(|_| invalid("MAX_REFINE_ITERATIONS"))?;
        }

        if let Some(val) = var("VALIDATE_FOREST") {
            self.validate_forest = match val.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(invalid("VALIDATE_FOREST")),
            };
        }

        if let Some(val) = var("EQUIVALENCE_TOLERANCE") {
            self.equivalence_tolerance = val
                .parse()
                .map_err(|_| invalid("EQUIVALENCE_TOLERANCE"))?;
        }

        if let Some(val) = var("NUM_THREADS") {
            self.num_threads = val.parse().map_err(|_| invalid("NUM_THREADS"))?;
        }

        self.validate()
    }

    /// Get the effective number of threads (0 means use all available cores)
    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }

    /// Get configuration as a parameter map (for debugging/serialization)
    pub fn as_parameter_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("verbosity".to_string(), self.verbosity.to_string());
        map.insert(
            "max_refine_iterations".to_string(),
            self.max_refine_iterations.to_string(),
        );
        map.insert(
            "validate_forest".to_string(),
            self.validate_forest.to_string(),
        );
        map.insert(
            "equivalence_tolerance".to_string(),
            self.equivalence_tolerance.to_string(),
        );
        map.insert("num_threads".to_string(), self.num_threads.to_string());

        map
    }
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
    validation_errors: Vec<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the logging verbosity
    pub fn verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    /// Set the maximum number of refinement passes
    pub fn max_refine_iterations(mut self, iterations: usize) -> Self {
        if iterations == 0 {
            self.validation_errors
                .push("max_refine_iterations must be at least 1".to_string());
        }
        self.config.max_refine_iterations = iterations;
        self
    }

    /// Enable or disable forest validation before lowering
    pub fn validate_forest(mut self, validate: bool) -> Self {
        self.config.validate_forest = validate;
        self
    }

    /// Set the numeric tolerance of the equivalence check
    pub fn equivalence_tolerance(mut self, tolerance: f64) -> Self {
        if !tolerance.is_finite() || tolerance < 0.0 {
            self.validation_errors
                .push("equivalence_tolerance must be a finite, non-negative number".to_string());
        }
        self.config.equivalence_tolerance = tolerance;
        self
    }

    /// Set the number of threads used by batch evaluation
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        if !self.validation_errors.is_empty() {
            return Err(ForestError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
