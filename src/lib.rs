//! # forest-lower
//!
//! Lowering of decision-forest models into graphs of elementary operations,
//! plus a compact codec for non-decreasing integer sequences.
//!
//! ## Features
//!
//! - **Forest model**: trees of interior nodes sharing one flat node array and
//!   one flat edge-index space, generic over split rules and edge predictors.
//! - **Direct evaluation**: aggregate output, per-tree outputs and the
//!   edge-indicator vector, for one input or for a batch on a Rayon pool.
//! - **Lowering**: a forest node refines itself into sums, selects, negations,
//!   multiplexers and constants whose outputs match direct evaluation.
//! - **Compressed integer lists**: delta + 7-bit variable-length encoding with
//!   a forward-only, copyable cursor.
//!
//! ## Quick Start
//!
//! ```rust
//! use forest_lower::{
//!     build_forest_model, lower_forest_model, Config, ConstantPredictor, Forest,
//!     SingleFeatureThreshold, SplitAction,
//! };
//!
//! # fn main() -> forest_lower::Result<()> {
//! let mut forest = Forest::new();
//! forest.split(SplitAction::root(
//!     SingleFeatureThreshold::new(0, 0.5),
//!     [ConstantPredictor::new(1.0), ConstantPredictor::new(2.0)],
//! ))?;
//! forest.add_to_bias(0.1);
//!
//! let model = build_forest_model(forest, 1)?;
//! let lowered = lower_forest_model(&model, &Config::default())?;
//! assert_eq!(lowered.count_nodes("Forest"), 0);
//!
//! let tree_outputs = lowered.compute_output(&[0.9], "treeOutputs")?;
//! assert_eq!(tree_outputs[0].as_real()?, 2.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`]: errors, shared types, constants and logging set-up
//! - [`config`]: configuration, file and environment loading
//! - [`dataset`]: the compressed integer list
//! - [`forest`]: forest model, predictors and direct evaluation
//! - [`graph`]: nodes, models, primitives and the model transformer
//! - [`lowering`]: the forest node, model helpers and equivalence checking

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod core;
pub mod dataset;
pub mod forest;
pub mod graph;
pub mod lowering;

// Re-export core functionality for convenience
pub use crate::core::{
    constants::*,
    error::{ForestError, Result},
    types::*,
};

// Re-export configuration functionality
pub use crate::config::{Config, ConfigBuilder};

// Re-export dataset functionality
pub use crate::dataset::{CompressedIntegerIter, CompressedIntegerList};

// Re-export forest functionality
pub use crate::forest::{
    ConstantPredictor, Edge, EdgePredictor, EdgeTarget, Forest, ForestOutput, InteriorNode,
    LinearPredictor, LinearThreshold, SimpleForest, SingleFeatureThreshold, SplitAction,
    SplitRule, SplittableNode,
};

// Re-export graph functionality
pub use crate::graph::{
    Model, ModelTransformer, Node, NodeId, OutputRef, PortElements, PortType, TransformContext,
    Value,
};

// Re-export lowering functionality
pub use crate::lowering::{
    build_forest_model, lower_forest_model, verify_refinement, EquivalenceReport, ForestNode,
};

// Version information
pub use crate::core::constants::FOREST_LOWER_VERSION as VERSION;

/// Initialize logging at the default verbosity.
///
/// Safe to call more than once; later calls are no-ops.
///
/// # Examples
///
/// ```rust
/// fn main() -> forest_lower::Result<()> {
///     forest_lower::init()?;
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    crate::core::initialize_core(DEFAULT_VERBOSITY)
}

/// Initialize logging at the verbosity named by `config`.
pub fn init_with_config(config: &Config) -> Result<()> {
    config.validate()?;
    crate::core::initialize_core(config.verbosity)
}

/// Check if the library has been initialized.
pub fn is_initialized() -> bool {
    crate::core::is_core_initialized()
}
