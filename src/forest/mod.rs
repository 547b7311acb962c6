//! Decision forests.
//!
//! - [`predictor`]: the [`SplitRule`] and [`EdgePredictor`] capabilities and
//!   their concrete variants
//! - [`model`]: the structural model ([`Forest`], [`InteriorNode`], [`Edge`])
//! - [`evaluate`]: direct, traversal-based evaluation

pub mod evaluate;
pub mod model;
pub mod predictor;

pub use evaluate::ForestOutput;
pub use model::{Edge, EdgeTarget, Forest, InteriorNode, SplitAction, SplittableNode};
pub use predictor::{
    ConstantPredictor, EdgePredictor, LinearPredictor, LinearThreshold, SingleFeatureThreshold,
    SplitRule,
};

/// Forest whose splits test one feature against a threshold and whose edges
/// carry constants, the shape produced by most tree learners.
pub type SimpleForest = Forest<SingleFeatureThreshold, ConstantPredictor>;
