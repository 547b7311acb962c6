//! Split rules and edge predictors.
//!
//! A forest is parameterized over two capabilities: a [`SplitRule`] turns a
//! feature vector into a boolean decision, an [`EdgePredictor`] turns it into
//! a scalar contribution. Both can evaluate directly and can emit an
//! equivalent sub-graph of elementary nodes, which is how the lowering pass
//! stays independent of the concrete kinds.

use crate::core::error::{ForestError, Result};
use crate::core::types::{FeatureIndex, Real};
use crate::graph::port::PortElements;
use crate::graph::primitives::{
    dot_product, sequential_sum, CompareNode, ComparisonOp, ConstantNode, DotProductNode, SumNode,
};
use crate::graph::transformer::ModelTransformer;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Produces a boolean decision from a feature vector.
pub trait SplitRule: Debug + Clone + Send + Sync + 'static {
    /// The decision for `input`.
    fn evaluate(&self, input: &[Real]) -> Result<bool>;

    /// Highest feature index read, if any.
    fn max_feature_index(&self) -> Option<FeatureIndex>;

    /// Emits nodes computing the decision from `input` and returns the single
    /// boolean element holding it.
    fn lower(&self, transformer: &mut ModelTransformer, input: &PortElements)
        -> Result<PortElements>;
}

/// Produces a scalar contribution from a feature vector.
pub trait EdgePredictor: Debug + Clone + Send + Sync + 'static {
    /// The contribution for `input`.
    fn predict(&self, input: &[Real]) -> Result<Real>;

    /// Highest feature index read, if any.
    fn max_feature_index(&self) -> Option<FeatureIndex>;

    /// Emits nodes computing the contribution from `input` and returns the
    /// single real element holding it.
    fn lower(&self, transformer: &mut ModelTransformer, input: &PortElements)
        -> Result<PortElements>;
}

fn feature(input: &[Real], index: FeatureIndex) -> Result<Real> {
    input
        .get(index)
        .copied()
        .ok_or_else(|| ForestError::index_out_of_bounds(index, input.len()))
}

fn leading_features(input: &[Real], count: usize) -> Result<&[Real]> {
    input.get(..count).ok_or_else(|| {
        ForestError::dimension_mismatch(
            format!("at least {} input features", count),
            input.len().to_string(),
        )
    })
}

fn constant(transformer: &mut ModelTransformer, values: Vec<Real>) -> Result<PortElements> {
    let id = transformer.add_node(ConstantNode::real(values))?;
    transformer.output_elements(id, 0)
}

/// Emits `weights · input[..weights.len()] + bias`.
fn lower_affine(
    transformer: &mut ModelTransformer,
    input: &PortElements,
    weights: &[Real],
    bias: Real,
) -> Result<PortElements> {
    let features = input.range(0, weights.len())?;
    let weights = constant(transformer, weights.to_vec())?;
    let dot = transformer.add_node(DotProductNode::new(features, weights))?;
    let dot = transformer.output_elements(dot, 0)?;
    let bias = constant(transformer, vec![bias])?;
    let sum = transformer.add_node(SumNode::new(PortElements::concat([&dot, &bias])))?;
    transformer.output_elements(sum, 0)
}

fn affine(input: &[Real], weights: &[Real], bias: Real) -> Result<Real> {
    let features = leading_features(input, weights.len())?;
    Ok(sequential_sum(&[dot_product(weights, features), bias]))
}

/// `input[feature] > threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleFeatureThreshold {
    /// Feature compared against the threshold
    pub feature: FeatureIndex,
    /// Decision threshold
    pub threshold: Real,
}

impl SingleFeatureThreshold {
    /// Creates the rule `input[feature] > threshold`.
    pub fn new(feature: FeatureIndex, threshold: Real) -> Self {
        SingleFeatureThreshold { feature, threshold }
    }
}

impl SplitRule for SingleFeatureThreshold {
    fn evaluate(&self, input: &[Real]) -> Result<bool> {
        Ok(feature(input, self.feature)? > self.threshold)
    }

    fn max_feature_index(&self) -> Option<FeatureIndex> {
        Some(self.feature)
    }

    fn lower(
        &self,
        transformer: &mut ModelTransformer,
        input: &PortElements,
    ) -> Result<PortElements> {
        let value = input.element(self.feature)?;
        let threshold = constant(transformer, vec![self.threshold])?;
        let compare = transformer.add_node(CompareNode::new(ComparisonOp::Greater, value, threshold))?;
        transformer.output_elements(compare, 0)
    }
}

/// `weights · input + bias > 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearThreshold {
    /// Weights of the leading features
    pub weights: Vec<Real>,
    /// Added after the dot product
    pub bias: Real,
}

impl LinearThreshold {
    /// Creates the rule `weights · input + bias > 0`.
    pub fn new(weights: Vec<Real>, bias: Real) -> Self {
        LinearThreshold { weights, bias }
    }
}

impl SplitRule for LinearThreshold {
    fn evaluate(&self, input: &[Real]) -> Result<bool> {
        Ok(affine(input, &self.weights, self.bias)? > 0.0)
    }

    fn max_feature_index(&self) -> Option<FeatureIndex> {
        self.weights.len().checked_sub(1)
    }

    fn lower(
        &self,
        transformer: &mut ModelTransformer,
        input: &PortElements,
    ) -> Result<PortElements> {
        let value = lower_affine(transformer, input, &self.weights, self.bias)?;
        let zero = constant(transformer, vec![0.0])?;
        let compare = transformer.add_node(CompareNode::new(ComparisonOp::Greater, value, zero))?;
        transformer.output_elements(compare, 0)
    }
}

/// A fixed contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantPredictor {
    /// The contribution
    pub value: Real,
}

impl ConstantPredictor {
    /// Creates a predictor that always returns `value`.
    pub fn new(value: Real) -> Self {
        ConstantPredictor { value }
    }
}

impl EdgePredictor for ConstantPredictor {
    fn predict(&self, _input: &[Real]) -> Result<Real> {
        Ok(self.value)
    }

    fn max_feature_index(&self) -> Option<FeatureIndex> {
        None
    }

    fn lower(
        &self,
        transformer: &mut ModelTransformer,
        _input: &PortElements,
    ) -> Result<PortElements> {
        constant(transformer, vec![self.value])
    }
}

/// `weights · input + bias`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPredictor {
    /// Weights of the leading features
    pub weights: Vec<Real>,
    /// Added after the dot product
    pub bias: Real,
}

impl LinearPredictor {
    /// Creates the predictor `weights · input + bias`.
    pub fn new(weights: Vec<Real>, bias: Real) -> Self {
        LinearPredictor { weights, bias }
    }
}

impl EdgePredictor for LinearPredictor {
    fn predict(&self, input: &[Real]) -> Result<Real> {
        affine(input, &self.weights, self.bias)
    }

    fn max_feature_index(&self) -> Option<FeatureIndex> {
        self.weights.len().checked_sub(1)
    }

    fn lower(
        &self,
        transformer: &mut ModelTransformer,
        input: &PortElements,
    ) -> Result<PortElements> {
        lower_affine(transformer, input, &self.weights, self.bias)
    }
}
