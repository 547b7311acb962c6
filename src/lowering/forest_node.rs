//! The forest node and its lowering into elementary nodes.
//!
//! Refinement walks the interior nodes in descending index order, so every
//! child's sub-model exists before its parent needs it:
//!
//! ```text
//! contribution(edge) = predictor                      if the edge ends at a leaf
//!                    = Sum(predictor, sub(child))     otherwise
//! sub(node)          = Select(contribution(edge 0), contribution(edge 1), split)
//! output             = Sum(sub(root_0), .., sub(root_k), bias)
//! ```
//!
//! Edge indicators are then wired in ascending order, each node gating its
//! two edges by its own incoming indicator.

use crate::core::constants::{
    EDGE_INDICATOR_PORT_NAME, OUTPUT_PORT_NAME, TREE_OUTPUTS_PORT_NAME,
};
use crate::core::error::{ForestError, Result};
use crate::core::types::NodeIndex;
use crate::forest::model::{EdgeTarget, Forest};
use crate::forest::predictor::{EdgePredictor, SplitRule};
use crate::graph::node::{ComputeContext, InputPort, Node, OutputPort};
use crate::graph::port::{NodeId, OutputRef, PortElements, PortType, Value};
use crate::graph::primitives::{ConstantNode, MultiplexerNode, NotNode, SelectNode, SumNode};
use crate::graph::transformer::ModelTransformer;
use crate::{ensure, invariant_violation};
use log::{debug, trace};
use std::sync::Arc;

/// Port index of the aggregate output.
pub const OUTPUT_PORT: usize = 0;
/// Port index of the per-tree outputs.
pub const TREE_OUTPUTS_PORT: usize = 1;
/// Port index of the edge-indicator vector.
pub const EDGE_INDICATOR_PORT: usize = 2;

/// A whole forest as a single graph node.
///
/// One real input (the feature vector) and three outputs: the aggregate
/// prediction, one value per tree, and one boolean per edge.
#[derive(Debug, Clone)]
pub struct ForestNode<S, P> {
    input: PortElements,
    forest: Arc<Forest<S, P>>,
}

impl<S: SplitRule, P: EdgePredictor> ForestNode<S, P> {
    /// A node evaluating `forest` on `input`.
    pub fn new(input: PortElements, forest: Forest<S, P>) -> Self {
        ForestNode {
            input,
            forest: Arc::new(forest),
        }
    }

    /// The evaluated forest.
    pub fn forest(&self) -> &Forest<S, P> {
        &self.forest
    }

    /// Builds the sub-model of every interior node, bottom-up. Also returns
    /// each node's split indicator.
    fn lower_sub_models(
        &self,
        transformer: &mut ModelTransformer,
        input: &PortElements,
    ) -> Result<(Vec<PortElements>, Vec<PortElements>)> {
        let forest = &*self.forest;
        let count = forest.num_interior_nodes();
        let mut sub_models: Vec<Option<PortElements>> = vec![None; count];
        let mut split_indicators: Vec<Option<PortElements>> = vec![None; count];

        for index in (0..count).rev() {
            let node = forest.interior_node(index)?;
            let mut contributions = Vec::with_capacity(2);
            for edge in node.outgoing_edges() {
                let prediction = edge.predictor().lower(transformer, input)?;
                let contribution = match edge.target() {
                    EdgeTarget::Leaf => prediction,
                    EdgeTarget::Interior(child) => {
                        let sub_model = sub_model_of(&sub_models, index, child)?;
                        let sum = transformer
                            .add_node(SumNode::new(PortElements::concat([&prediction, sub_model])))?;
                        transformer.output_elements(sum, 0)?
                    }
                };
                contributions.push(contribution);
            }

            let split = node.split_rule().lower(transformer, input)?;
            let mut contributions = contributions.into_iter();
            let (edge0, edge1) = match (contributions.next(), contributions.next()) {
                (Some(edge0), Some(edge1)) => (edge0, edge1),
                _ => {
                    return Err(ForestError::structural_mismatch(format!(
                        "node {} does not have two outgoing edges",
                        index
                    )))
                }
            };
            let select = transformer.add_node(SelectNode::new(edge0, edge1, split.clone()))?;
            sub_models[index] = Some(transformer.output_elements(select, 0)?);
            split_indicators[index] = Some(split);
        }

        let sub_models = sub_models.into_iter().flatten().collect::<Vec<_>>();
        let split_indicators = split_indicators.into_iter().flatten().collect::<Vec<_>>();
        Ok((sub_models, split_indicators))
    }

    /// Wires the edge-indicator vector top-down from the split indicators.
    fn lower_edge_indicators(
        &self,
        transformer: &mut ModelTransformer,
        split_indicators: &[PortElements],
    ) -> Result<PortElements> {
        let forest = &*self.forest;
        let count = forest.num_interior_nodes();
        let mut is_root = vec![false; count];
        for &root in forest.roots() {
            if let Some(flag) = is_root.get_mut(root) {
                *flag = true;
            }
        }

        let mut incoming: Vec<Option<PortElements>> = vec![None; count];
        let mut indicators: Vec<Option<PortElements>> = vec![None; forest.num_edges()];
        let mut shared_false: Option<PortElements> = None;

        for (index, split) in split_indicators.iter().enumerate() {
            let node = forest.interior_node(index)?;
            let (edge0, edge1) = if is_root[index] {
                let not = transformer.add_node(NotNode::new(split.clone()))?;
                (transformer.output_elements(not, 0)?, split.clone())
            } else {
                let reached = incoming[index].take().ok_or_else(|| {
                    ForestError::structural_mismatch(format!(
                        "node {} is neither a root nor the target of an edge",
                        index
                    ))
                })?;
                let never = match shared_false.clone() {
                    Some(elements) => elements,
                    None => {
                        let id = transformer.add_node(ConstantNode::boolean(vec![false]))?;
                        let elements = transformer.output_elements(id, 0)?;
                        shared_false = Some(elements.clone());
                        elements
                    }
                };
                let taken0 = transformer.add_node(MultiplexerNode::new(
                    PortElements::concat([&reached, &never]),
                    split.clone(),
                ))?;
                let taken1 = transformer.add_node(MultiplexerNode::new(
                    PortElements::concat([&never, &reached]),
                    split.clone(),
                ))?;
                (
                    transformer.output_elements(taken0, 0)?,
                    transformer.output_elements(taken1, 0)?,
                )
            };

            for (position, indicator) in [edge0, edge1].into_iter().enumerate() {
                if let Some(child) = node.outgoing_edges()[position].target_node_index() {
                    let slot = incoming
                        .get_mut(child)
                        .ok_or_else(|| ForestError::index_out_of_bounds(child, count))?;
                    *slot = Some(indicator.clone());
                }
                let edge = node.first_edge_index().saturating_add(position);
                let edge_count = indicators.len();
                *indicators
                    .get_mut(edge)
                    .ok_or_else(|| ForestError::index_out_of_bounds(edge, edge_count))? =
                    Some(indicator);
            }
        }

        let mut edge_indicator = PortElements::new();
        for (edge, indicator) in indicators.into_iter().enumerate() {
            let indicator = indicator.ok_or_else(|| {
                ForestError::structural_mismatch(format!("edge {} is not owned by any node", edge))
            })?;
            edge_indicator.append(&indicator);
        }
        Ok(edge_indicator)
    }
}

fn sub_model_of(
    sub_models: &[Option<PortElements>],
    parent: NodeIndex,
    child: NodeIndex,
) -> Result<&PortElements> {
    ensure!(
        child > parent,
        invariant_violation!(
            "node {} points at node {}, children must have greater indices",
            parent,
            child
        )
    );
    sub_models
        .get(child)
        .and_then(Option::as_ref)
        .ok_or_else(|| {
            invariant_violation!(
                "node {} points at node {} outside the {} interior nodes",
                parent,
                child,
                sub_models.len()
            )
        })
}

impl<S: SplitRule, P: EdgePredictor> Node for ForestNode<S, P> {
    fn type_name(&self) -> &'static str {
        "Forest"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        vec![InputPort::new("input", &self.input, PortType::Real)]
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![
            OutputPort::new(OUTPUT_PORT_NAME, PortType::Real, 1),
            OutputPort::new(TREE_OUTPUTS_PORT_NAME, PortType::Real, self.forest.num_trees()),
            OutputPort::new(
                EDGE_INDICATOR_PORT_NAME,
                PortType::Boolean,
                self.forest.num_edges(),
            ),
        ]
    }

    fn validate(&self) -> Result<()> {
        let required = self.forest.required_input_dimension();
        if self.input.len() < required {
            return Err(ForestError::dimension_mismatch(
                format!("at least {} input features", required),
                self.input.len().to_string(),
            ));
        }
        Ok(())
    }

    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        let input = context.reals(&self.input)?;
        let result = self.forest.compute(&input)?;
        Ok(vec![
            vec![Value::Real(result.output)],
            result.tree_outputs.into_iter().map(Value::Real).collect(),
            result
                .edge_indicator
                .into_iter()
                .map(Value::Boolean)
                .collect(),
        ])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let node = ForestNode {
            input: transformer.transform_port_elements(&self.input)?,
            forest: Arc::clone(&self.forest),
        };
        let new_id = transformer.add_node(node)?;
        transformer.map_all_outputs(id, new_id)
    }

    fn refine(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<bool> {
        let forest = &*self.forest;
        if transformer.context().validate_forest {
            forest.validate()?;
        }
        let nodes_before = transformer.model().len();
        let input = transformer.transform_port_elements(&self.input)?;

        let (sub_models, split_indicators) = self.lower_sub_models(transformer, &input)?;

        let mut tree_outputs = PortElements::new();
        for (tree, &root) in forest.roots().iter().enumerate() {
            let sub_model = sub_models.get(root).ok_or_else(|| {
                ForestError::structural_mismatch(format!(
                    "root index {} of tree {} is outside the {} interior nodes",
                    root,
                    tree,
                    sub_models.len()
                ))
            })?;
            trace!("tree {} output taken from node {}", tree, root);
            tree_outputs.append(sub_model);
        }

        let bias = transformer.add_node(ConstantNode::real(vec![forest.bias()]))?;
        let mut contributions = tree_outputs.clone();
        contributions.append(&transformer.output_elements(bias, 0)?);
        let sum = transformer.add_node(SumNode::new(contributions))?;
        let output = transformer.output_elements(sum, 0)?;

        let edge_indicator = self.lower_edge_indicators(transformer, &split_indicators)?;

        transformer.map_node_output(OutputRef::new(id, OUTPUT_PORT), output);
        transformer.map_node_output(OutputRef::new(id, TREE_OUTPUTS_PORT), tree_outputs);
        transformer.map_node_output(OutputRef::new(id, EDGE_INDICATOR_PORT), edge_indicator);

        debug!(
            "Lowered forest node {} ({} trees, {} interior nodes) into {} nodes",
            id,
            forest.num_trees(),
            forest.num_interior_nodes(),
            transformer.model().len() - nodes_before
        );
        Ok(true)
    }
}
