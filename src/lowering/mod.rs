//! Lowering of forest nodes into elementary graphs.
//!
//! [`build_forest_model`] wraps a forest in a model with an input node and the
//! three named forest outputs; [`lower_forest_model`] refines such a model
//! until only elementary nodes remain. [`verify_refinement`] compares the two.

pub mod forest_node;
pub mod verify;

pub use forest_node::{ForestNode, EDGE_INDICATOR_PORT, OUTPUT_PORT, TREE_OUTPUTS_PORT};
pub use verify::{verify_refinement, EquivalenceReport, OutputComparison};

use crate::config::Config;
use crate::core::constants::{EDGE_INDICATOR_PORT_NAME, OUTPUT_PORT_NAME, TREE_OUTPUTS_PORT_NAME};
use crate::core::error::{ForestError, Result};
use crate::forest::model::Forest;
use crate::forest::predictor::{EdgePredictor, SplitRule};
use crate::graph::model::Model;
use crate::graph::primitives::InputNode;
use crate::graph::transformer::{ModelTransformer, TransformContext};

/// Builds `Input(input_dimension) -> Forest` with the outputs `output`,
/// `treeOutputs` and `edgeIndicatorVector`. The forest is validated first.
pub fn build_forest_model<S, P>(forest: Forest<S, P>, input_dimension: usize) -> Result<Model>
where
    S: SplitRule,
    P: EdgePredictor,
{
    forest.validate()?;
    let required = forest.required_input_dimension();
    if input_dimension < required {
        return Err(ForestError::dimension_mismatch(
            format!("at least {} input features", required),
            input_dimension.to_string(),
        ));
    }

    let mut model = Model::new();
    let input = model.add_node(InputNode::new(input_dimension))?;
    let features = model.output_elements(input, 0)?;
    let node = model.add_node(ForestNode::new(features, forest))?;

    for (port, name) in [
        (OUTPUT_PORT, OUTPUT_PORT_NAME),
        (TREE_OUTPUTS_PORT, TREE_OUTPUTS_PORT_NAME),
        (EDGE_INDICATOR_PORT, EDGE_INDICATOR_PORT_NAME),
    ] {
        let elements = model.output_elements(node, port)?;
        model.add_output(name, elements)?;
    }
    Ok(model)
}

/// Refines `model` until no forest node (or other composite node) remains.
pub fn lower_forest_model(model: &Model, config: &Config) -> Result<Model> {
    config.validate()?;
    let mut transformer = ModelTransformer::new(TransformContext::from_config(config));
    transformer.refine_model(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::model::SplitAction;
    use crate::forest::predictor::{ConstantPredictor, SingleFeatureThreshold};
    use ndarray::array;

    fn stump() -> Forest<SingleFeatureThreshold, ConstantPredictor> {
        let mut forest = Forest::new();
        forest
            .split(SplitAction::root(
                SingleFeatureThreshold::new(0, 0.5),
                [ConstantPredictor::new(1.0), ConstantPredictor::new(2.0)],
            ))
            .unwrap();
        forest.add_to_bias(0.1);
        forest
    }

    #[test]
    fn test_build_and_lower() {
        let model = build_forest_model(stump(), 1).unwrap();
        assert_eq!(model.count_nodes("Forest"), 1);
        assert!(model.output(TREE_OUTPUTS_PORT_NAME).is_some());

        let lowered = lower_forest_model(&model, &Config::default()).unwrap();
        assert_eq!(lowered.count_nodes("Forest"), 0);

        let report =
            verify_refinement(&model, &lowered, array![[0.9], [0.1]].view(), &Config::default())
                .unwrap();
        assert!(report.is_equivalent());
        assert_eq!(report.outputs.len(), 3);
    }

    #[test]
    fn test_build_rejects_narrow_input() {
        let err = build_forest_model(stump(), 0).unwrap_err();
        assert!(matches!(err, ForestError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_build_rejects_malformed_forest() {
        let mut forest = stump();
        let json = forest
            .to_json()
            .unwrap()
            .replace("\"first_edge_index\": 0", "\"first_edge_index\": 7");
        forest = serde_json::from_str(&json).unwrap();

        let err = build_forest_model(forest, 1).unwrap_err();
        assert!(matches!(err, ForestError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_lower_rejects_invalid_config() {
        let model = build_forest_model(stump(), 1).unwrap();
        let config = Config {
            max_refine_iterations: 0,
            ..Config::default()
        };
        assert!(lower_forest_model(&model, &config).is_err());
    }
}
