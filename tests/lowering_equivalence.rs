//! Lowered models must reproduce direct forest evaluation.

mod common;

use approx::assert_abs_diff_eq;
use common::*;
use forest_lower::*;
use ndarray::Axis;
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-9;

fn lower<S: SplitRule, P: EdgePredictor>(forest: Forest<S, P>, width: usize) -> (Model, Model) {
    let model = build_forest_model(forest, width).unwrap();
    let lowered = lower_forest_model(&model, &Config::default()).unwrap();
    (model, lowered)
}

fn check_equivalence<S: SplitRule, P: EdgePredictor>(forest: Forest<S, P>, width: usize, seed: u64) {
    let inputs = random_inputs(seed, 32, width);
    let reference = forest.clone();
    let (model, lowered) = lower(forest, width);
    assert_eq!(lowered.count_nodes("Forest"), 0);

    for row in inputs.axis_iter(Axis(0)) {
        let row = row.to_vec();
        let direct = reference.compute(&row).unwrap();

        let output = real_output(&lowered, &row, OUTPUT_PORT_NAME);
        assert_eq!(output.len(), 1);
        assert_abs_diff_eq!(output[0], direct.output, epsilon = TOLERANCE);

        let tree_outputs = real_output(&lowered, &row, TREE_OUTPUTS_PORT_NAME);
        assert_eq!(tree_outputs.len(), reference.num_trees());
        for (lowered_tree, direct_tree) in tree_outputs.iter().zip(&direct.tree_outputs) {
            assert_abs_diff_eq!(*lowered_tree, *direct_tree, epsilon = TOLERANCE);
        }

        let indicator = bool_output(&lowered, &row, EDGE_INDICATOR_PORT_NAME);
        assert_eq!(indicator, direct.edge_indicator);
        assert_single_path_per_tree(&reference, &indicator);

        // Aggregate is the bias plus the per-tree outputs.
        let mut expected = tree_outputs.clone();
        expected.push(reference.bias());
        let summed = expected.iter().fold(0.0, |acc, v| acc + v);
        assert_eq!(output[0], summed);
    }

    let report = verify_refinement(&model, &lowered, inputs.view(), &Config::default()).unwrap();
    assert!(report.is_equivalent(), "{}", report);
}

#[test]
fn test_stump_scenario() {
    let (_, lowered) = lower(stump(), 1);

    let high = real_output(&lowered, &[0.9], OUTPUT_PORT_NAME);
    assert_abs_diff_eq!(high[0], 2.1, epsilon = TOLERANCE);
    assert_eq!(real_output(&lowered, &[0.9], TREE_OUTPUTS_PORT_NAME), vec![2.0]);
    assert_eq!(
        bool_output(&lowered, &[0.9], EDGE_INDICATOR_PORT_NAME),
        vec![false, true]
    );

    let low = real_output(&lowered, &[0.1], OUTPUT_PORT_NAME);
    assert_abs_diff_eq!(low[0], 1.1, epsilon = TOLERANCE);
    assert_eq!(real_output(&lowered, &[0.1], TREE_OUTPUTS_PORT_NAME), vec![1.0]);
    assert_eq!(
        bool_output(&lowered, &[0.1], EDGE_INDICATOR_PORT_NAME),
        vec![true, false]
    );
}

#[test]
fn test_empty_forest_lowers_to_bias() {
    let mut forest = SimpleForest::new();
    forest.add_to_bias(3.5);
    let (_, lowered) = lower(forest, 2);

    assert_eq!(real_output(&lowered, &[0.0, 0.0], OUTPUT_PORT_NAME), vec![3.5]);
    assert!(real_output(&lowered, &[0.0, 0.0], TREE_OUTPUTS_PORT_NAME).is_empty());
    assert!(bool_output(&lowered, &[0.0, 0.0], EDGE_INDICATOR_PORT_NAME).is_empty());
}

#[test]
fn test_random_simple_forests() {
    for seed in 0..8 {
        check_equivalence(random_simple_forest(seed, 4, 6, 5), 5, seed + 100);
    }
}

#[test]
fn test_random_linear_forests() {
    for seed in 0..8 {
        check_equivalence(random_linear_forest(seed, 3, 5, 4), 4, seed + 200);
    }
}

#[test]
fn test_deep_single_tree() {
    check_equivalence(random_simple_forest(7, 1, 40, 3), 3, 7);
}

#[test]
fn test_input_wider_than_required() {
    check_equivalence(random_simple_forest(11, 2, 4, 2), 6, 11);
}

#[test]
fn test_lowering_after_json_round_trip() {
    let forest = random_linear_forest(5, 3, 4, 3);
    let restored = LinearForest::from_json(&forest.to_json().unwrap()).unwrap();
    assert_eq!(restored, forest);
    check_equivalence(restored, 3, 5);
}

#[test]
fn test_copy_then_refine() {
    let model = build_forest_model(random_simple_forest(3, 2, 3, 2), 2).unwrap();
    let copied = ModelTransformer::default().copy_model(&model).unwrap();
    assert_eq!(copied.count_nodes("Forest"), 1);

    let lowered = lower_forest_model(&copied, &Config::default()).unwrap();
    let inputs = random_inputs(3, 16, 2);
    let report = verify_refinement(&model, &lowered, inputs.view(), &Config::default()).unwrap();
    assert!(report.is_equivalent(), "{}", report);
}

#[test]
fn test_single_refine_pass_suffices() {
    let model = build_forest_model(random_simple_forest(9, 2, 3, 2), 2).unwrap();
    let config = ConfigBuilder::new().max_refine_iterations(1).build().unwrap();
    let lowered = lower_forest_model(&model, &config).unwrap();
    assert_eq!(lowered.count_nodes("Forest"), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_simple_forest_equivalence(
        seed in any::<u64>(),
        num_trees in 1usize..5,
        max_nodes in 1usize..8,
        input in prop::collection::vec(-1.5f64..1.5, 4),
    ) {
        let forest = random_simple_forest(seed, num_trees, max_nodes, 4);
        let direct = forest.compute(&input).unwrap();
        let (_, lowered) = lower(forest.clone(), 4);

        let output = real_output(&lowered, &input, OUTPUT_PORT_NAME);
        prop_assert!((output[0] - direct.output).abs() <= TOLERANCE);

        let indicator = bool_output(&lowered, &input, EDGE_INDICATOR_PORT_NAME);
        prop_assert_eq!(&indicator, &direct.edge_indicator);
        assert_single_path_per_tree(&forest, &indicator);
    }

    #[test]
    fn prop_linear_forest_equivalence(
        seed in any::<u64>(),
        num_trees in 1usize..4,
        max_nodes in 1usize..6,
        input in prop::collection::vec(-1.0f64..1.0, 3),
    ) {
        let forest = random_linear_forest(seed, num_trees, max_nodes, 3);
        let direct = forest.compute(&input).unwrap();
        let (_, lowered) = lower(forest, 3);

        let tree_outputs = real_output(&lowered, &input, TREE_OUTPUTS_PORT_NAME);
        prop_assert_eq!(tree_outputs.len(), direct.tree_outputs.len());
        for (a, b) in tree_outputs.iter().zip(&direct.tree_outputs) {
            prop_assert!((a - b).abs() <= TOLERANCE);
        }
        prop_assert_eq!(
            bool_output(&lowered, &input, EDGE_INDICATOR_PORT_NAME),
            direct.edge_indicator
        );
    }
}
