//! Common test utilities for forest-lower integration tests.

#![allow(dead_code)]

use forest_lower::*;
use ndarray::Array2;
use rand::prelude::*;

/// Forest with affine split rules and affine edge predictors.
pub type LinearForest = Forest<LinearThreshold, LinearPredictor>;

/// The one-node forest used throughout the docs: `x0 > 0.5`, leaves 1.0 and
/// 2.0, bias 0.1.
pub fn stump() -> SimpleForest {
    let mut forest = SimpleForest::new();
    forest
        .split(SplitAction::root(
            SingleFeatureThreshold::new(0, 0.5),
            [ConstantPredictor::new(1.0), ConstantPredictor::new(2.0)],
        ))
        .unwrap();
    forest.add_to_bias(0.1);
    forest
}

/// Grows a forest tree by tree, each time splitting a random open leaf.
fn grow<S, P, FS, FP>(
    rng: &mut StdRng,
    num_trees: usize,
    max_nodes_per_tree: usize,
    mut split_rule: FS,
    mut predictor: FP,
) -> Forest<S, P>
where
    S: SplitRule,
    P: EdgePredictor,
    FS: FnMut(&mut StdRng) -> S,
    FP: FnMut(&mut StdRng) -> P,
{
    let mut forest = Forest::new();
    for _ in 0..num_trees {
        let rule = split_rule(rng);
        let predictors = [predictor(rng), predictor(rng)];
        let root = forest.split(SplitAction::root(rule, predictors)).unwrap();

        let mut open_leaves = vec![(root, 0), (root, 1)];
        let extra = rng.gen_range(0..max_nodes_per_tree.max(1));
        for _ in 0..extra {
            let pick = rng.gen_range(0..open_leaves.len());
            let (parent, position) = open_leaves.swap_remove(pick);
            let rule = split_rule(rng);
            let predictors = [predictor(rng), predictor(rng)];
            let node = forest
                .split(SplitAction::child(parent, position, rule, predictors))
                .unwrap();
            open_leaves.push((node, 0));
            open_leaves.push((node, 1));
        }
    }
    forest.add_to_bias(rng.gen_range(-1.0..1.0));
    forest
}

/// Random forest of single-feature thresholds and constant leaves.
pub fn random_simple_forest(
    seed: u64,
    num_trees: usize,
    max_nodes_per_tree: usize,
    num_features: usize,
) -> SimpleForest {
    let mut rng = StdRng::seed_from_u64(seed);
    grow(
        &mut rng,
        num_trees,
        max_nodes_per_tree,
        |rng| SingleFeatureThreshold::new(rng.gen_range(0..num_features), rng.gen_range(-1.0..1.0)),
        |rng| ConstantPredictor::new(rng.gen_range(-2.0..2.0)),
    )
}

/// Random forest of affine rules and affine predictors.
pub fn random_linear_forest(
    seed: u64,
    num_trees: usize,
    max_nodes_per_tree: usize,
    num_features: usize,
) -> LinearForest {
    let mut rng = StdRng::seed_from_u64(seed);
    let weights = |rng: &mut StdRng| -> Vec<f64> {
        let len = rng.gen_range(0..=num_features);
        (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
    };
    grow(
        &mut rng,
        num_trees,
        max_nodes_per_tree,
        |rng| LinearThreshold::new(weights(rng), rng.gen_range(-0.5..0.5)),
        |rng| LinearPredictor::new(weights(rng), rng.gen_range(-2.0..2.0)),
    )
}

/// Uniform random feature rows in [-1, 1).
pub fn random_inputs(seed: u64, num_rows: usize, num_features: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((num_rows, num_features), |_| rng.gen_range(-1.0..1.0))
}

/// Checks that the true entries of `indicator` trace exactly one root-to-leaf
/// path per tree.
pub fn assert_single_path_per_tree<S, P>(forest: &Forest<S, P>, indicator: &[bool]) {
    assert_eq!(indicator.len(), forest.num_edges());
    let mut visited = vec![false; forest.num_edges()];

    for &root in forest.roots() {
        let mut current = root;
        loop {
            let node = forest.interior_node(current).unwrap();
            let first = node.first_edge_index();
            let taken: Vec<usize> = (0..2).filter(|&p| indicator[first + p]).collect();
            assert_eq!(taken.len(), 1, "node {} must have exactly one taken edge", current);
            visited[first + taken[0]] = true;
            match node.outgoing_edges()[taken[0]].target() {
                EdgeTarget::Leaf => break,
                EdgeTarget::Interior(child) => current = child,
            }
        }
    }

    for (edge, (&on, &seen)) in indicator.iter().zip(&visited).enumerate() {
        assert_eq!(on, seen, "edge {} is flagged off the taken paths", edge);
    }
}

/// Reads a real output by name.
pub fn real_output(model: &Model, input: &[f64], name: &str) -> Vec<f64> {
    model
        .compute_output(input, name)
        .unwrap()
        .iter()
        .map(|value| value.as_real().unwrap())
        .collect()
}

/// Reads a boolean output by name.
pub fn bool_output(model: &Model, input: &[f64], name: &str) -> Vec<bool> {
    model
        .compute_output(input, name)
        .unwrap()
        .iter()
        .map(|value| value.as_bool().unwrap())
        .collect()
}
