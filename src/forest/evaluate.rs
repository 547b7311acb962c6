//! Direct evaluation of a forest.
//!
//! Each tree is walked from its root to the leaf its split rules choose. The
//! contribution of a path is accumulated from the leaf upwards, each edge
//! adding its predictor to the value of the subtree below it, which is the
//! same association the lowered graph uses.

use crate::config::Config;
use crate::core::error::Result;
use crate::core::types::{EdgeIndex, Real, TreeIndex};
use crate::dataset::CompressedIntegerList;
use crate::forest::model::{EdgeTarget, Forest};
use crate::forest::predictor::{EdgePredictor, SplitRule};
use crate::graph::primitives::sequential_sum;
use crate::invariant_violation;
use log::debug;
use ndarray::{Array1, ArrayView2, Axis};
use rayon::prelude::*;

/// All three outputs of a forest for one input.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestOutput {
    /// Bias plus the sum of tree outputs
    pub output: Real,
    /// One accumulated path value per tree, bias excluded
    pub tree_outputs: Vec<Real>,
    /// One entry per edge: true if the edge lies on a taken path
    pub edge_indicator: Vec<bool>,
}

impl ForestOutput {
    /// Indices of the edges that were taken, in ascending order.
    pub fn active_edges(&self) -> Result<CompressedIntegerList> {
        CompressedIntegerList::from_sorted(
            self.edge_indicator
                .iter()
                .enumerate()
                .filter(|(_, &taken)| taken)
                .map(|(edge, _)| edge as u64),
        )
    }
}

/// A root-to-leaf walk: the flat index and prediction of each taken edge.
struct Path {
    edges: Vec<EdgeIndex>,
    predictions: Vec<Real>,
}

impl Path {
    fn value(&self) -> Real {
        let mut predictions = self.predictions.iter().rev();
        let leaf = predictions.next().copied().unwrap_or(0.0);
        predictions.fold(leaf, |below, &prediction| sequential_sum(&[prediction, below]))
    }
}

impl<S: SplitRule, P: EdgePredictor> Forest<S, P> {
    fn walk(&self, tree: TreeIndex, input: &[Real]) -> Result<Path> {
        let mut path = Path {
            edges: Vec::new(),
            predictions: Vec::new(),
        };
        let mut current = self.root_index(tree)?;
        // Each step moves to a strictly larger index, so the walk ends.
        for _ in 0..=self.num_interior_nodes() {
            let node = self.interior_node(current)?;
            let position = usize::from(node.split_rule().evaluate(input)?);
            let edge = &node.outgoing_edges()[position];
            path.edges.push(node.first_edge_index().saturating_add(position));
            path.predictions.push(edge.predictor().predict(input)?);
            match edge.target() {
                EdgeTarget::Leaf => return Ok(path),
                EdgeTarget::Interior(child) if child > current => current = child,
                EdgeTarget::Interior(child) => {
                    return Err(invariant_violation!(
                        "node {} points at node {}, children must have greater indices",
                        current,
                        child
                    ))
                }
            }
        }
        Err(invariant_violation!("tree {} does not reach a leaf", tree))
    }

    /// Accumulated path value of one tree (bias excluded).
    pub fn tree_output(&self, tree: TreeIndex, input: &[Real]) -> Result<Real> {
        Ok(self.walk(tree, input)?.value())
    }

    /// Bias plus the sum of all tree outputs.
    pub fn predict(&self, input: &[Real]) -> Result<Real> {
        Ok(self.compute(input)?.output)
    }

    /// Flags every edge on a taken root-to-leaf path.
    pub fn edge_indicator_vector(&self, input: &[Real]) -> Result<Vec<bool>> {
        Ok(self.compute(input)?.edge_indicator)
    }

    /// Computes all three outputs in one traversal per tree.
    pub fn compute(&self, input: &[Real]) -> Result<ForestOutput> {
        let mut tree_outputs = Vec::with_capacity(self.num_trees());
        let mut edge_indicator = vec![false; self.num_edges()];
        for tree in 0..self.num_trees() {
            let path = self.walk(tree, input)?;
            for &edge in &path.edges {
                let edge_count = edge_indicator.len();
                let flag = edge_indicator.get_mut(edge).ok_or_else(|| {
                    invariant_violation!(
                        "tree {} takes edge {} outside the {} edges of the forest",
                        tree,
                        edge,
                        edge_count
                    )
                })?;
                *flag = true;
            }
            tree_outputs.push(path.value());
        }

        let mut contributions = tree_outputs.clone();
        contributions.push(self.bias());
        Ok(ForestOutput {
            output: sequential_sum(&contributions),
            tree_outputs,
            edge_indicator,
        })
    }

    /// Computes every row of `inputs` on a thread pool sized by
    /// `config.num_threads`.
    pub fn compute_batch(&self, inputs: ArrayView2<'_, Real>, config: &Config) -> Result<Vec<ForestOutput>> {
        let num_threads = config.effective_num_threads();
        debug!(
            "Evaluating {} rows on {} threads",
            inputs.nrows(),
            num_threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        pool.install(|| {
            inputs
                .axis_iter(Axis(0))
                .into_par_iter()
                .map(|row| self.compute(&row.to_vec()))
                .collect()
        })
    }

    /// Aggregate predictions for every row of `inputs`.
    pub fn predict_batch(&self, inputs: ArrayView2<'_, Real>, config: &Config) -> Result<Array1<Real>> {
        let outputs = self.compute_batch(inputs, config)?;
        Ok(outputs.iter().map(|output| output.output).collect())
    }
}
