//! Forest structural model.
//!
//! All trees of a forest share one flat array of interior nodes. Leaves are
//! implicit: an edge either ends at a leaf or points at another interior
//! node. Interior nodes are indexed so that a child always comes after its
//! parent, and the two edges of node `i` occupy edge indices `2i` and `2i+1`
//! of a flat edge-index space shared by every tree.

use crate::core::constants::EDGES_PER_INTERIOR_NODE;
use crate::core::error::{ForestError, Result};
use crate::core::types::{EdgeIndex, FeatureIndex, NodeIndex, Real, TreeIndex};
use crate::forest::predictor::{EdgePredictor, SplitRule};
use crate::{ensure, invalid_argument, invariant_violation};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an edge leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeTarget {
    /// An implicit leaf
    Leaf,
    /// Another interior node
    Interior(NodeIndex),
}

/// An outgoing edge of an interior node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<P> {
    predictor: P,
    target: EdgeTarget,
}

impl<P> Edge<P> {
    /// An edge with the given predictor and target.
    pub fn new(predictor: P, target: EdgeTarget) -> Self {
        Edge { predictor, target }
    }

    /// An edge ending at a leaf.
    pub fn leaf(predictor: P) -> Self {
        Edge::new(predictor, EdgeTarget::Leaf)
    }

    /// Contribution added when the edge is taken.
    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Where the edge leads.
    pub fn target(&self) -> EdgeTarget {
        self.target
    }

    /// True if the edge points at an interior node.
    pub fn is_target_interior(&self) -> bool {
        matches!(self.target, EdgeTarget::Interior(_))
    }

    /// Index of the target interior node, if any.
    pub fn target_node_index(&self) -> Option<NodeIndex> {
        match self.target {
            EdgeTarget::Leaf => None,
            EdgeTarget::Interior(index) => Some(index),
        }
    }
}

/// A split node: a rule choosing between two outgoing edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteriorNode<S, P> {
    split_rule: S,
    outgoing_edges: [Edge<P>; 2],
    first_edge_index: EdgeIndex,
}

impl<S, P> InteriorNode<S, P> {
    /// A node whose edges occupy `first_edge_index` and `first_edge_index + 1`.
    pub fn new(split_rule: S, outgoing_edges: [Edge<P>; 2], first_edge_index: EdgeIndex) -> Self {
        InteriorNode {
            split_rule,
            outgoing_edges,
            first_edge_index,
        }
    }

    /// The decision taken at this node. `false` follows edge 0, `true` edge 1.
    pub fn split_rule(&self) -> &S {
        &self.split_rule
    }

    /// Both outgoing edges.
    pub fn outgoing_edges(&self) -> &[Edge<P>; 2] {
        &self.outgoing_edges
    }

    /// Flat index of edge 0.
    pub fn first_edge_index(&self) -> EdgeIndex {
        self.first_edge_index
    }
}

/// Node that a [`SplitAction`] replaces with a new interior node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplittableNode {
    /// Start a new tree
    Root,
    /// Replace the leaf at the end of an existing edge
    Child {
        /// Interior node owning the edge
        parent: NodeIndex,
        /// Edge position (0 or 1)
        position: usize,
    },
}

/// Everything needed to add one interior node to a forest.
#[derive(Debug, Clone)]
pub struct SplitAction<S, P> {
    /// Where the node goes
    pub target: SplittableNode,
    /// Its split rule
    pub split_rule: S,
    /// Predictors of its two new leaf edges
    pub edge_predictors: [P; 2],
}

impl<S, P> SplitAction<S, P> {
    /// Starts a new tree.
    pub fn root(split_rule: S, edge_predictors: [P; 2]) -> Self {
        SplitAction {
            target: SplittableNode::Root,
            split_rule,
            edge_predictors,
        }
    }

    /// Splits the leaf at edge `position` of `parent`.
    pub fn child(parent: NodeIndex, position: usize, split_rule: S, edge_predictors: [P; 2]) -> Self {
        SplitAction {
            target: SplittableNode::Child { parent, position },
            split_rule,
            edge_predictors,
        }
    }
}

/// An ensemble of decision trees over a shared interior-node array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest<S, P> {
    interior_nodes: Vec<InteriorNode<S, P>>,
    roots: Vec<NodeIndex>,
    bias: Real,
}

impl<S, P> Default for Forest<S, P> {
    fn default() -> Self {
        Forest {
            interior_nodes: Vec::new(),
            roots: Vec::new(),
            bias: 0.0,
        }
    }
}

impl<S, P> Forest<S, P> {
    /// An empty forest with zero bias.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a forest from raw parts and checks every structural invariant.
    pub fn from_parts(
        interior_nodes: Vec<InteriorNode<S, P>>,
        roots: Vec<NodeIndex>,
        bias: Real,
    ) -> Result<Self> {
        let forest = Forest {
            interior_nodes,
            roots,
            bias,
        };
        forest.validate()?;
        Ok(forest)
    }

    /// Adds an interior node, either as a new tree root or in place of a leaf
    /// edge. Returns the index of the new node.
    pub fn split(&mut self, action: SplitAction<S, P>) -> Result<NodeIndex> {
        let index = self.interior_nodes.len();
        match action.target {
            SplittableNode::Root => self.roots.push(index),
            SplittableNode::Child { parent, position } => {
                let node_count = self.interior_nodes.len();
                let parent_node = self
                    .interior_nodes
                    .get_mut(parent)
                    .ok_or_else(|| ForestError::index_out_of_bounds(parent, node_count))?;
                let edge = parent_node
                    .outgoing_edges
                    .get_mut(position)
                    .ok_or_else(|| {
                        invalid_argument!(
                            "edge position {} of node {} does not exist",
                            position,
                            parent
                        )
                    })?;
                ensure!(
                    !edge.is_target_interior(),
                    invalid_argument!("edge {} of node {} has already been split", position, parent)
                );
                edge.target = EdgeTarget::Interior(index);
            }
        }

        let [p0, p1] = action.edge_predictors;
        self.interior_nodes.push(InteriorNode::new(
            action.split_rule,
            [Edge::leaf(p0), Edge::leaf(p1)],
            index * EDGES_PER_INTERIOR_NODE,
        ));
        Ok(index)
    }

    /// Checks the invariants the lowering pass relies on.
    ///
    /// Roots must be in range and distinct. Every interior target must lie
    /// after its parent and inside the node array, every non-root node must
    /// have exactly one parent edge, and node `i` must own edges `2i, 2i+1`.
    pub fn validate(&self) -> Result<()> {
        let count = self.interior_nodes.len();
        let mut has_parent = vec![false; count];
        let mut is_root = vec![false; count];

        for &root in &self.roots {
            if root >= count {
                return Err(ForestError::structural_mismatch(format!(
                    "root index {} is outside the {} interior nodes",
                    root, count
                )));
            }
            if is_root[root] {
                return Err(ForestError::structural_mismatch(format!(
                    "node {} is the root of more than one tree",
                    root
                )));
            }
            is_root[root] = true;
        }

        for (index, node) in self.interior_nodes.iter().enumerate() {
            if node.first_edge_index != index * EDGES_PER_INTERIOR_NODE {
                return Err(ForestError::structural_mismatch(format!(
                    "node {} has first edge index {}, expected {}",
                    index,
                    node.first_edge_index,
                    index * EDGES_PER_INTERIOR_NODE
                )));
            }

            for child in node.outgoing_edges.iter().filter_map(Edge::target_node_index) {
                ensure!(
                    child < count,
                    invariant_violation!(
                        "node {} points at node {} outside the {} interior nodes",
                        index,
                        child,
                        count
                    )
                );
                ensure!(
                    child > index,
                    invariant_violation!(
                        "node {} points at node {}, children must have greater indices",
                        index,
                        child
                    )
                );
                ensure!(
                    !is_root[child],
                    invariant_violation!("node {} points at root node {}", index, child)
                );
                ensure!(
                    !has_parent[child],
                    invariant_violation!("node {} has more than one parent", child)
                );
                has_parent[child] = true;
            }
        }

        if let Some(orphan) = (0..count).find(|&i| !is_root[i] && !has_parent[i]) {
            warn!("Forest validation failed: node {} is unreachable", orphan);
            return Err(ForestError::structural_mismatch(format!(
                "node {} is neither a root nor the target of an edge",
                orphan
            )));
        }

        Ok(())
    }

    /// Number of trees.
    pub fn num_trees(&self) -> usize {
        self.roots.len()
    }

    /// Number of interior nodes across all trees.
    pub fn num_interior_nodes(&self) -> usize {
        self.interior_nodes.len()
    }

    /// Number of edges across all trees.
    pub fn num_edges(&self) -> usize {
        self.interior_nodes.len() * EDGES_PER_INTERIOR_NODE
    }

    /// The interior nodes, in index order.
    pub fn interior_nodes(&self) -> &[InteriorNode<S, P>] {
        &self.interior_nodes
    }

    /// Interior node `index`.
    pub fn interior_node(&self, index: NodeIndex) -> Result<&InteriorNode<S, P>> {
        self.interior_nodes
            .get(index)
            .ok_or_else(|| ForestError::index_out_of_bounds(index, self.interior_nodes.len()))
    }

    /// Root node indices, one per tree.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Root node of tree `tree`.
    pub fn root_index(&self, tree: TreeIndex) -> Result<NodeIndex> {
        self.roots
            .get(tree)
            .copied()
            .ok_or_else(|| ForestError::index_out_of_bounds(tree, self.roots.len()))
    }

    /// True if `node` is the root of some tree.
    pub fn is_root(&self, node: NodeIndex) -> bool {
        self.roots.contains(&node)
    }

    /// Constant added to the sum of tree outputs.
    pub fn bias(&self) -> Real {
        self.bias
    }

    /// Adds `value` to the bias.
    pub fn add_to_bias(&mut self, value: Real) {
        self.bias += value;
    }
}

impl<S: SplitRule, P: EdgePredictor> Forest<S, P> {
    /// One past the highest feature index any rule or predictor reads.
    pub fn required_input_dimension(&self) -> usize {
        self.interior_nodes
            .iter()
            .flat_map(|node| {
                std::iter::once(node.split_rule.max_feature_index()).chain(
                    node.outgoing_edges
                        .iter()
                        .map(|edge| edge.predictor.max_feature_index()),
                )
            })
            .flatten()
            .map(|index: FeatureIndex| index + 1)
            .max()
            .unwrap_or(0)
    }
}

impl<S, P> Forest<S, P>
where
    S: Serialize + DeserializeOwned,
    P: Serialize + DeserializeOwned,
{
    /// Serializes the forest to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a forest from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let forest: Forest<S, P> = serde_json::from_str(json)?;
        forest.validate()?;
        Ok(forest)
    }
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Display for Forest<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Forest: {} trees, {} interior nodes, {} edges, bias {}",
            self.roots.len(),
            self.interior_nodes.len(),
            self.interior_nodes.len() * EDGES_PER_INTERIOR_NODE,
            self.bias
        )?;
        for (tree, root) in self.roots.iter().enumerate() {
            writeln!(f, "  tree {}: root {}", tree, root)?;
        }
        for (index, node) in self.interior_nodes.iter().enumerate() {
            writeln!(f, "  node {}: split {:?}", index, node.split_rule)?;
            for (position, edge) in node.outgoing_edges.iter().enumerate() {
                let target = match edge.target {
                    EdgeTarget::Leaf => "leaf".to_string(),
                    EdgeTarget::Interior(child) => format!("node {}", child),
                };
                writeln!(
                    f,
                    "    edge {} -> {}: {:?}",
                    node.first_edge_index + position,
                    target,
                    edge.predictor
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::predictor::{ConstantPredictor, SingleFeatureThreshold};

    type SimpleForest = Forest<SingleFeatureThreshold, ConstantPredictor>;

    fn leaves(a: Real, b: Real) -> [ConstantPredictor; 2] {
        [ConstantPredictor::new(a), ConstantPredictor::new(b)]
    }

    fn two_tree_forest() -> SimpleForest {
        let mut forest = SimpleForest::new();
        let root = forest
            .split(SplitAction::root(SingleFeatureThreshold::new(0, 0.5), leaves(1.0, 2.0)))
            .unwrap();
        forest
            .split(SplitAction::child(root, 1, SingleFeatureThreshold::new(1, 0.0), leaves(3.0, 4.0)))
            .unwrap();
        forest
            .split(SplitAction::root(SingleFeatureThreshold::new(2, 1.0), leaves(-1.0, 1.0)))
            .unwrap();
        forest.add_to_bias(0.25);
        forest
    }

    #[test]
    fn test_split_assigns_indices() {
        let forest = two_tree_forest();
        assert_eq!(forest.num_trees(), 2);
        assert_eq!(forest.num_interior_nodes(), 3);
        assert_eq!(forest.num_edges(), 6);
        assert_eq!(forest.roots(), &[0, 2]);
        assert_eq!(forest.root_index(1).unwrap(), 2);
        assert!(forest.root_index(2).is_err());
        assert!(forest.is_root(2));
        assert!(!forest.is_root(1));
        assert_eq!(forest.interior_node(1).unwrap().first_edge_index(), 2);
        assert_eq!(
            forest.interior_node(0).unwrap().outgoing_edges()[1].target(),
            EdgeTarget::Interior(1)
        );
        assert_eq!(forest.bias(), 0.25);
        assert_eq!(forest.required_input_dimension(), 3);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_split_rejects_bad_targets() {
        let mut forest = two_tree_forest();
        let again = SplitAction::child(0, 1, SingleFeatureThreshold::new(0, 0.0), leaves(0.0, 0.0));
        let err = forest.split(again).unwrap_err();
        assert!(matches!(err, ForestError::InvalidArgument { .. }));
        assert!(err.to_string().contains("edge 1 of node 0 has already been split"));

        let missing = SplitAction::child(9, 0, SingleFeatureThreshold::new(0, 0.0), leaves(0.0, 0.0));
        assert!(matches!(
            forest.split(missing).unwrap_err(),
            ForestError::IndexOutOfBounds { .. }
        ));

        let bad_position = SplitAction::child(0, 2, SingleFeatureThreshold::new(0, 0.0), leaves(0.0, 0.0));
        assert!(forest.split(bad_position).is_err());
        assert_eq!(forest.num_interior_nodes(), 3);
    }

    fn node(targets: [EdgeTarget; 2], index: NodeIndex) -> InteriorNode<SingleFeatureThreshold, ConstantPredictor> {
        InteriorNode::new(
            SingleFeatureThreshold::new(0, 0.0),
            [
                Edge::new(ConstantPredictor::new(0.0), targets[0]),
                Edge::new(ConstantPredictor::new(0.0), targets[1]),
            ],
            2 * index,
        )
    }

    #[test]
    fn test_from_parts_rejects_backward_child() {
        let nodes = vec![
            node([EdgeTarget::Leaf, EdgeTarget::Leaf], 0),
            node([EdgeTarget::Interior(0), EdgeTarget::Leaf], 1),
        ];
        let err = SimpleForest::from_parts(nodes, vec![1], 0.0).unwrap_err();
        assert!(matches!(err, ForestError::InvariantViolation { .. }));
    }

    #[test]
    fn test_from_parts_rejects_out_of_range_child() {
        let nodes = vec![node([EdgeTarget::Interior(5), EdgeTarget::Leaf], 0)];
        let err = SimpleForest::from_parts(nodes, vec![0], 0.0).unwrap_err();
        assert!(matches!(err, ForestError::InvariantViolation { .. }));
    }

    #[test]
    fn test_from_parts_rejects_shared_child() {
        let nodes = vec![
            node([EdgeTarget::Interior(1), EdgeTarget::Interior(1)], 0),
            node([EdgeTarget::Leaf, EdgeTarget::Leaf], 1),
        ];
        let err = SimpleForest::from_parts(nodes, vec![0], 0.0).unwrap_err();
        assert!(matches!(err, ForestError::InvariantViolation { .. }));
    }

    #[test]
    fn test_from_parts_rejects_orphan_and_bad_roots() {
        let nodes = vec![
            node([EdgeTarget::Leaf, EdgeTarget::Leaf], 0),
            node([EdgeTarget::Leaf, EdgeTarget::Leaf], 1),
        ];
        let err = SimpleForest::from_parts(nodes.clone(), vec![0], 0.0).unwrap_err();
        assert!(matches!(err, ForestError::StructuralMismatch { .. }));

        let err = SimpleForest::from_parts(nodes.clone(), vec![0, 7], 0.0).unwrap_err();
        assert!(matches!(err, ForestError::StructuralMismatch { .. }));

        let err = SimpleForest::from_parts(nodes, vec![0, 0], 0.0).unwrap_err();
        assert!(matches!(err, ForestError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_from_parts_rejects_misplaced_edges() {
        let mut misplaced = node([EdgeTarget::Leaf, EdgeTarget::Leaf], 0);
        misplaced.first_edge_index = 4;
        let err = SimpleForest::from_parts(vec![misplaced], vec![0], 0.0).unwrap_err();
        assert!(matches!(err, ForestError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_empty_forest_is_valid() {
        let forest = SimpleForest::from_parts(Vec::new(), Vec::new(), 1.5).unwrap();
        assert_eq!(forest.num_trees(), 0);
        assert_eq!(forest.num_edges(), 0);
        assert_eq!(forest.required_input_dimension(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let forest = two_tree_forest();
        let json = forest.to_json().unwrap();
        let back = SimpleForest::from_json(&json).unwrap();
        assert_eq!(back, forest);
    }

    #[test]
    fn test_from_json_validates() {
        let forest = two_tree_forest();
        let json = forest.to_json().unwrap().replace("\"Interior\": 1", "\"Interior\": 0");
        assert!(SimpleForest::from_json(&json).is_err());
    }

    #[test]
    fn test_display() {
        let text = two_tree_forest().to_string();
        assert!(text.starts_with("Forest: 2 trees, 3 interior nodes, 6 edges"));
        assert!(text.contains("edge 1 -> node 1"));
    }
}
