//! The model arena.
//!
//! A [`Model`] owns its nodes in a flat vector addressed by [`NodeId`]. A node
//! may only reference outputs of nodes added before it, so insertion order is
//! a topological order and evaluation is a single forward sweep.

use crate::core::error::{ForestError, Result};
use crate::core::types::Real;
use crate::graph::node::{ComputeContext, Node};
use crate::graph::port::{NodeId, OutputRef, PortElements, PortType, Value};
use crate::invalid_argument;
use log::trace;
use std::collections::BTreeMap;

/// A computation graph of [`Node`]s with named outputs.
#[derive(Debug, Default)]
pub struct Model {
    nodes: Vec<Box<dyn Node>>,
    outputs: BTreeMap<String, PortElements>,
}

impl Model {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node after checking every element it reads.
    ///
    /// Each referenced element must belong to an existing node, name a port
    /// that node declares, lie inside that port, and have the type the input
    /// port expects. Node-specific shape checks run afterwards.
    pub fn add_node<N: Node + 'static>(&mut self, node: N) -> Result<NodeId> {
        for input in node.inputs() {
            for element in input.elements {
                let producer = self.node(element.output.node)?;
                let port = producer
                    .outputs()
                    .into_iter()
                    .nth(element.output.port)
                    .ok_or_else(|| {
                        ForestError::structural_mismatch(format!(
                            "{} has no output port {}",
                            element.output.node, element.output.port
                        ))
                    })?;
                if element.index >= port.size {
                    return Err(ForestError::index_out_of_bounds(element.index, port.size));
                }
                if port.port_type != input.port_type {
                    return Err(ForestError::structural_mismatch(format!(
                        "{} input '{}' expects {} elements, {}:{} produces {}",
                        node.type_name(),
                        input.name,
                        input.port_type,
                        element.output.node,
                        port.name,
                        port.port_type
                    )));
                }
            }
        }
        node.validate()?;

        let id = NodeId(self.nodes.len());
        trace!("added {} node {}", node.type_name(), id);
        self.nodes.push(Box::new(node));
        Ok(id)
    }

    /// The node with the given id.
    pub fn node(&self, id: NodeId) -> Result<&dyn Node> {
        self.nodes
            .get(id.0)
            .map(|node| node.as_ref())
            .ok_or_else(|| ForestError::index_out_of_bounds(id.0, self.nodes.len()))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the model has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over the nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &dyn Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), node.as_ref()))
    }

    /// Number of nodes whose type name is `type_name`.
    pub fn count_nodes(&self, type_name: &str) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.type_name() == type_name)
            .count()
    }

    /// All elements of output `port` of node `id`.
    pub fn output_elements(&self, id: NodeId, port: usize) -> Result<PortElements> {
        let outputs = self.node(id)?.outputs();
        let declared = outputs
            .get(port)
            .ok_or_else(|| ForestError::index_out_of_bounds(port, outputs.len()))?;
        Ok(PortElements::from_output(OutputRef::new(id, port), declared.size))
    }

    /// Type of output `port` of node `id`.
    pub fn output_type(&self, id: NodeId, port: usize) -> Result<PortType> {
        let outputs = self.node(id)?.outputs();
        outputs
            .get(port)
            .map(|declared| declared.port_type)
            .ok_or_else(|| ForestError::index_out_of_bounds(port, outputs.len()))
    }

    /// Registers (or replaces) a named model output.
    pub fn add_output<S: Into<String>>(&mut self, name: S, elements: PortElements) -> Result<()> {
        for element in &elements {
            let size = self
                .node(element.output.node)?
                .outputs()
                .get(element.output.port)
                .map(|declared| declared.size)
                .unwrap_or(0);
            if element.index >= size {
                return Err(ForestError::index_out_of_bounds(element.index, size));
            }
        }
        self.outputs.insert(name.into(), elements);
        Ok(())
    }

    /// Elements of a named model output.
    pub fn output(&self, name: &str) -> Option<&PortElements> {
        self.outputs.get(name)
    }

    /// All named outputs, ordered by name.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &PortElements)> + '_ {
        self.outputs
            .iter()
            .map(|(name, elements)| (name.as_str(), elements))
    }

    /// Evaluates every node on one input vector.
    pub fn evaluate(&self, input: &[Real]) -> Result<Evaluation> {
        let mut values: Vec<Vec<Vec<Value>>> = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let computed = node.compute(&ComputeContext::new(input, &values))?;
            let declared = node.outputs();
            if computed.len() != declared.len()
                || computed
                    .iter()
                    .zip(&declared)
                    .any(|(port, decl)| port.len() != decl.size)
            {
                return Err(ForestError::internal(format!(
                    "{} node #{} produced outputs that do not match its declaration",
                    node.type_name(),
                    i
                )));
            }
            values.push(computed);
        }
        Ok(Evaluation { values })
    }

    /// Evaluates the model and reads back a named output.
    pub fn compute_output(&self, input: &[Real], name: &str) -> Result<Vec<Value>> {
        let elements = self
            .output(name)
            .ok_or_else(|| invalid_argument!("model has no output '{}'", name))?;
        self.evaluate(input)?.values(elements)
    }
}

/// All node outputs computed by one [`Model::evaluate`] call.
#[derive(Debug, Clone)]
pub struct Evaluation {
    values: Vec<Vec<Vec<Value>>>,
}

impl Evaluation {
    /// Values referenced by `elements`.
    pub fn values(&self, elements: &PortElements) -> Result<Vec<Value>> {
        ComputeContext::new(&[], &self.values).values(elements)
    }

    /// Real values referenced by `elements`.
    pub fn reals(&self, elements: &PortElements) -> Result<Vec<Real>> {
        ComputeContext::new(&[], &self.values).reals(elements)
    }

    /// Boolean values referenced by `elements`.
    pub fn bools(&self, elements: &PortElements) -> Result<Vec<bool>> {
        ComputeContext::new(&[], &self.values).bools(elements)
    }
}
