//! The node abstraction shared by primitives and composite nodes.

use crate::core::error::{ForestError, Result};
use crate::core::types::Real;
use crate::graph::port::{NodeId, PortElements, PortType, Value};
use crate::graph::transformer::ModelTransformer;
use std::fmt::Debug;

/// Declaration of a typed input.
#[derive(Debug, Clone, Copy)]
pub struct InputPort<'a> {
    /// Port name, used in error messages
    pub name: &'static str,
    /// Elements the input reads
    pub elements: &'a PortElements,
    /// Type every element must have
    pub port_type: PortType,
}

impl<'a> InputPort<'a> {
    /// Declares an input.
    pub fn new(name: &'static str, elements: &'a PortElements, port_type: PortType) -> Self {
        InputPort {
            name,
            elements,
            port_type,
        }
    }
}

/// Declaration of a typed, fixed-size output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPort {
    /// Port name
    pub name: &'static str,
    /// Element type
    pub port_type: PortType,
    /// Number of elements
    pub size: usize,
}

impl OutputPort {
    /// Declares an output.
    pub fn new(name: &'static str, port_type: PortType, size: usize) -> Self {
        OutputPort {
            name,
            port_type,
            size,
        }
    }
}

/// Values computed so far during one evaluation of a model.
#[derive(Debug)]
pub struct ComputeContext<'a> {
    input: &'a [Real],
    outputs: &'a [Vec<Vec<Value>>],
}

impl<'a> ComputeContext<'a> {
    pub(crate) fn new(input: &'a [Real], outputs: &'a [Vec<Vec<Value>>]) -> Self {
        ComputeContext { input, outputs }
    }

    /// The model's input vector.
    pub fn input(&self) -> &'a [Real] {
        self.input
    }

    /// Gathers the values referenced by `elements`.
    pub fn values(&self, elements: &PortElements) -> Result<Vec<Value>> {
        elements
            .iter()
            .map(|element| {
                let node = element.output.node.0;
                self.outputs
                    .get(node)
                    .and_then(|ports| ports.get(element.output.port))
                    .and_then(|values| values.get(element.index))
                    .copied()
                    .ok_or_else(|| {
                        ForestError::internal(format!(
                            "element {}:{}[{}] read before it was computed",
                            element.output.node, element.output.port, element.index
                        ))
                    })
            })
            .collect()
    }

    /// Gathers real values.
    pub fn reals(&self, elements: &PortElements) -> Result<Vec<Real>> {
        self.values(elements)?.iter().map(Value::as_real).collect()
    }

    /// Gathers boolean values.
    pub fn bools(&self, elements: &PortElements) -> Result<Vec<bool>> {
        self.values(elements)?.iter().map(Value::as_bool).collect()
    }

    /// Reads a single boolean, as used by selector inputs.
    pub fn selector(&self, elements: &PortElements) -> Result<bool> {
        match self.bools(elements)?.as_slice() {
            [value] => Ok(*value),
            other => Err(ForestError::dimension_mismatch(
                "1 selector element",
                other.len().to_string(),
            )),
        }
    }
}

/// A node of a computation graph.
///
/// Nodes are immutable once added to a model. Every node can `copy` itself
/// into a new model; composite nodes additionally `refine` themselves into
/// an equivalent arrangement of simpler nodes.
pub trait Node: Debug + Send + Sync {
    /// Short name of the node type.
    fn type_name(&self) -> &'static str;

    /// Typed inputs read by this node.
    fn inputs(&self) -> Vec<InputPort<'_>>;

    /// Typed outputs produced by this node.
    fn outputs(&self) -> Vec<OutputPort>;

    /// Checks node-specific shape constraints. Called when the node is added
    /// to a model, after input references have been resolved.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Computes every output port from the already-computed upstream values.
    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>>;

    /// Adds an equivalent node to the transformer's model and maps this
    /// node's outputs (`id` in the old model) onto it.
    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()>;

    /// Replaces this node with simpler nodes. Returns `true` if anything
    /// other than a plain copy was emitted.
    fn refine(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<bool> {
        self.copy(id, transformer)?;
        Ok(false)
    }
}
