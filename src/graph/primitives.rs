//! Elementary operations.
//!
//! These are the only nodes left in a fully refined model. Each is a pure
//! function of its inputs.

use crate::core::error::{ForestError, Result};
use crate::core::types::Real;
use crate::graph::node::{ComputeContext, InputPort, Node, OutputPort};
use crate::graph::port::{NodeId, PortElements, PortType, Value};
use crate::graph::transformer::ModelTransformer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Left-to-right sum starting from zero. Shared by [`SumNode`] and direct
/// evaluation so that both accumulate in the same order.
pub fn sequential_sum(values: &[Real]) -> Real {
    values.iter().fold(0.0, |acc, value| acc + value)
}

/// Left-to-right dot product starting from zero.
pub fn dot_product(lhs: &[Real], rhs: &[Real]) -> Real {
    lhs.iter()
        .zip(rhs)
        .fold(0.0, |acc, (a, b)| acc + a * b)
}

/// Source of the model's input vector.
#[derive(Debug, Clone)]
pub struct InputNode {
    size: usize,
}

impl InputNode {
    /// An input of `size` reals.
    pub fn new(size: usize) -> Self {
        InputNode { size }
    }

    /// Number of input elements.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Node for InputNode {
    fn type_name(&self) -> &'static str {
        "Input"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![OutputPort::new("output", PortType::Real, self.size)]
    }

    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        let input = context.input();
        if input.len() != self.size {
            return Err(ForestError::dimension_mismatch(
                format!("{} input features", self.size),
                input.len().to_string(),
            ));
        }
        Ok(vec![input.iter().map(|&x| Value::Real(x)).collect()])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let new_id = transformer.add_node(self.clone())?;
        transformer.map_all_outputs(id, new_id)
    }
}

/// Injects fixed values.
#[derive(Debug, Clone)]
pub struct ConstantNode {
    port_type: PortType,
    values: Vec<Value>,
}

impl ConstantNode {
    /// Real constants.
    pub fn real(values: Vec<Real>) -> Self {
        ConstantNode {
            port_type: PortType::Real,
            values: values.into_iter().map(Value::Real).collect(),
        }
    }

    /// Boolean constants.
    pub fn boolean(values: Vec<bool>) -> Self {
        ConstantNode {
            port_type: PortType::Boolean,
            values: values.into_iter().map(Value::Boolean).collect(),
        }
    }

    /// The injected values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl Node for ConstantNode {
    fn type_name(&self) -> &'static str {
        "Constant"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![OutputPort::new("output", self.port_type, self.values.len())]
    }

    fn compute(&self, _context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        Ok(vec![self.values.clone()])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let new_id = transformer.add_node(self.clone())?;
        transformer.map_all_outputs(id, new_id)
    }
}

/// N-ary sum of real elements. The sum of no elements is zero.
#[derive(Debug, Clone)]
pub struct SumNode {
    input: PortElements,
}

impl SumNode {
    /// Sums every element of `input`.
    pub fn new(input: PortElements) -> Self {
        SumNode { input }
    }
}

impl Node for SumNode {
    fn type_name(&self) -> &'static str {
        "Sum"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        vec![InputPort::new("input", &self.input, PortType::Real)]
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![OutputPort::new("output", PortType::Real, 1)]
    }

    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        let values = context.reals(&self.input)?;
        Ok(vec![vec![Value::Real(sequential_sum(&values))]])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let input = transformer.transform_port_elements(&self.input)?;
        let new_id = transformer.add_node(SumNode::new(input))?;
        transformer.map_all_outputs(id, new_id)
    }
}

/// Element-wise boolean negation.
#[derive(Debug, Clone)]
pub struct NotNode {
    input: PortElements,
}

impl NotNode {
    /// Negates every element of `input`.
    pub fn new(input: PortElements) -> Self {
        NotNode { input }
    }
}

impl Node for NotNode {
    fn type_name(&self) -> &'static str {
        "Not"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        vec![InputPort::new("input", &self.input, PortType::Boolean)]
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![OutputPort::new("output", PortType::Boolean, self.input.len())]
    }

    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        let values = context.bools(&self.input)?;
        Ok(vec![values.into_iter().map(|b| Value::Boolean(!b)).collect()])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let input = transformer.transform_port_elements(&self.input)?;
        let new_id = transformer.add_node(NotNode::new(input))?;
        transformer.map_all_outputs(id, new_id)
    }
}

/// Chooses between two real inputs by a boolean key: `input0` when the key is
/// false, `input1` when it is true.
#[derive(Debug, Clone)]
pub struct SelectNode {
    input0: PortElements,
    input1: PortElements,
    selector: PortElements,
}

impl SelectNode {
    /// Selects `input1` if `selector` is true, else `input0`.
    pub fn new(input0: PortElements, input1: PortElements, selector: PortElements) -> Self {
        SelectNode {
            input0,
            input1,
            selector,
        }
    }
}

impl Node for SelectNode {
    fn type_name(&self) -> &'static str {
        "Select"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        vec![
            InputPort::new("input0", &self.input0, PortType::Real),
            InputPort::new("input1", &self.input1, PortType::Real),
            InputPort::new("selector", &self.selector, PortType::Boolean),
        ]
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![OutputPort::new("output", PortType::Real, self.input0.len())]
    }

    fn validate(&self) -> Result<()> {
        if self.input0.len() != self.input1.len() {
            return Err(ForestError::dimension_mismatch(
                format!("{} elements in input1", self.input0.len()),
                self.input1.len().to_string(),
            ));
        }
        if self.selector.len() != 1 {
            return Err(ForestError::dimension_mismatch(
                "1 selector element",
                self.selector.len().to_string(),
            ));
        }
        Ok(())
    }

    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        let chosen = if context.selector(&self.selector)? {
            &self.input1
        } else {
            &self.input0
        };
        Ok(vec![context.values(chosen)?])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let node = SelectNode::new(
            transformer.transform_port_elements(&self.input0)?,
            transformer.transform_port_elements(&self.input1)?,
            transformer.transform_port_elements(&self.selector)?,
        );
        let new_id = transformer.add_node(node)?;
        transformer.map_all_outputs(id, new_id)
    }
}

/// Picks one boolean out of `elements` using a boolean key as the index
/// (false selects element 0, true selects element 1).
#[derive(Debug, Clone)]
pub struct MultiplexerNode {
    elements: PortElements,
    selector: PortElements,
}

impl MultiplexerNode {
    /// Outputs `elements[selector as usize]`.
    pub fn new(elements: PortElements, selector: PortElements) -> Self {
        MultiplexerNode { elements, selector }
    }
}

impl Node for MultiplexerNode {
    fn type_name(&self) -> &'static str {
        "Multiplexer"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        vec![
            InputPort::new("elements", &self.elements, PortType::Boolean),
            InputPort::new("selector", &self.selector, PortType::Boolean),
        ]
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![OutputPort::new("output", PortType::Boolean, 1)]
    }

    fn validate(&self) -> Result<()> {
        if self.elements.len() != 2 {
            return Err(ForestError::dimension_mismatch(
                "2 multiplexed elements for a boolean key",
                self.elements.len().to_string(),
            ));
        }
        if self.selector.len() != 1 {
            return Err(ForestError::dimension_mismatch(
                "1 selector element",
                self.selector.len().to_string(),
            ));
        }
        Ok(())
    }

    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        let index = usize::from(context.selector(&self.selector)?);
        let chosen = self.elements.element(index)?;
        Ok(vec![context.values(&chosen)?])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let node = MultiplexerNode::new(
            transformer.transform_port_elements(&self.elements)?,
            transformer.transform_port_elements(&self.selector)?,
        );
        let new_id = transformer.add_node(node)?;
        transformer.map_all_outputs(id, new_id)
    }
}

/// Dot product of two equally sized real inputs.
#[derive(Debug, Clone)]
pub struct DotProductNode {
    input1: PortElements,
    input2: PortElements,
}

impl DotProductNode {
    /// Computes `input1 · input2`.
    pub fn new(input1: PortElements, input2: PortElements) -> Self {
        DotProductNode { input1, input2 }
    }
}

impl Node for DotProductNode {
    fn type_name(&self) -> &'static str {
        "DotProduct"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        vec![
            InputPort::new("input1", &self.input1, PortType::Real),
            InputPort::new("input2", &self.input2, PortType::Real),
        ]
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![OutputPort::new("output", PortType::Real, 1)]
    }

    fn validate(&self) -> Result<()> {
        if self.input1.len() != self.input2.len() {
            return Err(ForestError::dimension_mismatch(
                format!("{} elements in input2", self.input1.len()),
                self.input2.len().to_string(),
            ));
        }
        Ok(())
    }

    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        let lhs = context.reals(&self.input1)?;
        let rhs = context.reals(&self.input2)?;
        Ok(vec![vec![Value::Real(dot_product(&lhs, &rhs))]])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let node = DotProductNode::new(
            transformer.transform_port_elements(&self.input1)?,
            transformer.transform_port_elements(&self.input2)?,
        );
        let new_id = transformer.add_node(node)?;
        transformer.map_all_outputs(id, new_id)
    }
}

/// Comparison applied by [`CompareNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// `lhs > rhs`
    Greater,
    /// `lhs >= rhs`
    GreaterOrEqual,
    /// `lhs < rhs`
    Less,
    /// `lhs <= rhs`
    LessOrEqual,
    /// `lhs == rhs`
    Equal,
    /// `lhs != rhs`
    NotEqual,
}

impl ComparisonOp {
    /// Applies the comparison.
    pub fn apply(self, lhs: Real, rhs: Real) -> bool {
        match self {
            ComparisonOp::Greater => lhs > rhs,
            ComparisonOp::GreaterOrEqual => lhs >= rhs,
            ComparisonOp::Less => lhs < rhs,
            ComparisonOp::LessOrEqual => lhs <= rhs,
            ComparisonOp::Equal => lhs == rhs,
            ComparisonOp::NotEqual => lhs != rhs,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
        };
        write!(f, "{}", symbol)
    }
}

/// Element-wise comparison of two equally sized real inputs.
#[derive(Debug, Clone)]
pub struct CompareNode {
    op: ComparisonOp,
    lhs: PortElements,
    rhs: PortElements,
}

impl CompareNode {
    /// Computes `lhs[i] op rhs[i]` for every `i`.
    pub fn new(op: ComparisonOp, lhs: PortElements, rhs: PortElements) -> Self {
        CompareNode { op, lhs, rhs }
    }
}

impl Node for CompareNode {
    fn type_name(&self) -> &'static str {
        "Compare"
    }

    fn inputs(&self) -> Vec<InputPort<'_>> {
        vec![
            InputPort::new("lhs", &self.lhs, PortType::Real),
            InputPort::new("rhs", &self.rhs, PortType::Real),
        ]
    }

    fn outputs(&self) -> Vec<OutputPort> {
        vec![OutputPort::new("output", PortType::Boolean, self.lhs.len())]
    }

    fn validate(&self) -> Result<()> {
        if self.lhs.len() != self.rhs.len() {
            return Err(ForestError::dimension_mismatch(
                format!("{} elements in rhs", self.lhs.len()),
                self.rhs.len().to_string(),
            ));
        }
        Ok(())
    }

    fn compute(&self, context: &ComputeContext<'_>) -> Result<Vec<Vec<Value>>> {
        let lhs = context.reals(&self.lhs)?;
        let rhs = context.reals(&self.rhs)?;
        Ok(vec![lhs
            .iter()
            .zip(&rhs)
            .map(|(&a, &b)| Value::Boolean(self.op.apply(a, b)))
            .collect()])
    }

    fn copy(&self, id: NodeId, transformer: &mut ModelTransformer) -> Result<()> {
        let node = CompareNode::new(
            self.op,
            transformer.transform_port_elements(&self.lhs)?,
            transformer.transform_port_elements(&self.rhs)?,
        );
        let new_id = transformer.add_node(node)?;
        transformer.map_all_outputs(id, new_id)
    }
}
