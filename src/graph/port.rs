//! Port types and element references.
//!
//! A node exposes one or more typed output ports, each a fixed-size vector of
//! values. Other nodes consume arbitrary selections of those values through
//! [`PortElements`], an ordered list of `(node, port, index)` references.

use crate::core::error::{ForestError, Result};
use crate::core::types::Real;
use std::fmt;

/// Identifier of a node inside a [`Model`](crate::graph::Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element type carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    /// Floating-point values
    Real,
    /// Boolean values
    Boolean,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortType::Real => write!(f, "real"),
            PortType::Boolean => write!(f, "boolean"),
        }
    }
}

/// A single computed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// A floating-point value
    Real(Real),
    /// A boolean value
    Boolean(bool),
}

impl Value {
    /// Type of this value.
    pub fn port_type(&self) -> PortType {
        match self {
            Value::Real(_) => PortType::Real,
            Value::Boolean(_) => PortType::Boolean,
        }
    }

    /// The contained real, or a `StructuralMismatch` for booleans.
    pub fn as_real(&self) -> Result<Real> {
        match self {
            Value::Real(value) => Ok(*value),
            Value::Boolean(_) => Err(ForestError::structural_mismatch(
                "expected a real value, found a boolean",
            )),
        }
    }

    /// The contained boolean, or a `StructuralMismatch` for reals.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(value) => Ok(*value),
            Value::Real(_) => Err(ForestError::structural_mismatch(
                "expected a boolean value, found a real",
            )),
        }
    }
}

/// Reference to a whole output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputRef {
    /// Producing node
    pub node: NodeId,
    /// Output port of the producing node
    pub port: usize,
}

impl OutputRef {
    /// Reference output `port` of `node`.
    pub fn new(node: NodeId, port: usize) -> Self {
        OutputRef { node, port }
    }
}

/// Reference to one element of an output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortElement {
    /// Port the element belongs to
    pub output: OutputRef,
    /// Position within that port
    pub index: usize,
}

/// An ordered selection of output elements, possibly spanning several ports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortElements {
    elements: Vec<PortElement>,
}

impl PortElements {
    /// An empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// All `size` elements of an output port.
    pub fn from_output(output: OutputRef, size: usize) -> Self {
        PortElements {
            elements: (0..size).map(|index| PortElement { output, index }).collect(),
        }
    }

    /// A single element of an output port.
    pub fn single(output: OutputRef, index: usize) -> Self {
        PortElements {
            elements: vec![PortElement { output, index }],
        }
    }

    /// Concatenation of several selections, in order.
    pub fn concat<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a PortElements>,
    {
        let mut result = PortElements::new();
        for part in parts {
            result.append(part);
        }
        result
    }

    /// Appends the elements of `other`.
    pub fn append(&mut self, other: &PortElements) {
        self.elements.extend_from_slice(&other.elements);
    }

    /// Appends one element.
    pub fn push(&mut self, element: PortElement) {
        self.elements.push(element);
    }

    /// Number of selected elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if no element is selected.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The selected elements.
    pub fn elements(&self) -> &[PortElement] {
        &self.elements
    }

    /// Iterates over the selected elements.
    pub fn iter(&self) -> std::slice::Iter<'_, PortElement> {
        self.elements.iter()
    }

    /// Sub-selection holding only the element at `index`.
    pub fn element(&self, index: usize) -> Result<PortElements> {
        self.elements
            .get(index)
            .map(|element| PortElements {
                elements: vec![*element],
            })
            .ok_or_else(|| ForestError::index_out_of_bounds(index, self.elements.len()))
    }

    /// Sub-selection of `len` elements starting at `start`.
    pub fn range(&self, start: usize, len: usize) -> Result<PortElements> {
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.elements.len())
            .ok_or_else(|| ForestError::index_out_of_bounds(start.saturating_add(len), self.elements.len()))?;
        Ok(PortElements {
            elements: self.elements[start..end].to_vec(),
        })
    }
}

impl<'a> IntoIterator for &'a PortElements {
    type Item = &'a PortElement;
    type IntoIter = std::slice::Iter<'a, PortElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
