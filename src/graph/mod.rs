//! Computation graphs of elementary nodes.
//!
//! - [`port`]: port types, values and element references
//! - [`node`]: the [`Node`] trait and its evaluation context
//! - [`model`]: the [`Model`] arena and its evaluation
//! - [`primitives`]: sum, not, select, multiplex, constant and friends
//! - [`transformer`]: copying and refining models

pub mod model;
pub mod node;
pub mod port;
pub mod primitives;
pub mod transformer;

pub use model::{Evaluation, Model};
pub use node::{ComputeContext, InputPort, Node, OutputPort};
pub use port::{NodeId, OutputRef, PortElement, PortElements, PortType, Value};
pub use primitives::{
    ComparisonOp, CompareNode, ConstantNode, DotProductNode, InputNode, MultiplexerNode, NotNode,
    SelectNode, SumNode,
};
pub use transformer::{ModelTransformer, TransformContext};
