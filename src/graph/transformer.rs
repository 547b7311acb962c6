//! Model-to-model transformation.
//!
//! A [`ModelTransformer`] builds a new model by asking every node of an
//! existing model to either copy itself or refine itself into simpler nodes.
//! While doing so it keeps a map from old outputs to the elements that now
//! produce them, so later nodes can re-point their inputs with
//! [`ModelTransformer::transform_port_elements`].

use crate::config::Config;
use crate::core::constants::DEFAULT_MAX_REFINE_ITERATIONS;
use crate::core::error::{ForestError, Result};
use crate::graph::model::Model;
use crate::graph::node::Node;
use crate::graph::port::{NodeId, OutputRef, PortElements, PortType};
use log::{debug, info};
use std::collections::HashMap;

/// Settings visible to nodes while they are transformed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformContext {
    /// Upper bound on refinement passes
    pub max_refine_iterations: usize,
    /// Check forest invariants before lowering a forest node
    pub validate_forest: bool,
}

impl Default for TransformContext {
    fn default() -> Self {
        TransformContext {
            max_refine_iterations: DEFAULT_MAX_REFINE_ITERATIONS,
            validate_forest: true,
        }
    }
}

impl TransformContext {
    /// Context derived from a validated configuration.
    pub fn from_config(config: &Config) -> Self {
        TransformContext {
            max_refine_iterations: config.max_refine_iterations,
            validate_forest: config.validate_forest,
        }
    }
}

/// Builds a new model out of an existing one.
#[derive(Debug, Default)]
pub struct ModelTransformer {
    context: TransformContext,
    model: Model,
    output_map: HashMap<OutputRef, PortElements>,
}

impl ModelTransformer {
    /// A transformer with the given context.
    pub fn new(context: TransformContext) -> Self {
        ModelTransformer {
            context,
            model: Model::new(),
            output_map: HashMap::new(),
        }
    }

    /// The active transform context.
    pub fn context(&self) -> &TransformContext {
        &self.context
    }

    /// The model under construction.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Adds a node to the model under construction.
    pub fn add_node<N: Node + 'static>(&mut self, node: N) -> Result<NodeId> {
        self.model.add_node(node)
    }

    /// All elements of output `port` of a node in the model under construction.
    pub fn output_elements(&self, id: NodeId, port: usize) -> Result<PortElements> {
        self.model.output_elements(id, port)
    }

    /// Type of output `port` of a node in the model under construction.
    pub fn output_type(&self, id: NodeId, port: usize) -> Result<PortType> {
        self.model.output_type(id, port)
    }

    /// Translates elements of the old model into elements of the new one.
    pub fn transform_port_elements(&self, elements: &PortElements) -> Result<PortElements> {
        let mut result = PortElements::new();
        for element in elements {
            let mapped = self.output_map.get(&element.output).ok_or_else(|| {
                ForestError::internal(format!(
                    "output {}:{} has not been transformed yet",
                    element.output.node, element.output.port
                ))
            })?;
            result.append(&mapped.element(element.index)?);
        }
        Ok(result)
    }

    /// Records that old output `old` is now produced by `new`.
    pub fn map_node_output(&mut self, old: OutputRef, new: PortElements) {
        self.output_map.insert(old, new);
    }

    /// Maps every output port of old node `old` onto the same port of new
    /// node `new`.
    pub fn map_all_outputs(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        let ports = self.model.node(new)?.outputs().len();
        for port in 0..ports {
            let elements = self.model.output_elements(new, port)?;
            self.map_node_output(OutputRef::new(old, port), elements);
        }
        Ok(())
    }

    /// Returns a structurally identical copy of `model`.
    pub fn copy_model(&mut self, model: &Model) -> Result<Model> {
        let (copied, _) = self.transform(model, false)?;
        Ok(copied)
    }

    /// Refines `model` repeatedly until no node changes or the iteration
    /// limit is reached.
    pub fn refine_model(&mut self, model: &Model) -> Result<Model> {
        info!(
            "Refining model with {} nodes (at most {} passes)",
            model.len(),
            self.context.max_refine_iterations
        );

        let (mut current, mut changed) = self.transform(model, true)?;
        let mut passes = 1;
        while changed && passes < self.context.max_refine_iterations {
            let (next, next_changed) = self.transform(&current, true)?;
            current = next;
            changed = next_changed;
            passes += 1;
        }

        info!(
            "Refinement finished after {} pass(es): {} nodes",
            passes,
            current.len()
        );
        Ok(current)
    }

    fn transform(&mut self, model: &Model, refine: bool) -> Result<(Model, bool)> {
        self.model = Model::new();
        self.output_map.clear();

        let mut changed = false;
        for (id, node) in model.nodes() {
            if refine {
                changed |= node.refine(id, self)?;
            } else {
                node.copy(id, self)?;
            }
        }

        for (name, elements) in model.outputs() {
            let mapped = self.transform_port_elements(elements)?;
            self.model.add_output(name, mapped)?;
        }

        let result = std::mem::take(&mut self.model);
        self.output_map.clear();
        debug!(
            "{} pass produced {} nodes (changed: {})",
            if refine { "refine" } else { "copy" },
            result.len(),
            changed
        );
        Ok((result, changed))
    }
}
