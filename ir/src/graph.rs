//! Stage graphs: the ordered set of stages realizing one operator invocation.

use std::collections::HashSet;

use snafu::ensure;

use crate::error::{MissingProducerSnafu, Result};
use crate::{Stage, Tensor, TensorId};

/// Ordered DAG of computed tensors.
///
/// Every stage only reads placeholders or tensors computed by stages earlier in the
/// order. Schedules refer to stages by their position in this order ("declaration
/// order").
#[derive(Debug, Clone)]
pub struct StageGraph {
    stages: Vec<Tensor>,
    outputs: Vec<Tensor>,
    placeholders: Vec<Tensor>,
}

impl StageGraph {
    /// Collect every stage reachable from `outputs`, producers first.
    ///
    /// Inputs are visited in first-use order inside each body, so the order is
    /// deterministic for a given graph.
    pub fn from_outputs(outputs: &[Tensor]) -> Self {
        let mut visited: HashSet<TensorId> = HashSet::new();
        let mut stages = Vec::new();
        let mut placeholders = Vec::new();

        // Iterative post-order DFS: (tensor, inputs already pushed?)
        let mut stack: Vec<(Tensor, bool)> = outputs.iter().rev().map(|t| (t.clone(), false)).collect();
        while let Some((tensor, expanded)) = stack.pop() {
            if expanded {
                stages.push(tensor);
                continue;
            }
            if !visited.insert(tensor.id()) {
                continue;
            }
            if tensor.is_placeholder() {
                placeholders.push(tensor);
                continue;
            }
            let inputs = tensor.input_tensors();
            stack.push((tensor, true));
            for input in inputs.into_iter().rev() {
                if !visited.contains(&input.id()) {
                    stack.push((input, false));
                }
            }
        }

        tracing::debug!(stages = stages.len(), placeholders = placeholders.len(), "stage graph collected");
        Self { stages, outputs: outputs.to_vec(), placeholders }
    }

    /// Build from an explicit stage order.
    ///
    /// Fails with `MissingProducer` when a stage reads a computed tensor that is not
    /// listed before it. Outputs are the stages no other listed stage reads.
    pub fn from_stages(order: &[Tensor]) -> Result<Self> {
        let mut defined: HashSet<TensorId> = HashSet::new();
        let mut consumed: HashSet<TensorId> = HashSet::new();
        let mut placeholders: Vec<Tensor> = Vec::new();
        let mut stages = Vec::new();

        for tensor in order {
            if tensor.is_placeholder() {
                if !placeholders.contains(tensor) {
                    placeholders.push(tensor.clone());
                }
                continue;
            }
            for input in tensor.input_tensors() {
                if input.is_placeholder() {
                    if !placeholders.contains(&input) {
                        placeholders.push(input.clone());
                    }
                } else {
                    ensure!(
                        defined.contains(&input.id()),
                        MissingProducerSnafu { stage: tensor.name(), input: input.name() }
                    );
                }
                consumed.insert(input.id());
            }
            if defined.insert(tensor.id()) {
                stages.push(tensor.clone());
            }
        }

        let outputs = stages.iter().filter(|t| !consumed.contains(&t.id())).cloned().collect();
        Ok(Self { stages, outputs, placeholders })
    }

    /// Computed tensors in declaration order.
    pub fn tensors(&self) -> &[Tensor] {
        &self.stages
    }

    /// Stages in declaration order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter_map(|t| t.stage().map(AsRef::as_ref))
    }

    pub fn outputs(&self) -> &[Tensor] {
        &self.outputs
    }

    pub fn placeholders(&self) -> &[Tensor] {
        &self.placeholders
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn contains(&self, tensor: &Tensor) -> bool {
        self.stages.contains(tensor)
    }

    /// Declaration-order position of `tensor`'s stage.
    pub fn position(&self, tensor: &Tensor) -> Option<usize> {
        self.stages.iter().position(|t| t == tensor)
    }

    /// Stages in this graph reading `tensor`.
    pub fn consumers(&self, tensor: &Tensor) -> Vec<Tensor> {
        self.stages.iter().filter(|t| t.input_tensors().contains(tensor)).cloned().collect()
    }

    /// Look a stage up by name.
    pub fn find(&self, name: &str) -> Option<&Tensor> {
        self.stages.iter().find(|t| t.name() == name)
    }
}
