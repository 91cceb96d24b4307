//! Stages: one computation step of a stage graph.

use smallvec::SmallVec;
use snafu::ensure;

use crate::error::{
    FreeReductionAxisSnafu, InvalidReduceAxisSnafu, NestedReductionSnafu, Result, SerialPrefixOutOfRangeSnafu,
};
use crate::expr::ExprNode;
use crate::types::StageTag;
use crate::{Axis, Expr, Tensor};

/// One computation step.
///
/// A stage owns one spatial axis per output dimension, the reduction axes its body
/// consumes, and the body itself. The first `serial_prefix` output axes are executed as
/// plain sequential loops around the hardware grid; the remaining output axes form the
/// *grid view* a hardware binder tiles.
#[derive(Debug)]
pub struct Stage {
    name: String,
    axes: SmallVec<[Axis; 4]>,
    reduce_axes: SmallVec<[Axis; 4]>,
    body: Expr,
    tag: StageTag,
    serial_prefix: usize,
}

impl Stage {
    /// Create a stage, checking that every reduction axis in `body` is declared.
    ///
    /// A reduction may only appear at the root of `body`; its axes become the stage's
    /// reduction axes and must be distinct reduction-kind axes.
    pub fn new(
        name: impl Into<String>,
        axes: impl IntoIterator<Item = Axis>,
        body: Expr,
        tag: StageTag,
        serial_prefix: usize,
    ) -> Result<Self> {
        let name = name.into();
        let axes: SmallVec<[Axis; 4]> = axes.into_iter().collect();
        ensure!(
            serial_prefix <= axes.len(),
            SerialPrefixOutOfRangeSnafu { stage: name.clone(), prefix: serial_prefix, rank: axes.len() }
        );

        let reduce_axes: SmallVec<[Axis; 4]> = match body.node() {
            ExprNode::Reduce { axes, .. } => axes.clone(),
            _ => SmallVec::new(),
        };
        let top_level = usize::from(matches!(body.node(), ExprNode::Reduce { .. }));
        ensure!(body.reduce_count() == top_level, NestedReductionSnafu { stage: name.clone() });

        for (i, axis) in reduce_axes.iter().enumerate() {
            let reason = if !axis.is_reduction() {
                Some("not a reduction axis")
            } else if reduce_axes[..i].contains(axis) {
                Some("listed more than once")
            } else {
                None
            };
            if let Some(reason) = reason {
                return InvalidReduceAxisSnafu { stage: name.clone(), axis: axis.name(), reason }.fail();
            }
        }

        for axis in body.referenced_axes() {
            ensure!(
                !axis.is_reduction() || reduce_axes.contains(&axis),
                FreeReductionAxisSnafu { stage: name.clone(), axis: axis.name() }
            );
        }

        tracing::trace!(stage = %name, rank = axes.len(), reduce = reduce_axes.len(), tag = tag.name(), "stage created");
        Ok(Self { name, axes, reduce_axes, body, tag, serial_prefix })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spatial axes, one per output dimension.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn reduce_axes(&self) -> &[Axis] {
        &self.reduce_axes
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    pub fn tag(&self) -> StageTag {
        self.tag
    }

    pub fn serial_prefix(&self) -> usize {
        self.serial_prefix
    }

    /// Output axes executed as sequential outer loops.
    pub fn serial_axes(&self) -> &[Axis] {
        &self.axes[..self.serial_prefix]
    }

    /// Output axes a hardware binder maps onto the block/thread grid.
    pub fn grid_axes(&self) -> &[Axis] {
        &self.axes[self.serial_prefix..]
    }

    /// Output axes followed by reduction axes: the stage's initial loop nest.
    pub fn all_axes(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter().chain(self.reduce_axes.iter())
    }

    pub fn is_reduction(&self) -> bool {
        !self.reduce_axes.is_empty()
    }

    /// Tensors read by the body, in first-use order.
    pub fn inputs(&self) -> Vec<Tensor> {
        self.body.input_tensors()
    }
}
