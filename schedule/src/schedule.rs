//! Schedules as immutable values.
//!
//! A [`StageSchedule`] is the loop structure of one stage: the current leaf axes in
//! loop order (outermost first) and the hardware bindings of some of them. Every
//! primitive (`split`, `fuse`, `reorder`, `bind`) validates its arguments and returns a
//! new value, leaving the receiver untouched, so a failed step never leaves a
//! half-transformed schedule behind.

use std::sync::Arc;

use snafu::{OptionExt, ResultExt, ensure};
use tessera_ir::{Axis, Expr, Lineage, SInt, Stage, StageGraph, Tensor};

use crate::error::{
    AxisAlreadyBoundSnafu, AxisNotFoundSnafu, InvalidReorderSnafu, IrSnafu, LaneConflictSnafu, LaneExtentMismatchSnafu,
    NonAdjacentFuseSnafu, ReductionAxisBindingSnafu, Result, StageNotInScheduleSnafu,
};
use crate::lane::{Binding, Lane, ThreadAxis};

/// One level of a stage's loop nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopLevel {
    pub axis: Axis,
    /// `None` for a sequential loop.
    pub binding: Option<ThreadAxis>,
}

impl LoopLevel {
    pub fn extent(&self) -> &SInt {
        self.axis.extent()
    }

    pub fn is_serial(&self) -> bool {
        self.binding.is_none()
    }
}

/// Loop structure of a single stage.
#[derive(Debug, Clone)]
pub struct StageSchedule {
    tensor: Tensor,
    stage: Arc<Stage>,
    leaves: Vec<Axis>,
    bindings: Vec<Binding>,
}

impl StageSchedule {
    /// Initial schedule: output axes then reduction axes, all sequential.
    ///
    /// Returns `None` for placeholders.
    pub fn new(tensor: &Tensor) -> Option<Self> {
        let stage = tensor.stage()?.clone();
        let leaves = stage.all_axes().cloned().collect();
        Some(Self { tensor: tensor.clone(), stage, leaves, bindings: Vec::new() })
    }

    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn name(&self) -> &str {
        self.stage.name()
    }

    /// Current loop variables, outermost first.
    pub fn leaves(&self) -> &[Axis] {
        &self.leaves
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn is_bound(&self) -> bool {
        !self.bindings.is_empty()
    }

    pub fn binding_of(&self, axis: &Axis) -> Option<&Binding> {
        self.bindings.iter().find(|b| &b.axis == axis)
    }

    pub fn binding_on(&self, lane: Lane) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.lane() == lane)
    }

    /// Launch extent of `lane`, `None` when nothing is bound to it.
    pub fn lane_extent(&self, lane: Lane) -> Option<SInt> {
        self.binding_on(lane).map(Binding::extent)
    }

    pub fn loop_nest(&self) -> Vec<LoopLevel> {
        self.leaves
            .iter()
            .map(|axis| LoopLevel { axis: axis.clone(), binding: self.binding_of(axis).map(|b| b.thread) })
            .collect()
    }

    /// Index of a declared (or intermediate) axis in terms of the current leaves.
    pub fn index_of(&self, axis: &Axis) -> Option<Expr> {
        axis.index_in(&self.leaves)
    }

    /// Predicates every iteration must satisfy.
    ///
    /// One `index < extent` per split whose parent extent is not provably a multiple of
    /// the factor: iterations past the end of the original domain are masked off.
    pub fn guards(&self) -> Vec<Expr> {
        let mut visited: Vec<Axis> = Vec::new();
        let mut guards = Vec::new();
        let mut stack: Vec<Axis> = self.leaves.iter().rev().cloned().collect();

        while let Some(axis) = stack.pop() {
            match axis.lineage() {
                Lineage::Root => {}
                Lineage::Split { parent, factor, .. } => {
                    if visited.contains(parent) {
                        continue;
                    }
                    visited.push(parent.clone());
                    if !parent.extent().is_multiple_of(*factor)
                        && let Some(index) = parent.index_in(&self.leaves)
                    {
                        guards.push(index.lt(parent.extent()));
                    }
                    stack.push(parent.clone());
                }
                Lineage::Fuse { outer, inner } => {
                    stack.push(inner.clone());
                    stack.push(outer.clone());
                }
            }
        }
        guards
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    fn position(&self, axis: &Axis) -> Result<usize> {
        self.leaves.iter().position(|leaf| leaf == axis).context(AxisNotFoundSnafu { stage: self.name(), axis: axis.name() })
    }

    fn ensure_unbound(&self, axis: &Axis) -> Result<()> {
        match self.binding_of(axis) {
            Some(binding) => {
                AxisAlreadyBoundSnafu { stage: self.name(), axis: axis.name(), lane: binding.lane() }.fail()
            }
            None => Ok(()),
        }
    }

    /// Replace leaf `axis` by `(outer, inner)` with `inner.extent = factor`.
    pub fn split(&self, axis: &Axis, factor: i64) -> Result<(Self, Axis, Axis)> {
        let pos = self.position(axis)?;
        self.ensure_unbound(axis)?;
        let (outer, inner) = axis.split(factor).context(IrSnafu)?;

        let mut next = self.clone();
        next.leaves.splice(pos..=pos, [outer.clone(), inner.clone()]);
        tracing::trace!(stage = self.name(), axis = axis.name(), factor, "split");
        Ok((next, outer, inner))
    }

    /// Replace the adjacent leaves `outer, inner` by one fused loop.
    pub fn fuse(&self, outer: &Axis, inner: &Axis) -> Result<(Self, Axis)> {
        let (po, pi) = (self.position(outer)?, self.position(inner)?);
        ensure!(pi == po + 1, NonAdjacentFuseSnafu { stage: self.name(), outer: outer.name(), inner: inner.name() });
        self.ensure_unbound(outer)?;
        self.ensure_unbound(inner)?;
        let fused = Axis::fuse(outer, inner).context(IrSnafu)?;

        let mut next = self.clone();
        next.leaves.splice(po..=pi, [fused.clone()]);
        tracing::trace!(stage = self.name(), outer = outer.name(), inner = inner.name(), "fuse");
        Ok((next, fused))
    }

    /// Permute the loops named in `order` among the positions they occupy; other
    /// leaves keep their place.
    pub fn reorder(&self, order: &[Axis]) -> Result<Self> {
        let positions = order.iter().map(|axis| self.position(axis)).collect::<Result<Vec<_>>>()?;
        let mut slots = positions.clone();
        slots.sort_unstable();
        slots.dedup();
        ensure!(
            slots.len() == positions.len(),
            InvalidReorderSnafu { stage: self.name(), reason: "an axis is listed more than once" }
        );

        let mut next = self.clone();
        for (slot, axis) in slots.iter().zip(order) {
            next.leaves[*slot] = axis.clone();
        }
        Ok(next)
    }

    /// Map leaf `axis` onto a hardware lane.
    pub fn bind(&self, axis: &Axis, thread: ThreadAxis) -> Result<Self> {
        self.position(axis)?;
        ensure!(!axis.is_reduction(), ReductionAxisBindingSnafu { stage: self.name(), axis: axis.name() });
        self.ensure_unbound(axis)?;
        if let Some(taken) = self.binding_on(thread.lane) {
            return LaneConflictSnafu { stage: self.name(), lane: thread.lane, axis: taken.axis.name() }.fail();
        }
        if let Some(expected) = thread.extent {
            ensure!(
                axis.extent().as_const() == Some(expected),
                LaneExtentMismatchSnafu {
                    stage: self.name(),
                    axis: axis.name(),
                    lane: thread.lane,
                    expected,
                    extent: axis.extent().clone(),
                }
            );
        }

        let mut next = self.clone();
        next.bindings.push(Binding { axis: axis.clone(), thread });
        tracing::trace!(stage = self.name(), axis = axis.name(), lane = %thread.lane, "bind");
        Ok(next)
    }
}

/// Per-stage schedules of a whole stage graph, in declaration order.
#[derive(Debug, Clone)]
pub struct Schedule {
    graph: StageGraph,
    stages: Vec<StageSchedule>,
}

impl Schedule {
    pub fn new(graph: StageGraph) -> Self {
        let stages = graph.tensors().iter().filter_map(StageSchedule::new).collect();
        Self { graph, stages }
    }

    /// Schedule for every stage reachable from `outputs`.
    pub fn from_outputs(outputs: &[Tensor]) -> Self {
        Self::new(StageGraph::from_outputs(outputs))
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    pub fn outputs(&self) -> &[Tensor] {
        self.graph.outputs()
    }

    pub fn stages(&self) -> &[StageSchedule] {
        &self.stages
    }

    pub fn stage(&self, tensor: &Tensor) -> Option<&StageSchedule> {
        self.stages.iter().find(|s| s.tensor() == tensor)
    }

    /// Like [`Schedule::stage`], failing with `StageNotInSchedule`.
    pub fn get(&self, tensor: &Tensor) -> Result<&StageSchedule> {
        self.stage(tensor).context(StageNotInScheduleSnafu { stage: tensor.name() })
    }

    /// Copy of `self` with `stage` replacing the schedule of the same tensor.
    pub fn with_stage(&self, stage: StageSchedule) -> Result<Self> {
        let pos = self
            .stages
            .iter()
            .position(|s| s.tensor() == stage.tensor())
            .context(StageNotInScheduleSnafu { stage: stage.name() })?;
        let mut next = self.clone();
        next.stages[pos] = stage;
        Ok(next)
    }

    pub fn is_fully_bound(&self) -> bool {
        self.stages.iter().all(StageSchedule::is_bound)
    }
}
