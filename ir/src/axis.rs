//! Iteration axes.
//!
//! An [`Axis`] is an iteration variable over `[0, extent)`. Axes are immutable shared
//! handles: `split` and `fuse` never touch their inputs, they return new *derived* axes
//! that remember where they came from. That lineage is what lets a schedule rebuild the
//! original index (`outer * factor + inner`) and refuse to bind the same domain twice.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::{SmallVec, smallvec};
use snafu::ensure;

use crate::error::{FuseKindMismatchSnafu, InvalidShapeSnafu, InvalidSplitFactorSnafu, Result};
use crate::types::{AxisKind, SplitPart};
use crate::{Expr, SInt};

/// Atomic counter for unique axis IDs.
static AXIS_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-unique axis identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisId(u64);

impl AxisId {
    fn next() -> Self {
        Self(AXIS_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// How a derived axis was produced.
#[derive(Debug, Clone)]
pub enum Lineage {
    /// Declared directly by a stage.
    Root,
    /// One half of `parent.split(factor)`.
    Split { parent: Axis, factor: i64, part: SplitPart },
    /// `outer * inner.extent + inner`.
    Fuse { outer: Axis, inner: Axis },
}

#[derive(Debug)]
struct AxisNode {
    id: AxisId,
    name: String,
    extent: SInt,
    kind: AxisKind,
    lineage: Lineage,
}

/// Iteration variable over `[0, extent)`.
///
/// Cloning is cheap; equality and hashing use the axis identity, so two axes with the
/// same name and extent are still different variables.
#[derive(Clone)]
pub struct Axis(Arc<AxisNode>);

impl Axis {
    fn new(name: String, extent: SInt, kind: AxisKind, lineage: Lineage) -> Self {
        Self(Arc::new(AxisNode { id: AxisId::next(), name, extent, kind, lineage }))
    }

    /// Output-dimension axis. Never fails: spatial extents are taken as declared.
    pub fn spatial(name: impl Into<String>, extent: impl Into<SInt>) -> Self {
        Self::new(name.into(), extent.into(), AxisKind::Spatial, Lineage::Root)
    }

    /// Reduction axis over `[0, extent)`.
    ///
    /// Fails with `InvalidShape` when the extent is provably zero or negative.
    pub fn reduce(name: impl Into<String>, extent: impl Into<SInt>) -> Result<Self> {
        let name = name.into();
        let extent = extent.into();
        ensure!(extent.bounds().1 > 0, InvalidShapeSnafu { axis: name, extent });
        Ok(Self::new(name, extent, AxisKind::Reduction, Lineage::Root))
    }

    pub fn id(&self) -> AxisId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn extent(&self) -> &SInt {
        &self.0.extent
    }

    pub fn kind(&self) -> AxisKind {
        self.0.kind
    }

    pub fn lineage(&self) -> &Lineage {
        &self.0.lineage
    }

    /// Whether this axis iterates (part of) a reduction domain.
    pub fn is_reduction(&self) -> bool {
        match &self.0.lineage {
            Lineage::Root => self.0.kind == AxisKind::Reduction,
            Lineage::Split { parent, .. } => parent.is_reduction(),
            Lineage::Fuse { outer, .. } => outer.is_reduction(),
        }
    }

    /// Whether `self` is `other` or was derived from it.
    pub fn derives_from(&self, other: &Axis) -> bool {
        if self == other {
            return true;
        }
        match &self.0.lineage {
            Lineage::Root => false,
            Lineage::Split { parent, .. } => parent.derives_from(other),
            Lineage::Fuse { outer, inner } => outer.derives_from(other) || inner.derives_from(other),
        }
    }

    /// Declared axes this axis was ultimately derived from.
    pub fn roots(&self) -> SmallVec<[Axis; 2]> {
        match &self.0.lineage {
            Lineage::Root => smallvec![self.clone()],
            Lineage::Split { parent, .. } => parent.roots(),
            Lineage::Fuse { outer, inner } => {
                let mut roots = outer.roots();
                roots.extend(inner.roots());
                roots
            }
        }
    }

    /// Split into `(outer, inner)` with `inner.extent = factor` and
    /// `outer.extent = ceil(extent / factor)`.
    ///
    /// When the extent is not a multiple of `factor` the pair covers
    /// `[0, outer.extent * factor)`, a superset of the original domain; consumers guard the
    /// excess iterations.
    pub fn split(&self, factor: i64) -> Result<(Axis, Axis)> {
        ensure!(factor > 0, InvalidSplitFactorSnafu { axis: self.name(), factor });

        let outer_extent = self.extent().ceil_div(&SInt::Const(factor));
        let outer = Self::new(
            format!("{}.outer", self.name()),
            outer_extent,
            AxisKind::Derived,
            Lineage::Split { parent: self.clone(), factor, part: SplitPart::Outer },
        );
        let inner = Self::new(
            format!("{}.inner", self.name()),
            SInt::Const(factor),
            AxisKind::Derived,
            Lineage::Split { parent: self.clone(), factor, part: SplitPart::Inner },
        );
        Ok((outer, inner))
    }

    /// Fuse two axes into one of extent `outer.extent * inner.extent`.
    pub fn fuse(outer: &Axis, inner: &Axis) -> Result<Axis> {
        ensure!(
            outer.is_reduction() == inner.is_reduction(),
            FuseKindMismatchSnafu { outer: outer.name(), inner: inner.name() }
        );
        Ok(Self::new(
            format!("{}.{}.fused", outer.name(), inner.name()),
            outer.extent().mul(inner.extent()),
            AxisKind::Derived,
            Lineage::Fuse { outer: outer.clone(), inner: inner.clone() },
        ))
    }

    /// Index expression of `self` in terms of the axes it was derived into.
    ///
    /// `leaves` are the current loop variables of a schedule. A leaf maps to itself; a
    /// split parent maps to `outer * factor + inner`; the halves of a fused axis map to
    /// `fused / inner.extent` and `fused % inner.extent`. Returns `None` when some part of
    /// the domain is not covered by `leaves`.
    pub fn index_in(&self, leaves: &[Axis]) -> Option<Expr> {
        if leaves.contains(self) {
            return Some(Expr::from(self));
        }

        let derived = ancestry(leaves);
        let split_child = |part: SplitPart| {
            derived.iter().find_map(|axis| match axis.lineage() {
                Lineage::Split { parent, factor, part: p } if parent == self && *p == part => Some((axis, *factor)),
                _ => None,
            })
        };
        if let (Some((outer, factor)), Some((inner, _))) = (split_child(SplitPart::Outer), split_child(SplitPart::Inner))
        {
            return Some(outer.index_in(leaves)? * Expr::index(factor) + inner.index_in(leaves)?);
        }

        let (fused, is_outer, inner_extent) = derived.iter().find_map(|axis| match axis.lineage() {
            Lineage::Fuse { outer, inner } if outer == self || inner == self => {
                Some((axis, outer == self, inner.extent().clone()))
            }
            _ => None,
        })?;
        let fused = fused.index_in(leaves)?;
        let inner_extent = Expr::from(&inner_extent);
        Some(if is_outer { fused.idiv(inner_extent) } else { fused.rem(inner_extent) })
    }
}

/// `leaves` plus every axis they were derived from.
fn ancestry(leaves: &[Axis]) -> Vec<Axis> {
    let mut seen: Vec<Axis> = Vec::new();
    let mut stack: Vec<Axis> = leaves.to_vec();
    while let Some(axis) = stack.pop() {
        if seen.contains(&axis) {
            continue;
        }
        match axis.lineage() {
            Lineage::Root => {}
            Lineage::Split { parent, .. } => stack.push(parent.clone()),
            Lineage::Fuse { outer, inner } => {
                stack.push(outer.clone());
                stack.push(inner.clone());
            }
        }
        seen.push(axis);
    }
    seen
}

impl PartialEq for Axis {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Axis {}

impl Hash for Axis {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}[{:?}: {}]", self.name(), self.id().value(), self.kind(), self.extent())
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
