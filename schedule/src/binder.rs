//! Hardware-hierarchy binder.
//!
//! Maps the 2-D grid view of a stage onto a block × thread hierarchy:
//!
//! ```text
//! grid (A, B), tile T
//!   split   A -> (A.outer, A.inner)   B -> (B.outer, B.inner)
//!   reorder [serial..., A.outer, B.outer, A.inner, B.inner, reduction...]
//!   bind    B.inner -> threadIdx.x (T)   A.inner -> threadIdx.y (T)
//!           B.outer -> blockIdx.x        A.outer -> blockIdx.y
//! ```
//!
//! Stages are bound independently, so producers and consumers with different shapes
//! each get their own grid. Extents that are not multiples of `T` are covered by
//! rounding the block count up; [`StageSchedule::guards`] lists the masks for the
//! excess threads.

use snafu::ensure;
use tessera_ir::Tensor;

use crate::config::BinderConfig;
use crate::error::{AlreadyBoundSnafu, Result, UnsupportedRankSnafu};
use crate::lane::ThreadAxis;
use crate::schedule::{Schedule, StageSchedule};

/// Bind a single stage.
///
/// Fails with `AlreadyBound` if the stage carries any binding and with
/// `UnsupportedRank` unless its grid view has exactly two axes.
pub fn bind_stage(stage: &StageSchedule, config: &BinderConfig) -> Result<StageSchedule> {
    ensure!(!stage.is_bound(), AlreadyBoundSnafu { stage: stage.name() });
    let grid = stage.stage().grid_axes();
    ensure!(grid.len() == 2, UnsupportedRankSnafu { stage: stage.name(), rank: grid.len() });
    let (row, col) = (grid[0].clone(), grid[1].clone());

    let (next, row_outer, row_inner) = stage.split(&row, config.tile)?;
    let (next, col_outer, col_inner) = next.split(&col, config.tile)?;
    let bound = next
        .reorder(&[row_outer.clone(), col_outer.clone(), row_inner.clone(), col_inner.clone()])?
        .bind(&col_inner, ThreadAxis::thread(config.col_thread, config.tile))?
        .bind(&row_inner, ThreadAxis::thread(config.row_thread, config.tile))?
        .bind(&col_outer, ThreadAxis::block(config.col_block))?
        .bind(&row_outer, ThreadAxis::block(config.row_block))?;

    tracing::trace!(
        stage = stage.name(),
        row_blocks = %row_outer.extent(),
        col_blocks = %col_outer.extent(),
        tile = config.tile,
        guards = bound.guards().len(),
        "stage bound"
    );
    Ok(bound)
}

/// Bind an explicit subset of `schedule`'s stages.
///
/// Stages are processed in declaration order regardless of the order of `tensors`.
/// Either every requested stage is bound or the first error is returned and no
/// schedule is produced.
#[tracing::instrument(skip_all, fields(requested = tensors.len(), tile = config.tile))]
pub fn bind_stages(schedule: &Schedule, tensors: &[Tensor], config: &BinderConfig) -> Result<Schedule> {
    for tensor in tensors {
        schedule.get(tensor)?;
    }
    let mut ordered: Vec<&Tensor> = tensors.iter().collect();
    ordered.sort_by_key(|tensor| schedule.graph().position(tensor));

    let mut next = schedule.clone();
    for tensor in ordered {
        let bound = bind_stage(next.get(tensor)?, config)?;
        next = next.with_stage(bound)?;
    }
    tracing::debug!(stages = tensors.len(), "stages bound");
    Ok(next)
}

/// Bind every stage of `schedule`.
pub fn bind_all(schedule: &Schedule, config: &BinderConfig) -> Result<Schedule> {
    let tensors: Vec<Tensor> = schedule.stages().iter().map(|s| s.tensor().clone()).collect();
    bind_stages(schedule, &tensors, config)
}
