//! Built-in CUDA schedules.

use tessera_ir::{Target, Tensor};

use crate::binder::bind_all;
use crate::context::ScheduleContext;
use crate::error::Result;
use crate::native::delegate;
use crate::registry::{OperatorTag, ScheduleEntry, ScheduleOutput, ScheduleRegistry};
use crate::schedule::Schedule;

pub fn register_builtins(registry: &ScheduleRegistry) {
    registry.register(
        OperatorTag::InstanceNorm,
        Target::Cuda,
        ScheduleEntry::new("cuda.instance_norm", schedule_instance_norm),
    );
    registry.register(OperatorTag::Lrn, Target::Cuda, ScheduleEntry::new("cuda.lrn", schedule_lrn));
    registry.register(
        OperatorTag::L2Normalize,
        Target::Cuda,
        ScheduleEntry::new("cuda.l2_normalize", schedule_l2_normalize),
    );
}

/// Bind every stage feeding `outputs` (mean, mean_sq, var, out) onto its own grid.
pub fn schedule_instance_norm(ctx: &ScheduleContext, outputs: &[Tensor]) -> Result<ScheduleOutput> {
    let schedule = Schedule::from_outputs(outputs);
    tracing::debug!(stages = schedule.stages().len(), tile = ctx.binder().tile, "scheduling instance norm");
    Ok(ScheduleOutput::Generic(bind_all(&schedule, ctx.binder())?))
}

pub fn schedule_lrn(ctx: &ScheduleContext, outputs: &[Tensor]) -> Result<ScheduleOutput> {
    delegate(&OperatorTag::Lrn, ctx, outputs).map(ScheduleOutput::Native)
}

pub fn schedule_l2_normalize(ctx: &ScheduleContext, outputs: &[Tensor]) -> Result<ScheduleOutput> {
    delegate(&OperatorTag::L2Normalize, ctx, outputs).map(ScheduleOutput::Native)
}
