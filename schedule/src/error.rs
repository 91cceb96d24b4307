use snafu::Snafu;
use tessera_ir::{SInt, Target};

use crate::lane::Lane;
use crate::registry::OperatorTag;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("IR error"))]
    Ir { source: tessera_ir::Error },

    // Binder
    #[snafu(display("stage '{stage}' has {rank} grid axes, binder needs exactly 2"))]
    UnsupportedRank { stage: String, rank: usize },

    #[snafu(display("stage '{stage}' already carries hardware bindings"))]
    AlreadyBound { stage: String },

    #[snafu(display("stage '{stage}' is not part of this schedule"))]
    StageNotInSchedule { stage: String },

    // Registry and target resolution
    #[snafu(display("no schedule registered for {operator} on target {target}"))]
    NoScheduleForTarget { operator: OperatorTag, target: Target },

    #[snafu(display("{operation} needs an explicitly selected target"))]
    TargetRequired { operation: String },

    #[snafu(display("native backend unavailable for target {target}: {reason}"))]
    NativeBackendUnavailable { target: Target, reason: String },

    // Schedule primitives
    #[snafu(display("axis '{axis}' is not a loop of stage '{stage}'"))]
    AxisNotFound { stage: String, axis: String },

    #[snafu(display("lane {lane} of stage '{stage}' is already taken by '{axis}'"))]
    LaneConflict { stage: String, lane: Lane, axis: String },

    #[snafu(display("axis '{axis}' of stage '{stage}' is already bound to {lane}"))]
    AxisAlreadyBound { stage: String, axis: String, lane: Lane },

    #[snafu(display("reduction axis '{axis}' of stage '{stage}' cannot be bound to a lane"))]
    ReductionAxisBinding { stage: String, axis: String },

    #[snafu(display("{lane} declares extent {expected} but axis '{axis}' of stage '{stage}' has extent {extent}"))]
    LaneExtentMismatch { stage: String, axis: String, lane: Lane, expected: i64, extent: SInt },

    #[snafu(display("invalid reorder of stage '{stage}': {reason}"))]
    InvalidReorder { stage: String, reason: String },

    #[snafu(display("cannot fuse '{outer}' and '{inner}' of stage '{stage}': not adjacent loops"))]
    NonAdjacentFuse { stage: String, outer: String, inner: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
