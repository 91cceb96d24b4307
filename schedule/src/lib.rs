//! Schedule synthesis for multi-stage reduction pipelines.
//!
//! Given the stage graph of an operator (see `tessera-tensor`), this crate decides how
//! each stage's loops map onto a block/thread hardware hierarchy.
//!
//! # Module Organization
//!
//! - [`schedule`] - Immutable per-stage schedules and their primitives (split, fuse, reorder, bind)
//! - [`binder`] - Tiles a stage's 2-D grid onto blocks × threads
//! - [`registry`] - `(operator, target)` → schedule function dispatch
//! - [`native`] - Bridge to precompiled schedule generators
//! - [`context`] - Explicit target selection
//! - [`cuda`] - Built-in CUDA entries
//!
//! ```
//! use tessera_schedule::{Lane, OperatorTag, ScheduleContext, Target, schedule};
//! use tessera_tensor::{DType, nn, placeholder};
//!
//! let data = placeholder("data", [2i64, 3, 16, 16], DType::Float32);
//! let gamma = placeholder("gamma", [3i64], DType::Float32);
//! let beta = placeholder("beta", [3i64], DType::Float32);
//! let norm = nn::instance_norm(&data, &gamma, &beta, 1e-5, false)?;
//!
//! let ctx = ScheduleContext::for_target(Target::Cuda);
//! let output = schedule(&OperatorTag::InstanceNorm, &ctx, &[norm.out.clone()])?;
//! let out = output.as_generic().unwrap().get(&norm.out)?;
//! assert_eq!(out.lane_extent(Lane::BlockX).and_then(|extent| extent.as_const()), Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binder;
pub mod config;
pub mod context;
pub mod cuda;
pub mod error;
pub mod lane;
pub mod native;
pub mod registry;
pub mod schedule;

#[cfg(test)]
pub mod test;

pub use binder::{bind_all, bind_stage, bind_stages};
pub use config::{BinderConfig, DEFAULT_TILE};
pub use context::{ScheduleContext, TargetContext};
pub use error::{Error, Result};
pub use lane::{Binding, Lane, ThreadAxis};
pub use native::{NativeBackend, NativeSchedule, NativeTarget, delegate};
pub use registry::{OperatorTag, SCHEDULES, ScheduleEntry, ScheduleFn, ScheduleOutput, ScheduleRegistry, schedule};
pub use schedule::{LoopLevel, Schedule, StageSchedule};

pub use tessera_ir::Target;
