//! Bridge to separately compiled schedule generators.
//!
//! Some operators have no generic strategy; their schedules come from a native
//! backend behind the [`NativeBackend`] trait. The bridge only resolves the target and
//! forwards the outputs. What comes back is opaque.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use snafu::OptionExt;
use tessera_ir::{Target, Tensor};

use crate::context::ScheduleContext;
use crate::error::{NativeBackendUnavailableSnafu, Result};
use crate::registry::OperatorTag;

/// Backend-side representation of a target.
#[derive(Clone)]
pub struct NativeTarget {
    target: Target,
    payload: Arc<dyn Any + Send + Sync>,
}

impl NativeTarget {
    pub fn new(target: Target, payload: impl Any + Send + Sync) -> Self {
        Self { target, payload: Arc::new(payload) }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl fmt::Debug for NativeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeTarget").field("target", &self.target).finish_non_exhaustive()
    }
}

/// Opaque schedule produced by a native backend.
#[derive(Clone)]
pub struct NativeSchedule {
    backend: String,
    operator: OperatorTag,
    handle: Arc<dyn Any + Send + Sync>,
}

impl NativeSchedule {
    pub fn new(backend: impl Into<String>, operator: OperatorTag, handle: impl Any + Send + Sync) -> Self {
        Self { backend: backend.into(), operator, handle: Arc::new(handle) }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn operator(&self) -> &OperatorTag {
        &self.operator
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.handle.downcast_ref()
    }
}

impl fmt::Debug for NativeSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSchedule")
            .field("backend", &self.backend)
            .field("operator", &self.operator)
            .finish_non_exhaustive()
    }
}

/// Precompiled schedule generator.
pub trait NativeBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Backend view of `target`, or `None` if the backend does not support it.
    fn create_target(&self, target: &Target) -> Option<NativeTarget>;

    fn schedule(&self, operator: &OperatorTag, target: &NativeTarget, outputs: &[Tensor]) -> NativeSchedule;
}

/// Forward `operator` to the context's native backend.
///
/// Fails with `TargetRequired` before touching the backend when no target is selected,
/// and with `NativeBackendUnavailable` when there is no backend or it rejects the target.
#[tracing::instrument(skip_all, fields(operator = %operator, outputs = outputs.len()))]
pub fn delegate(operator: &OperatorTag, ctx: &ScheduleContext, outputs: &[Tensor]) -> Result<NativeSchedule> {
    let target = ctx.require_target(operator.name())?;
    let backend = ctx
        .native_backend()
        .context(NativeBackendUnavailableSnafu { target: target.clone(), reason: "no native backend configured" })?;
    let native_target = backend.create_target(target).context(NativeBackendUnavailableSnafu {
        target: target.clone(),
        reason: format!("backend '{}' does not support this target", backend.name()),
    })?;

    tracing::debug!(backend = backend.name(), target = %target, "delegating to native backend");
    Ok(backend.schedule(operator, &native_target, outputs))
}
