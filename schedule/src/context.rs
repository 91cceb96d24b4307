//! Explicit scheduling context.
//!
//! Nothing in this crate consults an ambient "current target": every entry point that
//! needs one receives it through a [`ScheduleContext`].

use std::fmt;
use std::sync::Arc;

use bon::bon;
use snafu::OptionExt;
use tessera_ir::Target;

use crate::config::BinderConfig;
use crate::error::{Result, TargetRequiredSnafu};
use crate::native::NativeBackend;

/// The target selected by the caller, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetContext {
    target: Option<Target>,
}

impl TargetContext {
    pub fn with_target(target: Target) -> Self {
        Self { target: Some(target) }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Target named by the environment.
    ///
    /// # Environment Variables
    ///
    /// * `TESSERA_TARGET=name` - e.g. `cuda`, `rocm`, `llvm`; unset or unparseable means no target
    pub fn from_env() -> Self {
        let Ok(value) = std::env::var("TESSERA_TARGET") else {
            return Self::none();
        };
        match Target::parse(&value) {
            Ok(target) => Self::with_target(target),
            Err(err) => {
                tracing::warn!(value = %value, error = %err, "ignoring TESSERA_TARGET");
                Self::none()
            }
        }
    }

    pub fn current(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// The selected target; fails with `TargetRequired` when there is none.
    pub fn require_target(&self, operation: &str) -> Result<&Target> {
        self.target.as_ref().context(TargetRequiredSnafu { operation })
    }
}

impl From<Target> for TargetContext {
    fn from(target: Target) -> Self {
        Self::with_target(target)
    }
}

/// Everything a schedule entry may consult.
#[derive(Clone, Default)]
pub struct ScheduleContext {
    target: TargetContext,
    native: Option<Arc<dyn NativeBackend>>,
    binder: BinderConfig,
}

#[bon]
impl ScheduleContext {
    #[builder]
    pub fn new(
        #[builder(default, into)] target: TargetContext,
        native: Option<Arc<dyn NativeBackend>>,
        #[builder(default)] binder: BinderConfig,
    ) -> Self {
        Self { target, native, binder }
    }

    /// Context for `target` with default binder settings and no native backend.
    pub fn for_target(target: Target) -> Self {
        Self::builder().target(target).build()
    }

    /// Target and binder settings from the environment.
    pub fn from_env() -> Self {
        Self::builder().target(TargetContext::from_env()).binder(BinderConfig::from_env()).build()
    }

    pub fn target(&self) -> &TargetContext {
        &self.target
    }

    pub fn require_target(&self, operation: &str) -> Result<&Target> {
        self.target.require_target(operation)
    }

    pub fn native_backend(&self) -> Option<&Arc<dyn NativeBackend>> {
        self.native.as_ref()
    }

    pub fn binder(&self) -> &BinderConfig {
        &self.binder
    }
}

impl fmt::Debug for ScheduleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleContext")
            .field("target", &self.target.current())
            .field("native", &self.native.as_ref().map(|backend| backend.name()))
            .field("binder", &self.binder)
            .finish()
    }
}
