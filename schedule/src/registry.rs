//! Schedule registry.
//!
//! Maps `(OperatorTag, Target)` to the function that schedules that operator on that
//! target. Lookup is exact on both keys: there is no fallback to a related target, so a
//! strategy shared by several targets has to be registered under each of them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use snafu::OptionExt;
use tessera_ir::{Target, Tensor};

use crate::context::ScheduleContext;
use crate::error::{NoScheduleForTargetSnafu, Result};
use crate::native::NativeSchedule;
use crate::schedule::Schedule;

/// Operator a schedule is registered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorTag {
    InstanceNorm,
    Lrn,
    L2Normalize,
    Custom(String),
}

impl OperatorTag {
    pub fn name(&self) -> &str {
        match self {
            Self::InstanceNorm => "instance_norm",
            Self::Lrn => "lrn",
            Self::L2Normalize => "l2_normalize",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for OperatorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a schedule entry.
#[derive(Debug, Clone)]
pub enum ScheduleOutput {
    /// Loop-level schedule built by this crate.
    Generic(Schedule),
    /// Opaque handle from a native backend.
    Native(NativeSchedule),
}

impl ScheduleOutput {
    pub fn as_generic(&self) -> Option<&Schedule> {
        match self {
            Self::Generic(schedule) => Some(schedule),
            Self::Native(_) => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeSchedule> {
        match self {
            Self::Native(schedule) => Some(schedule),
            Self::Generic(_) => None,
        }
    }

    pub fn into_generic(self) -> Option<Schedule> {
        match self {
            Self::Generic(schedule) => Some(schedule),
            Self::Native(_) => None,
        }
    }
}

/// Scheduling function stored in the registry.
pub type ScheduleFn = Arc<dyn Fn(&ScheduleContext, &[Tensor]) -> Result<ScheduleOutput> + Send + Sync>;

/// A named scheduling function.
#[derive(Clone)]
pub struct ScheduleEntry {
    name: String,
    func: ScheduleFn,
}

impl ScheduleEntry {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&ScheduleContext, &[Tensor]) -> Result<ScheduleOutput> + Send + Sync + 'static,
    ) -> Self {
        Self { name: name.into(), func: Arc::new(func) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, ctx: &ScheduleContext, outputs: &[Tensor]) -> Result<ScheduleOutput> {
        (self.func)(ctx, outputs)
    }
}

impl fmt::Debug for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Registry of schedule entries.
///
/// # Thread Safety
///
/// Entries live behind a `parking_lot::RwLock`: registration takes the write lock,
/// resolution only the read lock. Resolved entries are cloned out, so no lock is held
/// while a schedule is being built.
pub struct ScheduleRegistry {
    entries: RwLock<HashMap<(OperatorTag, Target), ScheduleEntry>>,
}

impl ScheduleRegistry {
    /// Registry with the built-in entries registered.
    pub fn new() -> Self {
        let registry = Self::empty();
        crate::cuda::register_builtins(&registry);
        registry
    }

    /// Registry without any entry.
    pub fn empty() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Register `entry` for `(operator, target)`, replacing any previous entry.
    pub fn register(&self, operator: OperatorTag, target: Target, entry: ScheduleEntry) {
        let name = entry.name.clone();
        let previous = self.entries.write().insert((operator.clone(), target.clone()), entry);
        match previous {
            Some(old) => {
                tracing::debug!(%operator, %target, entry = %name, replaced = old.name(), "schedule entry replaced")
            }
            None => tracing::debug!(%operator, %target, entry = %name, "schedule entry registered"),
        }
    }

    /// Entry registered for exactly `(operator, target)`.
    pub fn resolve(&self, operator: &OperatorTag, target: &Target) -> Result<ScheduleEntry> {
        self.entries
            .read()
            .get(&(operator.clone(), target.clone()))
            .cloned()
            .context(NoScheduleForTargetSnafu { operator: operator.clone(), target: target.clone() })
    }

    pub fn contains(&self, operator: &OperatorTag, target: &Target) -> bool {
        self.entries.read().contains_key(&(operator.clone(), target.clone()))
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<(OperatorTag, Target)> {
        let mut keys: Vec<_> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Resolve the entry for the context's target and run it.
    #[tracing::instrument(skip_all, fields(%operator, outputs = outputs.len()))]
    pub fn schedule(&self, operator: &OperatorTag, ctx: &ScheduleContext, outputs: &[Tensor]) -> Result<ScheduleOutput> {
        let target = ctx.require_target(operator.name())?;
        let entry = self.resolve(operator, target)?;
        tracing::debug!(entry = entry.name(), %target, "dispatching schedule");
        entry.call(ctx, outputs)
    }
}

impl Default for ScheduleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide schedule registry, created on first use with the built-in entries.
pub static SCHEDULES: Lazy<ScheduleRegistry> = Lazy::new(ScheduleRegistry::new);

/// [`ScheduleRegistry::schedule`] on [`SCHEDULES`].
pub fn schedule(operator: &OperatorTag, ctx: &ScheduleContext, outputs: &[Tensor]) -> Result<ScheduleOutput> {
    SCHEDULES.schedule(operator, ctx, outputs)
}
