//! Hardware lanes and axis bindings.

use std::fmt;

use strum::{EnumIter, IntoStaticStr};
use tessera_ir::{Axis, SInt};

/// Parallel execution resource an axis can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr)]
pub enum Lane {
    #[strum(serialize = "blockIdx.x")]
    BlockX,
    #[strum(serialize = "blockIdx.y")]
    BlockY,
    #[strum(serialize = "blockIdx.z")]
    BlockZ,
    #[strum(serialize = "threadIdx.x")]
    ThreadX,
    #[strum(serialize = "threadIdx.y")]
    ThreadY,
    #[strum(serialize = "threadIdx.z")]
    ThreadZ,
}

impl Lane {
    pub const fn is_block(&self) -> bool {
        matches!(self, Self::BlockX | Self::BlockY | Self::BlockZ)
    }

    pub const fn is_thread(&self) -> bool {
        !self.is_block()
    }

    /// Launch-configuration name, e.g. `threadIdx.x`.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lane together with the extent it is declared with.
///
/// Thread lanes carry the tile size; block lanes usually take whatever extent the bound
/// axis has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadAxis {
    pub lane: Lane,
    pub extent: Option<i64>,
}

impl ThreadAxis {
    pub const fn block(lane: Lane) -> Self {
        Self { lane, extent: None }
    }

    pub const fn thread(lane: Lane, extent: i64) -> Self {
        Self { lane, extent: Some(extent) }
    }
}

/// `axis` runs on `thread`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub axis: Axis,
    pub thread: ThreadAxis,
}

impl Binding {
    pub fn lane(&self) -> Lane {
        self.thread.lane
    }

    /// Launch extent: the declared one if any, else the axis extent.
    pub fn extent(&self) -> SInt {
        self.thread.extent.map_or_else(|| self.axis.extent().clone(), SInt::Const)
    }
}
