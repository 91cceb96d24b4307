//! Element types and target identifiers shared by every tessera crate.
//!
//! - [`DType`] - element type of a symbolic tensor
//! - [`Target`] - opaque backend identifier used for schedule dispatch

pub mod target;


pub use target::{ParseTargetError, Target};

/// Element data types of symbolic tensors.
///
/// The core never computes on these values; the type is carried through stages so
/// schedules and native delegates can reason about storage widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::VariantArray, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum DType {
    Bool = 0,

    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,

    Float16 = 5,
    BFloat16 = 6,
    Float32 = 7,
    Float64 = 8,

    /// Loop counters and index arithmetic.
    Index = 9,
}

impl DType {
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 => 1,
            Self::Int16 | Self::Float16 | Self::BFloat16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
            Self::Index => 8, // Treat as 64-bit index
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::Index)
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64)
    }

    /// Short lowercase name, as printed in stage bodies (`float32`, `index`, ...).
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Result type of mixing `self` with `other` in an arithmetic expression.
    ///
    /// Floats win over integers, wider wins over narrower; `Index` only survives when
    /// both sides are `Index`.
    pub fn promote(self, other: Self) -> Self {
        if self == other {
            return self;
        }
        match (self.is_float(), other.is_float()) {
            (true, false) => self,
            (false, true) => other,
            _ if self == Self::Index => other,
            _ if other == Self::Index => self,
            _ if self.bytes() == other.bytes() => self.max(other),
            _ if self.bytes() > other.bytes() => self,
            _ => other,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
