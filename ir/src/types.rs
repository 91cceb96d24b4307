//! Fundamental type definitions for stage bodies and iteration axes.

use tessera_dtype::DType;

/// Constant value that can be stored in an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ConstValue {
    /// Natural dtype of the constant when none is given.
    pub const fn default_dtype(&self) -> DType {
        match self {
            Self::Int(_) => DType::Index,
            Self::Float(_) => DType::Float32,
            Self::Bool(_) => DType::Bool,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
            Self::Bool(v) => *v as i64 as f64,
        }
    }
}

/// Role of an iteration axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    /// One output dimension of a stage.
    Spatial,
    /// Consumed inside a stage by a reduction; never bound to a parallel lane.
    Reduction,
    /// Produced by a schedule transform (split or fuse) from other axes.
    Derived,
}

/// Which half of a split an axis is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitPart {
    /// `ceil(extent / factor)` iterations.
    Outer,
    /// `factor` iterations.
    Inner,
}

/// Reduction operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    /// Sum reduction (a + b).
    Sum,
    /// Maximum reduction (max(a, b)).
    Max,
    /// Minimum reduction (min(a, b)).
    Min,
}

impl ReduceOp {
    pub fn identity(&self) -> f64 {
        match self {
            Self::Sum => 0.0,
            Self::Max => f64::NEG_INFINITY,
            Self::Min => f64::INFINITY,
        }
    }

    pub fn combine(&self, acc: f64, value: f64) -> f64 {
        match self {
            Self::Sum => acc + value,
            Self::Max => acc.max(value),
            Self::Min => acc.min(value),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Max => "max",
            Self::Min => "min",
        }
    }
}

/// Unary operation types.
///
/// All unary operations preserve the input dtype. They are opaque scalar operators:
/// the schedule layer never looks inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation: -x
    Neg,
    /// Square root: √x (argument must be non-negative)
    Sqrt,
    /// Natural exponential: e^x
    Exp,
    /// Reciprocal: 1/x
    Reciprocal,
}

/// Binary operation types.
///
/// Arithmetic operations promote their operand dtypes. Comparison and logical
/// operations (Lt, Ge, And) always return `DType::Bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// True division for floats, truncating division for integers.
    Div,
    /// Remainder with the sign of the dividend.
    Mod,
    /// Power: a^b
    Pow,
    Max,
    Min,
    /// Less than: a < b
    Lt,
    /// Greater or equal: a >= b
    Ge,
    /// Logical and.
    And,
}

impl BinaryOp {
    pub const fn is_comparison(&self) -> bool {
        matches!(self, Self::Lt | Self::Ge | Self::And)
    }

    /// Infix symbol, or `None` for operations rendered as calls.
    pub const fn symbol(&self) -> Option<&'static str> {
        match self {
            Self::Add => Some("+"),
            Self::Sub => Some("-"),
            Self::Mul => Some("*"),
            Self::Div => Some("/"),
            Self::Mod => Some("%"),
            Self::Lt => Some("<"),
            Self::Ge => Some(">="),
            Self::And => Some("&&"),
            Self::Pow | Self::Max | Self::Min => None,
        }
    }
}

/// Ternary operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TernaryOp {
    /// Conditional selection: condition ? true_val : false_val
    Where,
}

/// Classification of a stage, mirroring the operator library's pattern tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StageTag {
    /// One-to-one elementwise map.
    #[default]
    Elemwise,
    /// Elementwise with broadcast inputs.
    Broadcast,
    /// Reads inputs through an injective index map (padding, reshapes).
    Injective,
    /// Commutative reduction.
    CommReduce,
}

impl StageTag {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Elemwise => "elemwise",
            Self::Broadcast => "broadcast",
            Self::Injective => "injective",
            Self::CommReduce => "comm_reduce",
        }
    }
}
