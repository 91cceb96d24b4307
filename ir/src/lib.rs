//! Intermediate Representation (IR) for the tessera schedule synthesizer.
//!
//! This crate defines the symbolic computation description schedules are derived from.
//!
//! # Module Organization
//!
//! - [`sint`] - Symbolic integers used for dimensions and extents
//! - [`axis`] - Iteration axes with split/fuse lineage
//! - [`expr`] - Scalar expressions forming stage bodies
//! - [`stage`] - One computation step
//! - [`tensor`] - Symbolic tensors (placeholders and stage outputs)
//! - [`graph`] - Ordered stage DAGs
//! - [`types`] - Operation and tag enums
//! - [`error`] - Error types and result handling

pub mod axis;
pub mod error;
pub mod expr;
pub mod graph;
pub mod sint;
pub mod stage;
pub mod tensor;
pub mod types;


pub use axis::{Axis, AxisId, Lineage};
pub use error::{Error, Result};
pub use expr::{Expr, ExprNode};
pub use graph::StageGraph;
pub use sint::{SInt, SymExpr, sint_prod};
pub use stage::Stage;
pub use tensor::{Tensor, TensorId, TensorSource};
pub use types::{AxisKind, BinaryOp, ConstValue, ReduceOp, SplitPart, StageTag, TernaryOp, UnaryOp};

// Re-export external types for convenience
pub use tessera_dtype::{DType, Target};
