//! Stage graph construction for normalization operators.
//!
//! Operators are described as compute definitions over symbolic tensors: each
//! [`compute`] call creates one stage with fresh spatial axes, and an operator such as
//! [`nn::instance_norm`] chains several of them into a [`StageGraph`]. Scheduling is
//! left to `tessera-schedule`; [`realize::Interpreter`] evaluates a graph on host data
//! for reference results.
//!
//! ```
//! use tessera_tensor::{DType, nn, placeholder};
//!
//! let data = placeholder("data", [2i64, 3, 16, 16], DType::Float32);
//! let gamma = placeholder("gamma", [3i64], DType::Float32);
//! let beta = placeholder("beta", [3i64], DType::Float32);
//!
//! let norm = nn::instance_norm(&data, &gamma, &beta, 1e-5, false)?;
//! assert_eq!(norm.graph.len(), 4);
//! # Ok::<(), tessera_tensor::Error>(())
//! ```

pub mod compute;
pub mod error;
pub mod nn;
pub mod realize;


pub use compute::{ComputeOptions, compute, compute_with, placeholder};
pub use error::{Error, Result};

pub use tessera_ir::{Axis, DType, Expr, SInt, Stage, StageGraph, StageTag, Tensor};
