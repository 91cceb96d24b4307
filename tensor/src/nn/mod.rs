//! Normalization operators.

mod instance_norm;
mod l2_normalize;
mod lrn;

pub use instance_norm::{InstanceNorm, instance_norm};
pub use l2_normalize::l2_normalize;
pub use lrn::lrn;

use snafu::ensure;
use tessera_ir::{ConstValue, DType, Expr, Tensor};

use crate::error::{RankMismatchSnafu, Result};

fn ensure_rank(operation: &str, tensor: &Tensor, expected: usize) -> Result<()> {
    ensure!(tensor.ndim() == expected, RankMismatchSnafu { operation, expected, actual: tensor.ndim() });
    Ok(())
}

/// Floating constant in the operator's element type.
fn scalar(value: f64, dtype: DType) -> Expr {
    Expr::const_(ConstValue::Float(value), dtype)
}
