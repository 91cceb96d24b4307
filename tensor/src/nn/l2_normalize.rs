//! L2 normalization.

use snafu::{ResultExt, ensure};
use tessera_ir::{Axis, Expr, SInt, StageTag, Tensor};

use super::scalar;
use crate::compute::{ComputeOptions, compute_with, load};
use crate::error::{InvalidAxisSnafu, IrSnafu, Result};

/// `data / sqrt(max(Σ_axes data², eps))`.
///
/// Stages: `sq` (elementwise square), `sq_sum` (sum over `axes`, reduced dimensions kept
/// with extent 1) and the broadcasting output `l2_normalize`.
#[tracing::instrument(skip_all, fields(data = data.name(), eps = eps, axes = ?axes))]
pub fn l2_normalize(data: &Tensor, eps: f64, axes: &[usize]) -> Result<Tensor> {
    let ndim = data.ndim();
    for &axis in axes {
        ensure!(axis < ndim, InvalidAxisSnafu { axis, ndim });
    }
    let mut axes = axes.to_vec();
    axes.sort_unstable();
    axes.dedup();

    let dtype = data.dtype();
    let sq = compute_with("sq", data.shape(), &ComputeOptions::default(), |ax| {
        Ok(load(data, ax)?.pow(scalar(2.0, dtype)))
    })?;

    let reduce_axes: Vec<Axis> = axes
        .iter()
        .map(|&d| Axis::reduce(format!("r{d}"), &data.shape()[d]))
        .collect::<tessera_ir::Result<_>>()
        .context(IrSnafu)?;
    let kept_shape: Vec<SInt> = data
        .shape()
        .iter()
        .enumerate()
        .map(|(d, extent)| if axes.contains(&d) { SInt::Const(1) } else { extent.clone() })
        .collect();
    let reduce_options = ComputeOptions::builder().tag(StageTag::CommReduce).build();
    let sq_sum = compute_with("sq_sum", &kept_shape, &reduce_options, |ax| {
        let indices: Vec<Expr> = (0..ndim)
            .map(|d| match axes.iter().position(|&a| a == d) {
                Some(r) => Expr::from(&reduce_axes[r]),
                None => Expr::from(&ax[d]),
            })
            .collect();
        Ok(Expr::sum(load(&sq, indices)?, &reduce_axes))
    })?;

    let out_options = ComputeOptions::builder().tag(StageTag::Broadcast).build();
    compute_with("l2_normalize", data.shape(), &out_options, |ax| {
        let indices: Vec<Expr> =
            (0..ndim).map(|d| if axes.contains(&d) { Expr::index(0) } else { Expr::from(&ax[d]) }).collect();
        let norm = load(&sq_sum, indices)?.max(scalar(eps, dtype)).sqrt();
        Ok(load(data, ax)? / norm)
    })
}
