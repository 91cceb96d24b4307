//! Local response normalization.

use snafu::{ResultExt, ensure};
use tessera_ir::{Axis, Expr, SInt, StageTag, Tensor};

use super::{ensure_rank, scalar};
use crate::compute::{ComputeOptions, compute_with, load};
use crate::error::{InvalidAxisSnafu, InvalidWindowSnafu, IrSnafu, Result};

/// `data / (bias + alpha * Σ_window data² / size)^beta` over a window of `size`
/// neighbours along `axis` of a 4-D tensor.
///
/// Stages: `pad_data` (zero padding of `size / 2` on both sides of `axis`), `sqr_sum`,
/// `sqr_sum_up`, and the output `lrn`.
#[tracing::instrument(skip_all, fields(data = data.name(), size = size, axis = axis))]
pub fn lrn(data: &Tensor, size: usize, axis: usize, alpha: f64, beta: f64, bias: f64) -> Result<Tensor> {
    ensure_rank("lrn", data, 4)?;
    ensure!(axis < data.ndim(), InvalidAxisSnafu { axis, ndim: data.ndim() });
    ensure!(size % 2 == 1, InvalidWindowSnafu { size });

    let dtype = data.dtype();
    let half = (size / 2) as i64;
    let extent = data.shape()[axis].clone();

    let mut padded_shape = data.shape().to_vec();
    padded_shape[axis] = extent.add(&SInt::Const(2 * half));
    let pad_options = ComputeOptions::builder().tag(StageTag::Injective).build();
    let pad_data = compute_with("pad_data", &padded_shape, &pad_options, |ax| {
        let idx = Expr::from(&ax[axis]);
        let in_bounds = idx.clone().ge(half).and(idx.clone().lt(Expr::index(half) + Expr::from(&extent)));
        let mut indices: Vec<Expr> = ax.iter().map(Expr::from).collect();
        indices[axis] = idx - half;
        Ok(Expr::select(in_bounds, load(data, indices)?, scalar(0.0, dtype)))
    })?;

    let rxs = Axis::reduce("rxs", size as i64).context(IrSnafu)?;
    let reduce_options = ComputeOptions::builder().tag(StageTag::CommReduce).build();
    let sqr_sum = compute_with("sqr_sum", data.shape(), &reduce_options, |ax| {
        let mut indices: Vec<Expr> = ax.iter().map(Expr::from).collect();
        indices[axis] = Expr::from(&ax[axis]) + &rxs;
        Ok(Expr::sum(load(&pad_data, indices)?.pow(scalar(2.0, dtype)), std::slice::from_ref(&rxs)))
    })?;

    let sqr_sum_up = compute_with("sqr_sum_up", data.shape(), &ComputeOptions::default(), |ax| {
        let window = load(&sqr_sum, ax)? * scalar(alpha, dtype) / scalar(size as f64, dtype);
        Ok((scalar(bias, dtype) + window).pow(scalar(beta, dtype)))
    })?;

    let out_options = ComputeOptions::builder().tag(StageTag::Broadcast).build();
    compute_with("lrn", data.shape(), &out_options, |ax| Ok(load(data, ax)? / load(&sqr_sum_up, ax)?))
}
