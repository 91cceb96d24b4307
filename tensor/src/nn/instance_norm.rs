//! Instance normalization over NCHW input.

use snafu::ResultExt;
use tessera_ir::{Axis, Expr, StageGraph, StageTag, Tensor};

use super::{ensure_rank, scalar};
use crate::compute::{ComputeOptions, axis_names, compute_with, load};
use crate::error::{IrSnafu, Result};

/// Stages produced by one [`instance_norm`] invocation.
///
/// Intermediates are exposed so a schedule can bind them alongside the output.
#[derive(Debug, Clone)]
pub struct InstanceNorm {
    /// `mean`, `mean_sq`, `var`, `out` in declaration order.
    pub graph: StageGraph,
    pub out: Tensor,
    pub mean: Tensor,
    pub var: Tensor,
    pub mean_sq: Tensor,
}

/// Per-(batch, channel) normalization of a 4-D `[B, C, H, W]` tensor.
///
/// ```text
/// mean[b,c]    = Σ_{rh,rw}   data[b,c,rh,rw] / (H·W)
/// mean_sq[b,c] = Σ_{rh2,rw2} data[b,c,rh2,rw2]^2 / (H·W)
/// var[b,c]     = mean_sq[b,c] - mean[b,c]^2
/// out[b,c,h,w] = (data[b,c,h,w] - mean[b,c]) / sqrt(var[b,c] + eps) * gamma[c] + beta[c]
/// ```
///
/// The two statistics use independent reduction axes. With `fix_gamma` the `gamma`
/// factor is dropped and `gamma` is never read. `out` keeps batch and channel as serial
/// loops, so its grid view is `H × W`.
#[tracing::instrument(skip_all, fields(data = data.name(), eps = eps, fix_gamma = fix_gamma))]
pub fn instance_norm(data: &Tensor, gamma: &Tensor, beta: &Tensor, eps: f64, fix_gamma: bool) -> Result<InstanceNorm> {
    ensure_rank("instance_norm", data, 4)?;

    let dtype = data.dtype();
    let shape = data.shape();
    let (height, width) = (&shape[2], &shape[3]);
    let stat_shape = [shape[0].clone(), shape[1].clone()];
    let area = Expr::from(&height.mul(width));
    let two = scalar(2.0, dtype);

    let reduce_options = ComputeOptions::builder().tag(StageTag::CommReduce).axis_names(axis_names(&["b", "c"])).build();
    let pointwise_options = ComputeOptions::builder().axis_names(axis_names(&["b", "c"])).build();

    let rh = Axis::reduce("rh", height).context(IrSnafu)?;
    let rw = Axis::reduce("rw", width).context(IrSnafu)?;
    let mean = compute_with("mean", &stat_shape, &reduce_options, |ax| {
        let x = load(data, [&ax[0], &ax[1], &rh, &rw])?;
        Ok(Expr::sum(x / &area, &[rh.clone(), rw.clone()]))
    })?;

    let rh2 = Axis::reduce("rh2", height).context(IrSnafu)?;
    let rw2 = Axis::reduce("rw2", width).context(IrSnafu)?;
    let mean_sq = compute_with("mean_sq", &stat_shape, &reduce_options, |ax| {
        let x = load(data, [&ax[0], &ax[1], &rh2, &rw2])?;
        Ok(Expr::sum(x.pow(&two) / &area, &[rh2.clone(), rw2.clone()]))
    })?;

    let var = compute_with("var", &stat_shape, &pointwise_options, |ax| {
        Ok(load(&mean_sq, [&ax[0], &ax[1]])? - load(&mean, [&ax[0], &ax[1]])?.pow(&two))
    })?;

    let out_options = ComputeOptions::builder()
        .tag(StageTag::Broadcast)
        .axis_names(axis_names(&["b", "c", "h", "w"]))
        .serial_prefix(2)
        .build();
    let out = compute_with("instance_norm", shape, &out_options, |ax| {
        let (b, c) = (&ax[0], &ax[1]);
        let centered = load(data, ax)? - load(&mean, [b, c])?;
        let normalized = centered / (load(&var, [b, c])? + scalar(eps, dtype)).sqrt();
        let scaled = if fix_gamma { normalized } else { normalized * load(gamma, [c])? };
        Ok(scaled + load(beta, [c])?)
    })?;

    let graph = StageGraph::from_stages(&[mean.clone(), mean_sq.clone(), var.clone(), out.clone()]).context(IrSnafu)?;
    tracing::debug!(stages = graph.len(), out = %out.name(), "instance norm graph built");
    Ok(InstanceNorm { graph, out, mean, var, mean_sq })
}
