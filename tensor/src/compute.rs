//! The two ways to introduce a tensor: [`placeholder`] for operator inputs and
//! [`compute`] for stages.

use bon::bon;
use snafu::ResultExt;
use tessera_ir::{Axis, DType, Expr, SInt, Stage, StageTag, Tensor};

use crate::error::{IrSnafu, Result};

/// Operator input of the given shape.
pub fn placeholder<D: Into<SInt>>(name: impl Into<String>, shape: impl IntoIterator<Item = D>, dtype: DType) -> Tensor {
    Tensor::placeholder(name, shape, dtype)
}

/// Stage attributes beyond name, shape and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputeOptions {
    pub tag: StageTag,
    /// Names for the spatial axes; missing entries fall back to `i{dim}`.
    pub axis_names: Vec<String>,
    /// Leading output axes executed as sequential loops around the hardware grid.
    pub serial_prefix: usize,
}

#[bon]
impl ComputeOptions {
    #[builder]
    pub fn new(
        #[builder(default)] tag: StageTag,
        #[builder(default)] axis_names: Vec<String>,
        #[builder(default)] serial_prefix: usize,
    ) -> Self {
        Self { tag, axis_names, serial_prefix }
    }
}

/// Define a stage with one fresh spatial axis per dimension of `shape`.
///
/// `body` receives the axes and returns the element expression; reduction axes it
/// uses must be created by the caller and reduced at the root of the body.
pub fn compute(
    name: impl Into<String>,
    shape: &[SInt],
    body: impl FnOnce(&[Axis]) -> Result<Expr>,
) -> Result<Tensor> {
    compute_with(name, shape, &ComputeOptions::default(), body)
}

/// [`compute`] with explicit [`ComputeOptions`].
pub fn compute_with(
    name: impl Into<String>,
    shape: &[SInt],
    options: &ComputeOptions,
    body: impl FnOnce(&[Axis]) -> Result<Expr>,
) -> Result<Tensor> {
    let name = name.into();
    let axes: Vec<Axis> = shape
        .iter()
        .enumerate()
        .map(|(dim, extent)| {
            let axis_name = options.axis_names.get(dim).cloned().unwrap_or_else(|| format!("i{dim}"));
            Axis::spatial(axis_name, extent.clone())
        })
        .collect();

    let body = body(&axes)?;
    let stage = Stage::new(name, axes, body, options.tag, options.serial_prefix).context(IrSnafu)?;
    Ok(Tensor::computed(stage))
}

/// Rank-checked `tensor[indices...]` inside a compute body.
pub fn load<I: Into<Expr>>(tensor: &Tensor, indices: impl IntoIterator<Item = I>) -> Result<Expr> {
    tensor.at(indices).context(IrSnafu)
}

/// Owned axis names for [`ComputeOptions`].
pub fn axis_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
