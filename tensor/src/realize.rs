//! Reference evaluation of stage graphs on host data.
//!
//! Every value is computed in `f64`, point by point, straight from the stage bodies.
//! This is the ground truth schedules are checked against, not an execution strategy.

use std::collections::HashMap;

use ndarray::{ArrayD, Dimension, IxDyn};
use snafu::{OptionExt, ensure};
use tessera_ir::{AxisId, BinaryOp, Expr, ExprNode, Stage, StageGraph, Tensor, TensorId, TernaryOp, UnaryOp};

use crate::error::{
    IndexOutOfBoundsSnafu, Result, ShapeMismatchSnafu, SymbolicShapeSnafu, UnboundAxisSnafu, UnboundInputSnafu,
};

/// Evaluates stage graphs given concrete placeholder values.
#[derive(Debug, Default)]
pub struct Interpreter {
    values: HashMap<TensorId, ArrayD<f64>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the value of a placeholder (or override a computed tensor).
    pub fn bind(&mut self, tensor: &Tensor, data: ArrayD<f64>) -> Result<()> {
        let expected = concrete_shape(tensor)?;
        ensure!(
            data.shape() == expected.as_slice(),
            ShapeMismatchSnafu { tensor: tensor.name(), expected, actual: data.shape().to_vec() }
        );
        self.values.insert(tensor.id(), data);
        Ok(())
    }

    pub fn get(&self, tensor: &Tensor) -> Option<&ArrayD<f64>> {
        self.values.get(&tensor.id())
    }

    /// Evaluate every stage of `graph` not evaluated yet, in declaration order.
    pub fn run(&mut self, graph: &StageGraph) -> Result<()> {
        for placeholder in graph.placeholders() {
            ensure!(self.values.contains_key(&placeholder.id()), UnboundInputSnafu { tensor: placeholder.name() });
        }
        tracing::debug!(stages = graph.len(), "interpreting stage graph");

        for tensor in graph.tensors() {
            if self.values.contains_key(&tensor.id()) {
                continue;
            }
            let value = self.eval_tensor(tensor)?;
            self.values.insert(tensor.id(), value);
        }
        Ok(())
    }

    /// Run `graph` and return the value of `tensor`.
    pub fn realize(&mut self, graph: &StageGraph, tensor: &Tensor) -> Result<ArrayD<f64>> {
        self.run(graph)?;
        self.get(tensor).cloned().context(UnboundInputSnafu { tensor: tensor.name() })
    }

    fn eval_tensor(&self, tensor: &Tensor) -> Result<ArrayD<f64>> {
        let stage = tensor.stage().context(UnboundInputSnafu { tensor: tensor.name() })?;
        let shape = concrete_shape(tensor)?;
        tracing::trace!(stage = stage.name(), ?shape, "evaluating stage");

        let mut out = ArrayD::zeros(IxDyn(&shape));
        let mut env: HashMap<AxisId, i64> = HashMap::new();
        for (index, slot) in out.indexed_iter_mut() {
            for (axis, &i) in stage.axes().iter().zip(index.slice()) {
                env.insert(axis.id(), i as i64);
            }
            *slot = self.eval(stage, stage.body(), &mut env)?;
        }
        Ok(out)
    }

    fn eval(&self, stage: &Stage, expr: &Expr, env: &mut HashMap<AxisId, i64>) -> Result<f64> {
        Ok(match expr.node() {
            ExprNode::Const { value, .. } => value.as_f64(),
            ExprNode::Var(axis) => {
                *env.get(&axis.id()).context(UnboundAxisSnafu { stage: stage.name(), axis: axis.name() })? as f64
            }
            ExprNode::Dim(dim) => dim.as_const().context(SymbolicShapeSnafu { tensor: stage.name() })? as f64,
            ExprNode::Load { tensor, indices } => {
                let index =
                    indices.iter().map(|e| self.eval(stage, e, env).map(|v| v as i64)).collect::<Result<Vec<_>>>()?;
                let data = self.values.get(&tensor.id()).context(UnboundInputSnafu { tensor: tensor.name() })?;
                let position = index
                    .iter()
                    .zip(data.shape())
                    .map(|(&i, &n)| usize::try_from(i).ok().filter(|&i| i < n))
                    .collect::<Option<Vec<_>>>()
                    .context(IndexOutOfBoundsSnafu { tensor: tensor.name(), index: index.clone() })?;
                data[IxDyn(&position)]
            }
            ExprNode::Unary(op, x) => {
                let v = self.eval(stage, x, env)?;
                match op {
                    UnaryOp::Neg => -v,
                    UnaryOp::Sqrt => v.sqrt(),
                    UnaryOp::Exp => v.exp(),
                    UnaryOp::Reciprocal => v.recip(),
                }
            }
            ExprNode::Binary(op, lhs, rhs) => {
                let (a, b) = (self.eval(stage, lhs, env)?, self.eval(stage, rhs, env)?);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div if expr.dtype().is_int() => (a / b).trunc(),
                    BinaryOp::Div => a / b,
                    BinaryOp::Mod => a % b,
                    BinaryOp::Pow => a.powf(b),
                    BinaryOp::Max => a.max(b),
                    BinaryOp::Min => a.min(b),
                    BinaryOp::Lt => f64::from(u8::from(a < b)),
                    BinaryOp::Ge => f64::from(u8::from(a >= b)),
                    BinaryOp::And => f64::from(u8::from(a != 0.0 && b != 0.0)),
                }
            }
            // Only the taken branch is evaluated: padding relies on it.
            ExprNode::Ternary(TernaryOp::Where, cond, then, otherwise) => {
                if self.eval(stage, cond, env)? != 0.0 {
                    self.eval(stage, then, env)?
                } else {
                    self.eval(stage, otherwise, env)?
                }
            }
            ExprNode::Cast(dtype, x) => {
                let v = self.eval(stage, x, env)?;
                if dtype.is_bool() {
                    f64::from(u8::from(v != 0.0))
                } else if dtype.is_int() {
                    v.trunc()
                } else {
                    v
                }
            }
            ExprNode::Reduce { op, body, axes } => {
                let extents = axes
                    .iter()
                    .map(|axis| axis.extent().as_const().map(|e| e.max(0) as usize))
                    .collect::<Option<Vec<_>>>()
                    .context(SymbolicShapeSnafu { tensor: stage.name() })?;

                let mut acc = op.identity();
                for point in ndarray::indices(IxDyn(&extents)) {
                    for (axis, &i) in axes.iter().zip(point.slice()) {
                        env.insert(axis.id(), i as i64);
                    }
                    acc = op.combine(acc, self.eval(stage, body, env)?);
                }
                for axis in axes {
                    env.remove(&axis.id());
                }
                acc
            }
        })
    }
}

/// Concrete shape of `tensor`, failing on symbolic dimensions.
pub fn concrete_shape(tensor: &Tensor) -> Result<Vec<usize>> {
    tensor
        .shape()
        .iter()
        .map(|dim| dim.as_const().and_then(|v| usize::try_from(v).ok()))
        .collect::<Option<Vec<_>>>()
        .context(SymbolicShapeSnafu { tensor: tensor.name() })
}
