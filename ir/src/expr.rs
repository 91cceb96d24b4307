//! Scalar expressions forming stage bodies.
//!
//! An [`Expr`] is an immutable, reference-counted tree. Leaves are constants, axis
//! variables, symbolic sizes, and element loads from other tensors; inner nodes are the
//! opaque scalar operators (`+ - * /`, `sqrt`, `pow`, ...) and at most one top-level
//! reduction per stage.
//!
//! `Display` renders a canonical form that names axes and tensors instead of their
//! identities, so two bodies built by separate invocations of the same operator
//! compare equal as text.

use std::collections::HashSet;
use std::fmt;
use std::ops;
use std::sync::Arc;

use smallvec::SmallVec;
use tessera_dtype::DType;

use crate::types::{BinaryOp, ConstValue, ReduceOp, TernaryOp, UnaryOp};
use crate::{Axis, AxisId, SInt, Tensor, TensorId};

/// Expression node.
#[derive(Debug, Clone)]
pub enum ExprNode {
    Const { value: ConstValue, dtype: DType },
    /// Current value of an iteration axis.
    Var(Axis),
    /// Symbolic size (e.g. an extent taken from a dynamic shape).
    Dim(SInt),
    /// `tensor[indices...]`.
    Load { tensor: Tensor, indices: SmallVec<[Expr; 4]> },
    Unary(UnaryOp, Expr),
    Binary(BinaryOp, Expr, Expr),
    Ternary(TernaryOp, Expr, Expr, Expr),
    Cast(DType, Expr),
    /// `op` over `body` for every point of `axes`.
    Reduce { op: ReduceOp, body: Expr, axes: SmallVec<[Axis; 4]> },
}

/// Shared immutable scalar expression.
#[derive(Debug, Clone)]
pub struct Expr(Arc<ExprNode>);

impl Expr {
    pub fn new(node: ExprNode) -> Self {
        Self(Arc::new(node))
    }

    pub fn node(&self) -> &ExprNode {
        &self.0
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn const_(value: ConstValue, dtype: DType) -> Self {
        Self::new(ExprNode::Const { value, dtype })
    }

    /// `float32` constant.
    pub fn float(value: f64) -> Self {
        Self::const_(ConstValue::Float(value), DType::Float32)
    }

    /// Index constant.
    pub fn index(value: i64) -> Self {
        Self::const_(ConstValue::Int(value), DType::Index)
    }

    /// Unchecked element access; see [`Tensor::at`] for the rank-checked form.
    pub fn load(tensor: &Tensor, indices: impl IntoIterator<Item = Expr>) -> Self {
        Self::new(ExprNode::Load { tensor: tensor.clone(), indices: indices.into_iter().collect() })
    }

    pub fn unary(op: UnaryOp, x: Expr) -> Self {
        Self::new(ExprNode::Unary(op, x))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprNode::Binary(op, lhs, rhs))
    }

    pub fn reduce(op: ReduceOp, body: Expr, axes: &[Axis]) -> Self {
        Self::new(ExprNode::Reduce { op, body, axes: axes.iter().cloned().collect() })
    }

    /// `Σ body` over `axes`.
    pub fn sum(body: Expr, axes: &[Axis]) -> Self {
        Self::reduce(ReduceOp::Sum, body, axes)
    }

    /// `cond ? then : otherwise`.
    pub fn select(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::new(ExprNode::Ternary(TernaryOp::Where, cond, then, otherwise))
    }

    pub fn cast(self, dtype: DType) -> Self {
        Self::new(ExprNode::Cast(dtype, self))
    }

    // =========================================================================
    // Scalar operators
    // =========================================================================

    pub fn sqrt(self) -> Self {
        Self::unary(UnaryOp::Sqrt, self)
    }

    pub fn exp(self) -> Self {
        Self::unary(UnaryOp::Exp, self)
    }

    pub fn reciprocal(self) -> Self {
        Self::unary(UnaryOp::Reciprocal, self)
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Pow, self, exponent.into())
    }

    pub fn max(self, rhs: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Max, self, rhs.into())
    }

    pub fn min(self, rhs: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Min, self, rhs.into())
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Lt, self, rhs.into())
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Ge, self, rhs.into())
    }

    pub fn and(self, rhs: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::And, self, rhs.into())
    }

    /// Integer division (same node as `/`, named for index arithmetic).
    pub fn idiv(self, rhs: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Div, self, rhs.into())
    }

    pub fn rem(self, rhs: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Mod, self, rhs.into())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn dtype(&self) -> DType {
        match self.node() {
            ExprNode::Const { dtype, .. } => *dtype,
            ExprNode::Var(_) | ExprNode::Dim(_) => DType::Index,
            ExprNode::Load { tensor, .. } => tensor.dtype(),
            ExprNode::Unary(_, x) => x.dtype(),
            ExprNode::Binary(op, _, _) if op.is_comparison() => DType::Bool,
            ExprNode::Binary(_, lhs, rhs) => lhs.dtype().promote(rhs.dtype()),
            ExprNode::Ternary(_, _, then, otherwise) => then.dtype().promote(otherwise.dtype()),
            ExprNode::Cast(dtype, _) => *dtype,
            ExprNode::Reduce { body, .. } => body.dtype(),
        }
    }

    /// Direct sub-expressions.
    pub fn children(&self) -> SmallVec<[&Expr; 4]> {
        match self.node() {
            ExprNode::Const { .. } | ExprNode::Var(_) | ExprNode::Dim(_) => SmallVec::new(),
            ExprNode::Load { indices, .. } => indices.iter().collect(),
            ExprNode::Unary(_, x) | ExprNode::Cast(_, x) => SmallVec::from_iter([x]),
            ExprNode::Binary(_, lhs, rhs) => SmallVec::from_iter([lhs, rhs]),
            ExprNode::Ternary(_, a, b, c) => SmallVec::from_iter([a, b, c]),
            ExprNode::Reduce { body, .. } => SmallVec::from_iter([body]),
        }
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Tensors read by this expression, in first-use order.
    pub fn input_tensors(&self) -> Vec<Tensor> {
        let mut seen: HashSet<TensorId> = HashSet::new();
        let mut tensors = Vec::new();
        self.walk(&mut |e| {
            if let ExprNode::Load { tensor, .. } = e.node()
                && seen.insert(tensor.id())
            {
                tensors.push(tensor.clone());
            }
        });
        tensors
    }

    /// Axes referenced as variables or as reduction domains, in first-use order.
    pub fn referenced_axes(&self) -> Vec<Axis> {
        let mut seen: HashSet<AxisId> = HashSet::new();
        let mut axes = Vec::new();
        self.walk(&mut |e| {
            let found: &[Axis] = match e.node() {
                ExprNode::Var(axis) => std::slice::from_ref(axis),
                ExprNode::Reduce { axes: reduced, .. } => reduced.as_slice(),
                _ => &[],
            };
            for axis in found {
                if seen.insert(axis.id()) {
                    axes.push(axis.clone());
                }
            }
        });
        axes
    }

    /// Number of reduction nodes anywhere in the tree.
    pub fn reduce_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |e| {
            if matches!(e.node(), ExprNode::Reduce { .. }) {
                count += 1;
            }
        });
        count
    }

    /// Evaluate an integer index expression; `lookup` supplies axis values.
    ///
    /// Returns `None` for loads, floats, unbound axes and on overflow.
    pub fn eval_index(&self, lookup: &impl Fn(&Axis) -> Option<i64>) -> Option<i64> {
        match self.node() {
            ExprNode::Const { value: ConstValue::Int(v), .. } => Some(*v),
            ExprNode::Const { value: ConstValue::Bool(v), .. } => Some(*v as i64),
            ExprNode::Var(axis) => lookup(axis),
            ExprNode::Dim(dim) => dim.as_const(),
            ExprNode::Unary(UnaryOp::Neg, x) => x.eval_index(lookup)?.checked_neg(),
            ExprNode::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval_index(lookup)?, rhs.eval_index(lookup)?);
                match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    BinaryOp::Mul => a.checked_mul(b),
                    BinaryOp::Div => a.checked_div(b),
                    BinaryOp::Mod => a.checked_rem(b),
                    BinaryOp::Max => Some(a.max(b)),
                    BinaryOp::Min => Some(a.min(b)),
                    BinaryOp::Lt => Some((a < b) as i64),
                    BinaryOp::Ge => Some((a >= b) as i64),
                    BinaryOp::And => Some((a != 0 && b != 0) as i64),
                    BinaryOp::Pow => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
                }
            }
            ExprNode::Ternary(TernaryOp::Where, cond, then, otherwise) => {
                if cond.eval_index(lookup)? != 0 { then.eval_index(lookup) } else { otherwise.eval_index(lookup) }
            }
            _ => None,
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

impl From<&Axis> for Expr {
    fn from(axis: &Axis) -> Self {
        Self::new(ExprNode::Var(axis.clone()))
    }
}

impl From<Axis> for Expr {
    fn from(axis: Axis) -> Self {
        Self::new(ExprNode::Var(axis))
    }
}

impl From<&SInt> for Expr {
    fn from(dim: &SInt) -> Self {
        match dim {
            SInt::Const(v) => Self::index(*v),
            SInt::Symbolic(_) => Self::new(ExprNode::Dim(dim.clone())),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::index(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::index(value as i64)
    }
}

macro_rules! impl_binary_ops {
    ($($trait:ident::$method:ident => $op:expr),* $(,)?) => {
        $(
            impl<R: Into<Expr>> ops::$trait<R> for Expr {
                type Output = Expr;
                fn $method(self, rhs: R) -> Expr {
                    Expr::binary($op, self, rhs.into())
                }
            }

            impl<R: Into<Expr>> ops::$trait<R> for &Expr {
                type Output = Expr;
                fn $method(self, rhs: R) -> Expr {
                    Expr::binary($op, self.clone(), rhs.into())
                }
            }
        )*
    };
}

impl_binary_ops! {
    Add::add => BinaryOp::Add,
    Sub::sub => BinaryOp::Sub,
    Mul::mul => BinaryOp::Mul,
    Div::div => BinaryOp::Div,
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

// =============================================================================
// Canonical rendering
// =============================================================================

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            ExprNode::Const { value, dtype } => match value {
                ConstValue::Int(v) => write!(f, "{v}"),
                ConstValue::Float(v) if *dtype == DType::Float32 => write!(f, "{v:?}f"),
                ConstValue::Float(v) => write!(f, "{dtype}({v:?})"),
                ConstValue::Bool(v) => write!(f, "{v}"),
            },
            ExprNode::Var(axis) => write!(f, "{axis}"),
            ExprNode::Dim(dim) => write!(f, "{dim}"),
            ExprNode::Load { tensor, indices } => {
                write!(f, "{}[", tensor.name())?;
                for (i, idx) in indices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{idx}")?;
                }
                f.write_str("]")
            }
            ExprNode::Unary(UnaryOp::Neg, x) => write!(f, "(-{x})"),
            ExprNode::Unary(op, x) => write!(f, "{}({x})", format!("{op:?}").to_lowercase()),
            ExprNode::Binary(op, lhs, rhs) => match op.symbol() {
                Some(symbol) => write!(f, "({lhs} {symbol} {rhs})"),
                None => write!(f, "{}({lhs}, {rhs})", format!("{op:?}").to_lowercase()),
            },
            ExprNode::Ternary(TernaryOp::Where, cond, then, otherwise) => {
                write!(f, "select({cond}, {then}, {otherwise})")
            }
            ExprNode::Cast(dtype, x) => write!(f, "{dtype}({x})"),
            ExprNode::Reduce { op, body, axes } => {
                write!(f, "{}({body}, axis=[", op.name())?;
                for (i, axis) in axes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{axis}")?;
                }
                f.write_str("])")
            }
        }
    }
}
