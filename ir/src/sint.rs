//! Symbolic Integer (SInt) - dimensions that can be either concrete or symbolic.
//!
//! Tensor dimensions and axis extents are `SInt`s. A concrete extent is a plain `i64`;
//! a symbolic one is a small expression over named variables with known bounds, so a
//! schedule for a dynamic batch size can still reason about divisibility and launch
//! extents.

use std::fmt;
use std::sync::Arc;

/// Symbolic Integer - either a concrete value or a symbolic expression.
///
/// # Examples
///
/// ```rust
/// # use tessera_ir::SInt;
/// let fixed = SInt::from(32);
/// assert_eq!(fixed.as_const(), Some(32));
///
/// let batch = SInt::var("batch", 1, 64);
/// assert!(batch.is_symbolic());
/// assert_eq!(batch.mul(&SInt::from(8)).bounds(), (8, 512));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SInt {
    /// Concrete dimension.
    Const(i64),

    /// Symbolic expression.
    Symbolic(Arc<SymExpr>),
}

/// Symbolic integer expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymExpr {
    /// Named variable bounded by `[min, max]`.
    Var { name: String, min: i64, max: i64 },
    Add(SInt, SInt),
    Mul(SInt, SInt),
    /// `ceil(lhs / rhs)`, `rhs` positive.
    CeilDiv(SInt, SInt),
}

/// Ceiling division of concrete integers (`rhs != 0`).
pub fn ceil_div_i64(lhs: i64, rhs: i64) -> i64 {
    let q = lhs / rhs;
    if lhs % rhs != 0 && ((lhs > 0) == (rhs > 0)) { q + 1 } else { q }
}

impl SInt {
    /// Create a bounded symbolic variable.
    pub fn var(name: impl Into<String>, min: i64, max: i64) -> Self {
        SInt::Symbolic(Arc::new(SymExpr::Var { name: name.into(), min, max }))
    }

    pub fn is_const(&self) -> bool {
        matches!(self, SInt::Const(_))
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, SInt::Symbolic(_))
    }

    /// Get concrete value if this is a constant, None otherwise.
    pub fn as_const(&self) -> Option<i64> {
        match self {
            SInt::Const(v) => Some(*v),
            SInt::Symbolic(_) => None,
        }
    }

    /// Sum; constants that overflow `i64` stay unfolded.
    pub fn add(&self, rhs: &SInt) -> SInt {
        if let (SInt::Const(a), SInt::Const(b)) = (self, rhs)
            && let Some(sum) = a.checked_add(*b)
        {
            return SInt::Const(sum);
        }
        match (self, rhs) {
            (SInt::Const(0), other) | (other, SInt::Const(0)) => other.clone(),
            _ => SInt::Symbolic(Arc::new(SymExpr::Add(self.clone(), rhs.clone()))),
        }
    }

    /// Product; constants that overflow `i64` stay unfolded.
    pub fn mul(&self, rhs: &SInt) -> SInt {
        if let (SInt::Const(a), SInt::Const(b)) = (self, rhs)
            && let Some(product) = a.checked_mul(*b)
        {
            return SInt::Const(product);
        }
        match (self, rhs) {
            (SInt::Const(0), _) | (_, SInt::Const(0)) => SInt::Const(0),
            (SInt::Const(1), other) | (other, SInt::Const(1)) => other.clone(),
            // Keep the constant factor on the right so divisibility checks find it.
            (SInt::Const(_), SInt::Symbolic(_)) => rhs.mul(self),
            _ => SInt::Symbolic(Arc::new(SymExpr::Mul(self.clone(), rhs.clone()))),
        }
    }

    /// `ceil(self / rhs)`; `rhs` must be positive.
    pub fn ceil_div(&self, rhs: &SInt) -> SInt {
        match (self, rhs) {
            (SInt::Const(a), SInt::Const(b)) => SInt::Const(ceil_div_i64(*a, *b)),
            (_, SInt::Const(1)) => self.clone(),
            (SInt::Symbolic(expr), SInt::Const(f)) => match expr.as_ref() {
                SymExpr::Mul(x, SInt::Const(k)) if k % f == 0 => x.mul(&SInt::Const(k / f)),
                _ => SInt::Symbolic(Arc::new(SymExpr::CeilDiv(self.clone(), rhs.clone()))),
            },
            _ => SInt::Symbolic(Arc::new(SymExpr::CeilDiv(self.clone(), rhs.clone()))),
        }
    }

    /// Inclusive `(min, max)` range of values this integer can take.
    pub fn bounds(&self) -> (i64, i64) {
        let SInt::Symbolic(expr) = self else {
            let v = self.as_const().unwrap_or_default();
            return (v, v);
        };
        match expr.as_ref() {
            SymExpr::Var { min, max, .. } => (*min, *max),
            SymExpr::Add(a, b) => {
                let ((a0, a1), (b0, b1)) = (a.bounds(), b.bounds());
                (a0.saturating_add(b0), a1.saturating_add(b1))
            }
            SymExpr::Mul(a, b) => {
                let ((a0, a1), (b0, b1)) = (a.bounds(), b.bounds());
                let corners = [a0.saturating_mul(b0), a0.saturating_mul(b1), a1.saturating_mul(b0), a1.saturating_mul(b1)];
                (corners.iter().copied().min().unwrap_or(0), corners.iter().copied().max().unwrap_or(0))
            }
            SymExpr::CeilDiv(a, b) => {
                let ((a0, a1), (b0, b1)) = (a.bounds(), b.bounds());
                if b0 <= 0 {
                    return (i64::MIN, i64::MAX);
                }
                (ceil_div_i64(a0, if a0 >= 0 { b1 } else { b0 }), ceil_div_i64(a1, if a1 >= 0 { b0 } else { b1 }))
            }
        }
    }

    /// Whether the value is provably a multiple of `factor`.
    ///
    /// Conservative: symbolic values only qualify when a constant factor divisible by
    /// `factor` appears in a product.
    pub fn is_multiple_of(&self, factor: i64) -> bool {
        if factor == 0 {
            return false;
        }
        match self {
            SInt::Const(v) => v % factor == 0,
            SInt::Symbolic(expr) => match expr.as_ref() {
                SymExpr::Var { .. } | SymExpr::CeilDiv(..) => factor == 1,
                SymExpr::Add(a, b) => a.is_multiple_of(factor) && b.is_multiple_of(factor),
                SymExpr::Mul(a, b) => a.is_multiple_of(factor) || b.is_multiple_of(factor),
            },
        }
    }

    /// Evaluate with every variable replaced by `lookup(name)`.
    pub fn eval(&self, lookup: &impl Fn(&str) -> Option<i64>) -> Option<i64> {
        let SInt::Symbolic(expr) = self else {
            return self.as_const();
        };
        match expr.as_ref() {
            SymExpr::Var { name, .. } => lookup(name),
            SymExpr::Add(a, b) => Some(a.eval(lookup)? + b.eval(lookup)?),
            SymExpr::Mul(a, b) => Some(a.eval(lookup)? * b.eval(lookup)?),
            SymExpr::CeilDiv(a, b) => {
                let divisor = b.eval(lookup)?;
                (divisor != 0).then(|| a.eval(lookup).map(|v| ceil_div_i64(v, divisor))).flatten()
            }
        }
    }
}

/// Product of a sequence of dimensions.
pub fn sint_prod<'a>(dims: impl IntoIterator<Item = &'a SInt>) -> SInt {
    dims.into_iter().fold(SInt::Const(1), |acc, d| acc.mul(d))
}

impl From<i64> for SInt {
    fn from(value: i64) -> Self {
        SInt::Const(value)
    }
}

impl From<i32> for SInt {
    fn from(value: i32) -> Self {
        SInt::Const(value as i64)
    }
}

impl From<usize> for SInt {
    fn from(value: usize) -> Self {
        SInt::Const(value as i64)
    }
}

impl From<&SInt> for SInt {
    fn from(value: &SInt) -> Self {
        value.clone()
    }
}

impl fmt::Display for SInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SInt::Const(v) => write!(f, "{v}"),
            SInt::Symbolic(expr) => match expr.as_ref() {
                SymExpr::Var { name, .. } => f.write_str(name),
                SymExpr::Add(a, b) => write!(f, "({a} + {b})"),
                SymExpr::Mul(a, b) => write!(f, "({a} * {b})"),
                SymExpr::CeilDiv(a, b) => write!(f, "ceildiv({a}, {b})"),
            },
        }
    }
}
