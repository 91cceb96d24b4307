//! Symbolic tensors.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use snafu::ensure;
use tessera_dtype::DType;

use crate::error::{IndexArityMismatchSnafu, Result};
use crate::{Expr, SInt, Stage};

/// Atomic counter for unique tensor IDs.
static TENSOR_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-unique tensor identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(u64);

impl TensorId {
    fn next() -> Self {
        Self(TENSOR_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Where a tensor's values come from.
#[derive(Debug, Clone)]
pub enum TensorSource {
    /// Operator input supplied by the caller.
    Placeholder,
    /// Output of a stage.
    Computed(Arc<Stage>),
}

#[derive(Debug)]
struct TensorNode {
    id: TensorId,
    name: String,
    shape: SmallVec<[SInt; 4]>,
    dtype: DType,
    source: TensorSource,
}

/// Immutable symbolic array.
///
/// A computed tensor keeps its producing stage alive; stages read other tensors through
/// shared handles inside their bodies. Nothing is ever mutated after construction, so
/// the reference structure is a DAG by construction.
#[derive(Clone)]
pub struct Tensor(Arc<TensorNode>);

impl Tensor {
    /// Operator input of the given shape.
    pub fn placeholder<D: Into<SInt>>(name: impl Into<String>, shape: impl IntoIterator<Item = D>, dtype: DType) -> Self {
        Self(Arc::new(TensorNode {
            id: TensorId::next(),
            name: name.into(),
            shape: shape.into_iter().map(Into::into).collect(),
            dtype,
            source: TensorSource::Placeholder,
        }))
    }

    /// Output of `stage`: one dimension per output axis, dtype of the body.
    pub fn computed(stage: Stage) -> Self {
        Self(Arc::new(TensorNode {
            id: TensorId::next(),
            name: stage.name().to_string(),
            shape: stage.axes().iter().map(|axis| axis.extent().clone()).collect(),
            dtype: stage.body().dtype(),
            source: TensorSource::Computed(Arc::new(stage)),
        }))
    }

    pub fn id(&self) -> TensorId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn shape(&self) -> &[SInt] {
        &self.0.shape
    }

    pub fn ndim(&self) -> usize {
        self.0.shape.len()
    }

    pub fn dtype(&self) -> DType {
        self.0.dtype
    }

    pub fn source(&self) -> &TensorSource {
        &self.0.source
    }

    /// Producing stage, `None` for placeholders.
    pub fn stage(&self) -> Option<&Arc<Stage>> {
        match &self.0.source {
            TensorSource::Placeholder => None,
            TensorSource::Computed(stage) => Some(stage),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.0.source, TensorSource::Placeholder)
    }

    /// Tensors the producing stage reads (empty for placeholders).
    pub fn input_tensors(&self) -> Vec<Tensor> {
        self.stage().map(|stage| stage.inputs()).unwrap_or_default()
    }

    /// Rank-checked element access `self[indices...]`.
    pub fn at<I: Into<Expr>>(&self, indices: impl IntoIterator<Item = I>) -> Result<Expr> {
        let indices: SmallVec<[Expr; 4]> = indices.into_iter().map(Into::into).collect();
        ensure!(
            indices.len() == self.ndim(),
            IndexArityMismatchSnafu { tensor: self.name(), expected: self.ndim(), actual: indices.len() }
        );
        Ok(Expr::load(self, indices))
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Tensor {}

impl Hash for Tensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape: Vec<String> = self.shape().iter().map(ToString::to_string).collect();
        let kind = if self.is_placeholder() { "placeholder" } else { "compute" };
        write!(f, "Tensor({}#{}, {kind}, [{}], {})", self.name(), self.id().value(), shape.join(", "), self.dtype())
    }
}
