//! Stage builders and a recording native backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tessera_ir::{SInt, Target, Tensor};
use tessera_tensor::compute::{compute, load};
use tessera_tensor::nn::{InstanceNorm, instance_norm};
use tessera_tensor::{DType, placeholder};

use crate::native::{NativeBackend, NativeSchedule, NativeTarget};
use crate::registry::OperatorTag;

pub fn norm_inputs(shape: [i64; 4]) -> (Tensor, Tensor, Tensor) {
    let [_, c, _, _] = shape;
    (
        placeholder("data", shape, DType::Float32),
        placeholder("gamma", [c], DType::Float32),
        placeholder("beta", [c], DType::Float32),
    )
}

pub fn norm(shape: [i64; 4]) -> InstanceNorm {
    let (data, gamma, beta) = norm_inputs(shape);
    instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap()
}

/// Elementwise square of a fresh placeholder of `shape`, with all axes on the grid.
pub fn square(shape: &[i64]) -> Tensor {
    let input = placeholder("x", shape.iter().copied(), DType::Float32);
    let dims: Vec<SInt> = shape.iter().map(|&d| SInt::Const(d)).collect();
    compute("sq", &dims, |axes| {
        let x = load(&input, axes)?;
        Ok(x.clone() * x)
    })
    .unwrap()
}

/// Native schedule payload of [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub operator: OperatorTag,
    pub target: Target,
    pub outputs: Vec<String>,
}

/// Backend supporting a fixed set of targets and counting every call it receives.
pub struct RecordingBackend {
    pub supported: Vec<Target>,
    pub calls: AtomicUsize,
}

impl RecordingBackend {
    pub fn new(supported: impl IntoIterator<Item = Target>) -> Arc<Self> {
        Arc::new(Self { supported: supported.into_iter().collect(), calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NativeBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_target(&self, target: &Target) -> Option<NativeTarget> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.supported.contains(target).then(|| NativeTarget::new(target.clone(), target.name().to_string()))
    }

    fn schedule(&self, operator: &OperatorTag, target: &NativeTarget, outputs: &[Tensor]) -> NativeSchedule {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let recorded = Recorded {
            operator: operator.clone(),
            target: target.target().clone(),
            outputs: outputs.iter().map(|t| t.name().to_string()).collect(),
        };
        NativeSchedule::new(self.name(), operator.clone(), recorded)
    }
}
