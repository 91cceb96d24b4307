use snafu::Snafu;

use crate::SInt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Reduction axis with an empty or negative domain.
    #[snafu(display("invalid shape: reduction axis '{axis}' has non-positive extent {extent}"))]
    InvalidShape { axis: String, extent: SInt },

    /// Split factor must be a positive integer.
    #[snafu(display("invalid split factor {factor} for axis '{axis}'"))]
    InvalidSplitFactor { axis: String, factor: i64 },

    /// Reduction axis used in a stage body without being declared by that stage.
    #[snafu(display("stage '{stage}' references reduction axis '{axis}' it does not declare"))]
    FreeReductionAxis { stage: String, axis: String },

    /// Reduce lists must name reduction axes, each once.
    #[snafu(display("stage '{stage}' reduces over '{axis}': {reason}"))]
    InvalidReduceAxis { stage: String, axis: String, reason: String },

    /// Reductions may only appear at the root of a stage body.
    #[snafu(display("stage '{stage}' contains a nested reduction"))]
    NestedReduction { stage: String },

    /// Fused axes must both be spatial or both be reductions.
    #[snafu(display("cannot fuse '{outer}' with '{inner}': axis kinds differ"))]
    FuseKindMismatch { outer: String, inner: String },

    /// Stage reads a computed tensor whose producer is not earlier in the graph.
    #[snafu(display("stage '{stage}' reads '{input}' whose producer is not in the graph before it"))]
    MissingProducer { stage: String, input: String },

    /// Element access with the wrong number of indices.
    #[snafu(display("tensor '{tensor}' has rank {expected}, indexed with {actual} indices"))]
    IndexArityMismatch { tensor: String, expected: usize, actual: usize },

    /// Serial prefix longer than the stage's output rank.
    #[snafu(display("stage '{stage}' declares {prefix} serial axes but has rank {rank}"))]
    SerialPrefixOutOfRange { stage: String, prefix: usize, rank: usize },
}
