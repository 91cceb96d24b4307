use snafu::Snafu;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("IR construction error"))]
    Ir { source: tessera_ir::Error },

    #[snafu(display("{operation} expects a rank-{expected} input, got rank {actual}"))]
    RankMismatch { operation: String, expected: usize, actual: usize },

    #[snafu(display("Axis {axis} is out of range for tensor with {ndim} dimensions"))]
    InvalidAxis { axis: usize, ndim: usize },

    #[snafu(display("LRN window size must be a positive odd number, got {size}"))]
    InvalidWindow { size: usize },

    // Reference interpreter
    #[snafu(display("No value bound for tensor '{tensor}'"))]
    UnboundInput { tensor: String },

    #[snafu(display("Tensor '{tensor}' has a symbolic shape"))]
    SymbolicShape { tensor: String },

    #[snafu(display("Shape mismatch for '{tensor}': expected {expected:?}, got {actual:?}"))]
    ShapeMismatch { tensor: String, expected: Vec<usize>, actual: Vec<usize> },

    #[snafu(display("Axis '{axis}' has no value while evaluating '{stage}'"))]
    UnboundAxis { stage: String, axis: String },

    #[snafu(display("Index {index:?} is out of bounds for '{tensor}'"))]
    IndexOutOfBounds { tensor: String, index: Vec<i64> },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
