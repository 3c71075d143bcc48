use crate::array::{Axis, Shape};

/// Precondition failures reported by the kernels before any output is written.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("array has {dims} axes; axes past the fourth must have extent 1")]
    TooManyAxes { dims: usize },
    #[error("shape {shape} has more elements than fit in memory")]
    ShapeOverflow { shape: Shape },
    #[error("buffer holds {actual} values but shape {shape} needs {expected}")]
    BufferLength {
        shape: Shape,
        expected: usize,
        actual: usize,
    },
    #[error("byte buffer cannot be viewed as f64 values: {0}")]
    ByteCast(bytemuck::PodCastError),
    #[error("filter must not have a channel axis (got {channels} channels)")]
    FilterChannels { channels: usize },
    #[error("filter extent along {axis} is zero")]
    EmptyFilter { axis: Axis },
    #[error("filter extent {filter} exceeds image extent {image} along {axis}")]
    FilterExceedsImage {
        axis: Axis,
        filter: usize,
        image: usize,
    },
    #[error("step along {axis} must be at least 1")]
    ZeroStep { axis: Axis },
    #[error("step must have exactly 3 entries (got {len})")]
    StepArity { len: usize },
    #[error("output buffer has shape {actual} but the result needs {expected}")]
    OutputShape { expected: Shape, actual: Shape },
    #[error("output buffer holds {actual} values but the input has {expected}")]
    OutputLength { expected: usize, actual: usize },
    #[error("lookup table needs at least 2 entries (got {len})")]
    LutTooShort { len: usize },
    #[error("lookup table {name} must be finite (got {value})")]
    NonFiniteLutParameter { name: &'static str, value: f64 },
    #[error("invalid bake range [{lo}, {hi}]")]
    BakeRange { lo: f64, hi: f64 },
    #[error("writing {len} values at offset {offset} exceeds destination length {dest_len}")]
    WriteOutOfBounds {
        offset: usize,
        len: usize,
        dest_len: usize,
    },
    #[error("cannot compute the range of an empty array")]
    EmptyRange,
    #[error("invalid kernel configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KernelError>;
