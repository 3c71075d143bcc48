//! mtfilt core: dense numeric kernels for spatiotemporal motion-energy
//! filtering.
//!
//! Two stateless kernels carry the hot path: valid-mode correlation with
//! per-axis down-sampling, and piecewise-linear lookup-table evaluation.
//! Both read caller-owned shape + buffer descriptors and never depend on a
//! host numerical environment.

pub mod array;
pub mod config;
pub mod error;
pub mod kernels;

// Re-exports for convenience.
pub use array::{ArrayView, ArrayViewMut, Axis, DenseArray, Shape, StepVector};
pub use config::KernelConfig;
pub use error::{KernelError, Result};
pub use kernels::{
    BakedLut, ClampReport, CorrelationKernel, LookupTable, LutOutput, LutTransform, apply_lut,
    correlate, correlation_shape, range, square_in_place, write_at,
};
