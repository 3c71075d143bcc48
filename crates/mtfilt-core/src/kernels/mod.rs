//! Numeric kernels: valid correlation, lookup-table transforms, and
//! pointwise helpers.

pub mod correlate;
pub mod lut;
pub mod pointwise;

pub use correlate::{CorrelationKernel, correlate, correlation_shape};
pub use lut::{BakedLut, ClampReport, LookupTable, LutOutput, LutTransform, apply_lut};
pub use pointwise::{range, square_in_place, write_at};
