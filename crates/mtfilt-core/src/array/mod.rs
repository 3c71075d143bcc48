//! Dense array descriptors: extents, strides, and buffer views.

pub mod dense;
pub mod shape;

pub use dense::{ArrayView, ArrayViewMut, DenseArray};
pub use shape::{Axis, Shape, StepVector};
