//! Array extents, linearization, and down-sampling strides.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{KernelError, Result};

/// The four axes of a dense array, in linearization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal spatial axis (fastest varying).
    X,
    /// Vertical spatial axis.
    Y,
    /// Temporal axis (frame index).
    T,
    /// Independent channel axis (slowest varying).
    Channel,
}

impl Axis {
    /// The three filtered axes, in the order their extents are stored.
    pub const SPATIOTEMPORAL: [Self; 3] = [Self::X, Self::Y, Self::T];

    /// Position of this axis in a `[x, y, t, c]` extent array.
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::T => 2,
            Self::Channel => 3,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::T => write!(f, "t"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// Extents of a dense array along `(x, y, t, channel)`.
///
/// Linear index of `(x, y, t, c)` is `x + y·X + t·X·Y + c·X·Y·T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    extents: [usize; 4],
}

impl Shape {
    /// Shape with an explicit channel extent.
    pub const fn new(x: usize, y: usize, t: usize, channels: usize) -> Self {
        Self {
            extents: [x, y, t, channels],
        }
    }

    /// Single-channel shape, as used for filters.
    pub const fn spatial(x: usize, y: usize, t: usize) -> Self {
        Self::new(x, y, t, 1)
    }

    /// Build a shape from a host dimension list.
    ///
    /// Missing trailing axes default to 1. Axes past the fourth are accepted
    /// only when they are singleton. The element count must fit in `usize`.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        if dims.len() > 4 && dims[4..].iter().any(|&d| d != 1) {
            return Err(KernelError::TooManyAxes { dims: dims.len() });
        }
        let mut extents = [1usize; 4];
        for (slot, &d) in extents.iter_mut().zip(dims) {
            *slot = d;
        }
        let shape = Self { extents };
        shape.checked_len()?;
        Ok(shape)
    }

    /// Extent along one axis.
    pub const fn extent(&self, axis: Axis) -> usize {
        self.extents[axis.index()]
    }

    /// Extents as `[x, y, t, channel]`.
    pub const fn extents(&self) -> [usize; 4] {
        self.extents
    }

    pub const fn channels(&self) -> usize {
        self.extents[3]
    }

    /// Number of elements in one channel (`X·Y·T`), saturating at
    /// `usize::MAX`.
    pub const fn channel_len(&self) -> usize {
        self.extents[0]
            .saturating_mul(self.extents[1])
            .saturating_mul(self.extents[2])
    }

    /// Total number of elements, saturating at `usize::MAX`.
    ///
    /// Shapes accepted by views, arrays and kernels have passed
    /// [`Shape::checked_len`], so this is exact for them.
    pub const fn len(&self) -> usize {
        self.channel_len().saturating_mul(self.extents[3])
    }

    /// Total number of elements, or [`KernelError::ShapeOverflow`] when the
    /// product of the extents does not fit in `usize`.
    pub fn checked_len(&self) -> Result<usize> {
        self.extents
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(KernelError::ShapeOverflow { shape: *self })
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear buffer index of `(x, y, t, c)`.
    #[inline]
    pub const fn linear_index(&self, x: usize, y: usize, t: usize, c: usize) -> usize {
        let [nx, ny, nt, _] = self.extents;
        x + nx * (y + ny * (t + nt * c))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, t, c] = self.extents;
        write!(f, "({x}, {y}, {t}, {c})")
    }
}

/// Per-axis down-sampling stride for the three filtered axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepVector {
    steps: [usize; 3],
}

impl StepVector {
    /// No down-sampling on any axis.
    pub const UNIT: Self = Self { steps: [1, 1, 1] };

    /// Build a step vector. A step of 0 on any axis is rejected.
    pub fn new(x: usize, y: usize, t: usize) -> Result<Self> {
        let steps = [x, y, t];
        for (axis, &s) in Axis::SPATIOTEMPORAL.iter().zip(&steps) {
            if s == 0 {
                return Err(KernelError::ZeroStep { axis: *axis });
            }
        }
        Ok(Self { steps })
    }

    /// Stride along a filtered axis. The channel axis is never strided.
    pub const fn step(&self, axis: Axis) -> usize {
        match axis {
            Axis::Channel => 1,
            _ => self.steps[axis.index()],
        }
    }

    pub const fn steps(&self) -> [usize; 3] {
        self.steps
    }
}

impl Default for StepVector {
    fn default() -> Self {
        Self::UNIT
    }
}

impl TryFrom<&[usize]> for StepVector {
    type Error = KernelError;

    fn try_from(steps: &[usize]) -> Result<Self> {
        match *steps {
            [x, y, t] => Self::new(x, y, t),
            _ => Err(KernelError::StepArity { len: steps.len() }),
        }
    }
}
