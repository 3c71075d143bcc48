//! Shape + buffer descriptors passed across the kernel boundary.
//!
//! Views borrow caller-owned memory; the kernels never allocate through them.
//! [`DenseArray`] is the owned counterpart returned by the allocating entry
//! points.

use crate::array::shape::Shape;
use crate::error::{KernelError, Result};

fn check_len(shape: Shape, actual: usize) -> Result<()> {
    let expected = shape.checked_len()?;
    if expected != actual {
        return Err(KernelError::BufferLength {
            shape,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Read-only view over a contiguous `f64` buffer with explicit shape.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a> {
    shape: Shape,
    data: &'a [f64],
}

impl<'a> ArrayView<'a> {
    /// Wrap a buffer whose length must equal `shape.len()`.
    pub fn new(shape: Shape, data: &'a [f64]) -> Result<Self> {
        check_len(shape, data.len())?;
        Ok(Self { shape, data })
    }

    /// Zero-copy view over raw native-endian bytes from a host environment.
    ///
    /// The byte buffer must be 8-byte aligned and hold exactly `shape.len()`
    /// values.
    pub fn from_bytes(shape: Shape, bytes: &'a [u8]) -> Result<Self> {
        let data = bytemuck::try_cast_slice::<u8, f64>(bytes).map_err(KernelError::ByteCast)?;
        Self::new(shape, data)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }

    /// Value at `(x, y, t, c)`. Panics when out of range.
    #[inline]
    pub fn get(&self, x: usize, y: usize, t: usize, c: usize) -> f64 {
        self.data[self.shape.linear_index(x, y, t, c)]
    }

    /// View of a single channel, with a channel extent of 1.
    pub fn channel(&self, c: usize) -> Option<ArrayView<'a>> {
        if c >= self.shape.channels() {
            return None;
        }
        let [x, y, t, _] = self.shape.extents();
        let len = self.shape.channel_len();
        Some(ArrayView {
            shape: Shape::spatial(x, y, t),
            data: &self.data[c * len..(c + 1) * len],
        })
    }
}

/// Writable view over a caller-owned output buffer.
#[derive(Debug)]
pub struct ArrayViewMut<'a> {
    shape: Shape,
    data: &'a mut [f64],
}

impl<'a> ArrayViewMut<'a> {
    /// Wrap a buffer whose length must equal `shape.len()`.
    pub fn new(shape: Shape, data: &'a mut [f64]) -> Result<Self> {
        check_len(shape, data.len())?;
        Ok(Self { shape, data })
    }

    /// Zero-copy mutable view over raw native-endian bytes.
    pub fn from_bytes(shape: Shape, bytes: &'a mut [u8]) -> Result<Self> {
        let data =
            bytemuck::try_cast_slice_mut::<u8, f64>(bytes).map_err(KernelError::ByteCast)?;
        Self::new(shape, data)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn as_slice(&self) -> &[f64] {
        &*self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut *self.data
    }
}

/// Owned dense array.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseArray {
    shape: Shape,
    data: Vec<f64>,
}

impl DenseArray {
    /// Take ownership of a buffer whose length must equal `shape.len()`.
    pub fn from_vec(shape: Shape, data: Vec<f64>) -> Result<Self> {
        check_len(shape, data.len())?;
        Ok(Self { shape, data })
    }

    /// Zero-filled array. Fails when the element count overflows `usize`.
    pub fn zeros(shape: Shape) -> Result<Self> {
        let len = shape.checked_len()?;
        Ok(Self {
            shape,
            data: vec![0.0; len],
        })
    }

    /// Fill an array by evaluating `f(x, y, t, c)` at every coordinate.
    ///
    /// Panics with a capacity overflow when the element count does not fit
    /// in memory; use [`DenseArray::zeros`] for a fallible allocation.
    pub fn from_fn(shape: Shape, mut f: impl FnMut(usize, usize, usize, usize) -> f64) -> Self {
        let [nx, ny, nt, nc] = shape.extents();
        let mut data = Vec::with_capacity(shape.len());
        for c in 0..nc {
            for t in 0..nt {
                for y in 0..ny {
                    for x in 0..nx {
                        data.push(f(x, y, t, c));
                    }
                }
            }
        }
        Self { shape, data }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, t: usize, c: usize) -> f64 {
        self.data[self.shape.linear_index(x, y, t, c)]
    }

    pub fn view(&self) -> ArrayView<'_> {
        ArrayView {
            shape: self.shape,
            data: &self.data,
        }
    }

    pub fn view_mut(&mut self) -> ArrayViewMut<'_> {
        ArrayViewMut {
            shape: self.shape,
            data: &mut self.data,
        }
    }
}
