//! Valid-mode 3-D correlation with per-axis down-sampling.
//!
//! The filter is applied independently to every channel of the image. Only
//! positions where the filter fully overlaps the image are evaluated; there is
//! no padding and no kernel flip.
//!
//! # Summation order
//! Every output cell is accumulated in `f64` starting from `0.0`, one
//! multiply followed by one add per tap, visiting filter taps with `ft`
//! outermost, then `fy`, then `fx`. Serial and parallel execution share this
//! order, so results are bit-identical across runs and thread counts.
//!
//! ```text
//! out[rx,ry,rt,c] = Σ_ft Σ_fy Σ_fx image[rx·sx+fx, ry·sy+fy, rt·st+ft, c] · filter[fx,fy,ft]
//! ```

use rayon::prelude::*;

use crate::array::{ArrayView, ArrayViewMut, Axis, DenseArray, Shape, StepVector};
use crate::config::KernelConfig;
use crate::error::{KernelError, Result};

/// Result shape of correlating `image` with `filter` at `step`.
///
/// Each filtered axis yields `floor((image − filter) / step) + 1` positions;
/// the channel extent is carried over. Fails when either element count
/// overflows `usize`, or when the filter has a channel axis, an empty axis,
/// or does not fit inside the image.
pub fn correlation_shape(image: Shape, filter: Shape, step: StepVector) -> Result<Shape> {
    image.checked_len()?;
    filter.checked_len()?;
    if filter.channels() != 1 {
        return Err(KernelError::FilterChannels {
            channels: filter.channels(),
        });
    }

    let mut extents = [0usize; 3];
    for (slot, axis) in extents.iter_mut().zip(Axis::SPATIOTEMPORAL) {
        let f = filter.extent(axis);
        let i = image.extent(axis);
        if f == 0 {
            return Err(KernelError::EmptyFilter { axis });
        }
        if f > i {
            return Err(KernelError::FilterExceedsImage {
                axis,
                filter: f,
                image: i,
            });
        }
        *slot = (i - f) / step.step(axis) + 1;
    }

    let [rx, ry, rt] = extents;
    Ok(Shape::new(rx, ry, rt, image.channels()))
}

/// Valid correlation with down-sampling over caller-owned buffers.
#[derive(Debug, Clone, Default)]
pub struct CorrelationKernel {
    config: KernelConfig,
}

impl CorrelationKernel {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Correlate into a pre-sized output buffer.
    ///
    /// `out` must have exactly the shape returned by [`correlation_shape`].
    /// All preconditions are checked before the first write.
    pub fn correlate_into(
        &self,
        image: ArrayView<'_>,
        filter: ArrayView<'_>,
        step: StepVector,
        out: &mut ArrayViewMut<'_>,
    ) -> Result<()> {
        let expected = correlation_shape(image.shape(), filter.shape(), step)?;
        if out.shape() != expected {
            return Err(KernelError::OutputShape {
                expected,
                actual: out.shape(),
            });
        }

        let parallel = self.config.runs_parallel(expected.len());
        tracing::debug!(
            image = %image.shape(),
            filter = %filter.shape(),
            result = %expected,
            parallel,
            "valid correlation"
        );

        let plan = Plan::new(image.shape(), filter.shape(), step, expected);
        let image = image.as_slice();
        let filter = filter.as_slice();
        let plane_len = plan.plane_len();
        let out = out.as_mut_slice();

        if parallel {
            out.par_chunks_mut(plane_len)
                .enumerate()
                .for_each(|(plane, cells)| plan.fill_plane(image, filter, plane, cells));
        } else {
            out.chunks_mut(plane_len)
                .enumerate()
                .for_each(|(plane, cells)| plan.fill_plane(image, filter, plane, cells));
        }
        Ok(())
    }

    /// Correlate into a freshly allocated array.
    pub fn correlate(
        &self,
        image: ArrayView<'_>,
        filter: ArrayView<'_>,
        step: StepVector,
    ) -> Result<DenseArray> {
        let shape = correlation_shape(image.shape(), filter.shape(), step)?;
        let mut result = DenseArray::zeros(shape)?;
        self.correlate_into(image, filter, step, &mut result.view_mut())?;
        Ok(result)
    }
}

/// Correlate with the default configuration, allocating the result.
pub fn correlate(
    image: ArrayView<'_>,
    filter: ArrayView<'_>,
    step: StepVector,
) -> Result<DenseArray> {
    CorrelationKernel::default().correlate(image, filter, step)
}

/// Validated index bookkeeping for one correlation call.
///
/// The output is split into planes of `rx·ry` cells, one per `(rt, c)` pair;
/// plane `p` covers `rt = p % rt_len`, `c = p / rt_len`.
struct Plan {
    image: Shape,
    filter: [usize; 3],
    step: [usize; 3],
    result: [usize; 3],
}

impl Plan {
    fn new(image: Shape, filter: Shape, step: StepVector, result: Shape) -> Self {
        let [fx, fy, ft, _] = filter.extents();
        let [rx, ry, rt, _] = result.extents();
        Self {
            image,
            filter: [fx, fy, ft],
            step: step.steps(),
            result: [rx, ry, rt],
        }
    }

    fn plane_len(&self) -> usize {
        self.result[0] * self.result[1]
    }

    #[inline]
    fn fill_plane(&self, image: &[f64], filter: &[f64], plane: usize, cells: &mut [f64]) {
        let [fx_len, fy_len, ft_len] = self.filter;
        let [sx, sy, st] = self.step;
        let [rx_len, _, rt_len] = self.result;
        let rt = plane % rt_len;
        let c = plane / rt_len;

        for (ry, row) in cells.chunks_mut(rx_len).enumerate() {
            for (rx, cell) in row.iter_mut().enumerate() {
                let mut sum = 0.0_f64;
                for ft in 0..ft_len {
                    for fy in 0..fy_len {
                        let img_start =
                            self.image.linear_index(rx * sx, ry * sy + fy, rt * st + ft, c);
                        let filt_start = (ft * fy_len + fy) * fx_len;
                        let taps = image[img_start..img_start + fx_len]
                            .iter()
                            .zip(&filter[filt_start..filt_start + fx_len]);
                        for (&v, &w) in taps {
                            sum += v * w;
                        }
                    }
                }
                *cell = sum;
            }
        }
    }
}
