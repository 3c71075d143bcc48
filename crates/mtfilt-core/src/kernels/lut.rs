//! Piecewise-linear lookup tables for point nonlinearities.
//!
//! A table holds samples of a scalar function at `origin + i·increment`.
//! Evaluation interpolates linearly between neighbouring samples and clamps
//! to the boundary sample outside the table's domain.
//!
//! # Boundary policy
//! ```text
//! pos = (v − origin) / increment
//! increment == 0   → lut[0]                     (degenerate table)
//! pos < 0          → lut[0],    left clamp
//! pos >= last      → lut[last], right clamp
//! otherwise        → lut[i] + (lut[i+1] − lut[i])·(pos − i),  i = floor(pos)
//! ```
//! Clamping is data-dependent and never an error. It is reported through
//! [`ClampReport`], and optionally logged at most once per side per call.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::array::{ArrayView, DenseArray};
use crate::config::KernelConfig;
use crate::error::{KernelError, Result};

/// Elements per parallel work unit.
const PAR_CHUNK: usize = 4096;

/// Borrowed lookup table: samples plus the abscissa of the first sample and
/// the spacing between samples.
///
/// Borrows its samples so that building a table per call allocates nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTable<'a> {
    samples: &'a [f64],
    origin: f64,
    increment: f64,
}

impl<'a> LookupTable<'a> {
    /// Validate and wrap a table. Needs at least two samples and a finite
    /// origin and increment. An increment of zero is accepted.
    pub fn new(samples: &'a [f64], origin: f64, increment: f64) -> Result<Self> {
        if samples.len() < 2 {
            return Err(KernelError::LutTooShort {
                len: samples.len(),
            });
        }
        if !origin.is_finite() {
            return Err(KernelError::NonFiniteLutParameter {
                name: "origin",
                value: origin,
            });
        }
        if !increment.is_finite() {
            return Err(KernelError::NonFiniteLutParameter {
                name: "increment",
                value: increment,
            });
        }
        Ok(Self {
            samples,
            origin,
            increment,
        })
    }

    pub fn samples(&self) -> &'a [f64] {
        self.samples
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Abscissa of sample `i`.
    pub fn abscissa(&self, i: usize) -> f64 {
        self.origin + i as f64 * self.increment
    }

    /// Evaluate a single value, discarding clamp information.
    pub fn evaluate(&self, v: f64) -> f64 {
        self.eval(v, &mut ClampReport::default())
    }

    #[inline]
    fn eval(&self, v: f64, report: &mut ClampReport) -> f64 {
        let lut = self.samples;
        let last = lut.len() - 1;
        if self.increment == 0.0 {
            return lut[0];
        }

        let pos = (v - self.origin) / self.increment;
        if pos < 0.0 {
            report.left = true;
            return lut[0];
        }
        // `floor(pos) > last − 1`: the last abscissa itself counts as a
        // right clamp.
        if pos >= last as f64 {
            report.right = true;
            return lut[last];
        }

        // NaN positions fail both comparisons above and land here with
        // index 0, so the NaN propagates through the interpolation.
        let idx = pos.floor() as usize;
        let lo = lut[idx];
        let hi = lut[idx + 1];
        lo + (hi - lo) * (pos - idx as f64)
    }

    fn eval_slice(&self, input: &[f64], out: &mut [f64]) -> ClampReport {
        let mut report = ClampReport::default();
        for (o, &v) in out.iter_mut().zip(input) {
            *o = self.eval(v, &mut report);
        }
        report
    }
}

/// Which table boundaries were hit during one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClampReport {
    /// Some input fell below the first abscissa.
    pub left: bool,
    /// Some input fell at or above the last abscissa.
    pub right: bool,
}

impl ClampReport {
    pub fn any(&self) -> bool {
        self.left || self.right
    }

    fn merge(self, other: Self) -> Self {
        Self {
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }
}

/// Output of [`LutTransform::apply`]: the transformed array and clamp flags.
#[derive(Debug, Clone, PartialEq)]
pub struct LutOutput {
    pub output: DenseArray,
    pub clamped: ClampReport,
}

/// Applies a lookup table to every element of an array.
#[derive(Debug, Clone)]
pub struct LutTransform {
    config: KernelConfig,
}

impl Default for LutTransform {
    fn default() -> Self {
        Self::new(&KernelConfig::default())
    }
}

impl LutTransform {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Override whether clamping is logged. Outputs and flags are unaffected.
    pub fn with_warnings(mut self, warn_on_clamp: bool) -> Self {
        self.config.warn_on_clamp = warn_on_clamp;
        self
    }

    /// Transform `input` into `out`, which must have the same length.
    pub fn apply_into(
        &self,
        input: &[f64],
        lut: &LookupTable<'_>,
        out: &mut [f64],
    ) -> Result<ClampReport> {
        if out.len() != input.len() {
            return Err(KernelError::OutputLength {
                expected: input.len(),
                actual: out.len(),
            });
        }

        let report = if self.config.runs_parallel(input.len()) {
            out.par_chunks_mut(PAR_CHUNK)
                .zip(input.par_chunks(PAR_CHUNK))
                .map(|(o, i)| lut.eval_slice(i, o))
                .reduce(ClampReport::default, ClampReport::merge)
        } else {
            lut.eval_slice(input, out)
        };

        if self.config.warn_on_clamp {
            if report.left {
                tracing::warn!(
                    "input below lookup table domain (origin {}); clamping",
                    lut.origin
                );
            }
            if report.right {
                tracing::warn!(
                    "input above lookup table domain (last abscissa {}); clamping",
                    lut.abscissa(lut.samples.len() - 1)
                );
            }
        }
        Ok(report)
    }

    /// Transform an array into a freshly allocated array of the same shape.
    pub fn apply(&self, input: ArrayView<'_>, lut: &LookupTable<'_>) -> Result<LutOutput> {
        let mut output = DenseArray::zeros(input.shape())?;
        let clamped = self.apply_into(input.as_slice(), lut, output.as_mut_slice())?;
        Ok(LutOutput { output, clamped })
    }
}

/// Apply `lut` to `input` with the default configuration.
pub fn apply_lut(
    input: ArrayView<'_>,
    lut: &LookupTable<'_>,
    warn_on_clamp: bool,
) -> Result<LutOutput> {
    LutTransform::default()
        .with_warnings(warn_on_clamp)
        .apply(input, lut)
}

/// An owned table produced by sampling a scalar function.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedLut {
    samples: Vec<f64>,
    origin: f64,
    increment: f64,
}

impl BakedLut {
    /// Sample `f` at `size` evenly spaced points from `lo` to `hi` inclusive.
    pub fn sample(f: impl Fn(f64) -> f64, lo: f64, hi: f64, size: usize) -> Result<Self> {
        if size < 2 {
            return Err(KernelError::LutTooShort { len: size });
        }
        if !lo.is_finite() || !hi.is_finite() || hi < lo {
            return Err(KernelError::BakeRange { lo, hi });
        }

        let increment = (hi - lo) / (size - 1) as f64;
        let samples = (0..size).map(|i| f(lo + i as f64 * increment)).collect();
        Ok(Self {
            samples,
            origin: lo,
            increment,
        })
    }

    pub fn table(&self) -> LookupTable<'_> {
        LookupTable {
            samples: &self.samples,
            origin: self.origin,
            increment: self.increment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Shape;

    const EPSILON: f64 = 1e-12;

    fn run(input: &[f64], lut: &LookupTable<'_>) -> (Vec<f64>, ClampReport) {
        let mut out = vec![0.0; input.len()];
        let report = LutTransform::new(&KernelConfig::serial())
            .with_warnings(false)
            .apply_into(input, lut, &mut out)
            .unwrap();
        (out, report)
    }

    #[test]
    fn test_two_point_table_interpolates_midpoint() {
        let samples = [2.0, 6.0];
        let lut = LookupTable::new(&samples, 0.0, 1.0).unwrap();
        let (out, report) = run(&[0.5], &lut);
        assert!((out[0] - 4.0).abs() < EPSILON);
        assert!(!report.any());
    }

    #[test]
    fn test_left_clamp_returns_first_sample() {
        let samples = [2.0, 6.0];
        let lut = LookupTable::new(&samples, 0.0, 1.0).unwrap();
        let (out, report) = run(&[-1.0], &lut);
        assert_eq!(out[0], 2.0);
        assert_eq!(
            report,
            ClampReport {
                left: true,
                right: false
            }
        );
    }

    #[test]
    fn test_right_clamp_returns_last_sample() {
        let samples = [2.0, 6.0];
        let lut = LookupTable::new(&samples, 0.0, 1.0).unwrap();
        let (out, report) = run(&[2.0], &lut);
        assert_eq!(out[0], 6.0);
        assert_eq!(
            report,
            ClampReport {
                left: false,
                right: true
            }
        );
    }

    #[test]
    fn test_last_abscissa_sets_right_clamp() {
        let samples = [0.0, 1.0, 4.0];
        let lut = LookupTable::new(&samples, 0.0, 0.5).unwrap();
        let (out, report) = run(&[1.0], &lut);
        assert_eq!(out[0], 4.0);
        assert_eq!(
            report,
            ClampReport {
                left: false,
                right: true
            }
        );

        // Just inside the domain interpolates without a flag.
        let (out, report) = run(&[0.75], &lut);
        assert!((out[0] - 2.5).abs() < EPSILON);
        assert!(!report.any());
    }

    #[test]
    fn test_two_point_table_upper_abscissa_is_right_clamp() {
        let samples = [1.0, 3.0];
        let lut = LookupTable::new(&samples, 0.0, 1.0).unwrap();
        let (out, report) = run(&[1.0], &lut);
        assert_eq!(out[0], 3.0);
        assert!(report.right);
        assert!(!report.left);
    }

    #[test]
    fn test_with_warnings_only_touches_warning_policy() {
        let config = KernelConfig {
            parallel_threshold: 7,
            warn_on_clamp: true,
        };
        let transform = LutTransform::new(&config).with_warnings(false);
        assert_eq!(transform.config().parallel_threshold, 7);
        assert!(!transform.config().warn_on_clamp);
    }

    #[test]
    fn test_zero_increment_returns_first_sample() {
        let samples = [3.5, -1.0, 8.0];
        let lut = LookupTable::new(&samples, 10.0, 0.0).unwrap();
        let (out, report) = run(&[-100.0, 0.0, 10.0, 1e9, f64::NAN], &lut);
        assert!(out.iter().all(|&v| v == 3.5));
        assert!(!report.any());
    }

    #[test]
    fn test_clamp_flags_are_independent() {
        let samples = [0.0, 1.0, 2.0, 3.0];
        let lut = LookupTable::new(&samples, 0.0, 1.0).unwrap();

        let (_, left_only) = run(&[-5.0, -0.1, 1.5], &lut);
        assert_eq!(
            left_only,
            ClampReport {
                left: true,
                right: false
            }
        );

        let (_, both) = run(&[-5.0, 4.0], &lut);
        assert_eq!(
            both,
            ClampReport {
                left: true,
                right: true
            }
        );
    }

    #[test]
    fn test_origin_and_increment_map_abscissae() {
        // Samples of 2x + 1 at x = -1, -0.75, ..., 1.
        let samples: Vec<f64> = (0..9).map(|i| 2.0 * (-1.0 + i as f64 * 0.25) + 1.0).collect();
        let lut = LookupTable::new(&samples, -1.0, 0.25).unwrap();
        let (out, _) = run(&[-0.6, 0.1, 0.9], &lut);
        for (x, y) in [-0.6, 0.1, 0.9].iter().zip(&out) {
            assert!((y - (2.0 * x + 1.0)).abs() < 1e-9, "x={x} y={y}");
        }
    }

    #[test]
    fn test_negative_increment_reads_descending_abscissae() {
        let samples = [10.0, 20.0, 30.0];
        let lut = LookupTable::new(&samples, 2.0, -1.0).unwrap();
        assert_eq!(lut.evaluate(2.0), 10.0);
        assert!((lut.evaluate(1.5) - 15.0).abs() < EPSILON);
        assert_eq!(lut.evaluate(-3.0), 30.0);
    }

    #[test]
    fn test_nan_input_propagates_without_flags() {
        let samples = [0.0, 1.0];
        let lut = LookupTable::new(&samples, 0.0, 1.0).unwrap();
        let (out, report) = run(&[f64::NAN], &lut);
        assert!(out[0].is_nan());
        assert!(!report.any());
    }

    #[test]
    fn test_warning_flag_does_not_change_results() {
        let samples = [1.0, 2.0, 5.0];
        let lut = LookupTable::new(&samples, 0.0, 1.0).unwrap();
        let input = DenseArray::from_vec(Shape::spatial(4, 1, 1), vec![-1.0, 0.25, 1.5, 9.0])
            .unwrap();

        let loud = apply_lut(input.view(), &lut, true).unwrap();
        let quiet = apply_lut(input.view(), &lut, false).unwrap();
        assert_eq!(loud, quiet);
        assert_eq!(loud.output.shape(), input.shape());
        assert!(loud.clamped.left && loud.clamped.right);
    }

    #[test]
    fn test_short_table_is_rejected() {
        let err = LookupTable::new(&[1.0], 0.0, 1.0).unwrap_err();
        assert!(matches!(err, KernelError::LutTooShort { len: 1 }));
    }

    #[test]
    fn test_non_finite_parameters_are_rejected() {
        let samples = [0.0, 1.0];
        let err = LookupTable::new(&samples, f64::NAN, 1.0).unwrap_err();
        assert!(matches!(
            err,
            KernelError::NonFiniteLutParameter { name: "origin", .. }
        ));
        let err = LookupTable::new(&samples, 0.0, f64::INFINITY).unwrap_err();
        assert!(matches!(
            err,
            KernelError::NonFiniteLutParameter {
                name: "increment",
                ..
            }
        ));
    }

    #[test]
    fn test_output_length_mismatch_is_rejected() {
        let samples = [0.0, 1.0];
        let lut = LookupTable::new(&samples, 0.0, 1.0).unwrap();
        let mut out = vec![0.0; 2];
        let err = LutTransform::default()
            .apply_into(&[0.1, 0.2, 0.3], &lut, &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::OutputLength {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let samples: Vec<f64> = (0..33).map(|i| ((i as f64) * 0.3).sin()).collect();
        let lut = LookupTable::new(&samples, -1.0, 0.125).unwrap();
        let input: Vec<f64> = (0..3 * PAR_CHUNK + 17)
            .map(|i| -2.0 + (i as f64) * 7.0 / (3 * PAR_CHUNK) as f64)
            .collect();

        let (serial, serial_report) = run(&input, &lut);
        let mut parallel = vec![0.0; input.len()];
        let parallel_report = LutTransform::new(&KernelConfig {
            parallel_threshold: 0,
            warn_on_clamp: false,
        })
        .apply_into(&input, &lut, &mut parallel)
        .unwrap();

        assert_eq!(serial, parallel);
        assert_eq!(serial_report, parallel_report);
        assert!(parallel_report.left && parallel_report.right);
    }

    #[test]
    fn test_baked_half_square_rectifier() {
        let baked = BakedLut::sample(|x| x.max(0.0).powi(2), -1.0, 1.0, 201).unwrap();
        let lut = baked.table();
        assert!((lut.increment() - 0.01).abs() < EPSILON);
        assert_eq!(lut.evaluate(-0.5), 0.0);
        assert!((lut.evaluate(0.5) - 0.25).abs() < 1e-9);
        assert!((lut.evaluate(0.505) - 0.255025).abs() < 1e-4);
    }

    #[test]
    fn test_bake_rejects_bad_range() {
        let err = BakedLut::sample(|x| x, 1.0, -1.0, 8).unwrap_err();
        assert!(matches!(err, KernelError::BakeRange { .. }));
        let err = BakedLut::sample(|x| x, 0.0, 1.0, 1).unwrap_err();
        assert!(matches!(err, KernelError::LutTooShort { len: 1 }));
    }
}
