//! Maximum likelihood parameter generation.
//!
//! For details, please refer to <https://doi.org/10.1109/ICASSP.2000.861820>.

use crate::error::{Result, SynthesisError};
use crate::matrix::Matrix;
use crate::window::Windows;

pub mod likelihood;
mod matrix;

pub use self::matrix::MlpgMatrix;

/// Inverse covariance of one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Covariance {
    Diagonal(Box<[f64]>),
    Full(Matrix),
}

impl Covariance {
    pub fn len(&self) -> usize {
        match self {
            Self::Diagonal(diag) => diag.len(),
            Self::Full(matrix) => matrix.rows(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Precision of element `index`. Off-diagonal terms of a full matrix are
    /// not seen by the smoother.
    #[inline]
    pub fn precision(&self, index: usize) -> f64 {
        match self {
            Self::Diagonal(diag) => diag[index],
            Self::Full(matrix) => matrix[(index, index)],
        }
    }

    /// `x' Σ⁻¹ x`
    pub fn quadratic_form(&self, x: &[f64]) -> f64 {
        match self {
            Self::Diagonal(diag) => diag.iter().zip(x).map(|(p, x)| p * x * x).sum(),
            Self::Full(matrix) => matrix
                .iter_rows()
                .zip(x)
                .map(|(row, xi)| xi * row.iter().zip(x).map(|(p, xj)| p * xj).sum::<f64>())
                .sum(),
        }
    }
}

/// Gaussian statistics of one frame: mean, inverse covariance and the
/// determinant of the covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFrame {
    mean: Box<[f64]>,
    inverse: Covariance,
    determinant: f64,
}

impl PdfFrame {
    /// Assemble a frame from precomputed parts. Nothing is validated here;
    /// the scorer rejects non-positive determinants.
    pub fn new(mean: Vec<f64>, inverse: Covariance, determinant: f64) -> Self {
        Self {
            mean: mean.into(),
            inverse,
            determinant,
        }
    }

    /// Invert a diagonal covariance, failing as soon as the running
    /// determinant stops being positive.
    pub fn from_variances(frame: usize, mean: Vec<f64>, variances: &[f64]) -> Result<Self> {
        if mean.len() != variances.len() {
            return Err(SynthesisError::DimensionMismatch {
                context: "variance vector length",
                expected: mean.len(),
                actual: variances.len(),
            });
        }
        let mut determinant = 1.0;
        let mut inverse = Vec::with_capacity(variances.len());
        for (d, variance) in variances.iter().enumerate() {
            determinant *= variance;
            if determinant <= 0.0 || determinant.is_nan() {
                return Err(SynthesisError::NonPositiveDeterminant {
                    dimension: Some(d),
                    frame,
                    determinant,
                });
            }
            inverse.push(1.0 / variance);
        }
        Ok(Self::new(
            mean,
            Covariance::Diagonal(inverse.into()),
            determinant,
        ))
    }

    pub fn from_stddevs(frame: usize, mean: Vec<f64>, stddevs: &[f64]) -> Result<Self> {
        let variances: Vec<f64> = stddevs.iter().map(|s| s * s).collect();
        Self::from_variances(frame, mean, &variances)
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }
    pub fn inverse(&self) -> &Covariance {
        &self.inverse
    }
    pub fn determinant(&self) -> f64 {
        self.determinant
    }
}

/// Per-frame statistics for `dimension` parameters under `window_count`
/// windows. Each mean holds all static values, then all first-window deltas
/// and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    dimension: usize,
    window_count: usize,
    frames: Vec<PdfFrame>,
}

impl PdfStream {
    pub fn new(dimension: usize, window_count: usize, frames: Vec<PdfFrame>) -> Result<Self> {
        let expected = dimension * window_count;
        for frame in &frames {
            if frame.mean.len() != expected {
                return Err(SynthesisError::DimensionMismatch {
                    context: "pdf mean length",
                    expected,
                    actual: frame.mean.len(),
                });
            }
            if frame.inverse.len() != expected {
                return Err(SynthesisError::DimensionMismatch {
                    context: "pdf covariance size",
                    expected,
                    actual: frame.inverse.len(),
                });
            }
        }
        Ok(Self {
            dimension,
            window_count,
            frames,
        })
    }

    /// Diagonal statistics from per-frame means and standard deviations.
    pub fn from_stddevs(window_count: usize, means: &Matrix, stddevs: &Matrix) -> Result<Self> {
        if means.rows() != stddevs.rows() {
            return Err(SynthesisError::DimensionMismatch {
                context: "stddev frame count",
                expected: means.rows(),
                actual: stddevs.rows(),
            });
        }
        if window_count == 0 || means.cols() % window_count != 0 {
            return Err(SynthesisError::DimensionMismatch {
                context: "channels per window",
                expected: window_count,
                actual: means.cols(),
            });
        }
        let frames = means
            .iter_rows()
            .zip(stddevs.iter_rows())
            .enumerate()
            .map(|(t, (mean, stddev))| PdfFrame::from_stddevs(t, mean.to_vec(), stddev))
            .collect::<Result<Vec<_>>>()?;
        Self::new(means.cols() / window_count, window_count, frames)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
    pub fn window_count(&self) -> usize {
        self.window_count
    }
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    pub fn frames(&self) -> &[PdfFrame] {
        &self.frames
    }

    /// Static part of every mean vector, one row per frame.
    pub fn static_means(&self) -> Matrix {
        let mut out = Matrix::zeros(self.len(), self.dimension);
        for (t, frame) in self.frames.iter().enumerate() {
            out.row_mut(t).copy_from_slice(&frame.mean[..self.dimension]);
        }
        out
    }
}

/// Solves the smoothing problem for every dimension of a [`PdfStream`].
#[derive(Debug, Clone)]
pub struct ParameterGenerator<'a> {
    windows: &'a Windows,
}

impl<'a> ParameterGenerator<'a> {
    pub fn new(windows: &'a Windows) -> Self {
        Self { windows }
    }

    /// Smoothed static trajectory, one row per frame and one column per dimension.
    pub fn generate(&self, pdf: &PdfStream) -> Result<Matrix> {
        if pdf.window_count() != self.windows.size() {
            return Err(SynthesisError::DimensionMismatch {
                context: "window count",
                expected: self.windows.size(),
                actual: pdf.window_count(),
            });
        }

        let mut out = Matrix::try_zeros(pdf.len(), pdf.dimension())?;
        for dimension in 0..pdf.dimension() {
            let mut mtx = MlpgMatrix::calc_r_and_r(self.windows, pdf, dimension)?;
            let par = mtx.solve(dimension)?;
            for (t, value) in par.iter().enumerate() {
                out[(t, dimension)] = *value;
            }
            log::trace!("solved dimension {dimension} over {} frames", pdf.len());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{Covariance, ParameterGenerator, PdfFrame, PdfStream};
    use crate::error::SynthesisError;
    use crate::matrix::Matrix;
    use crate::window::Windows;

    fn stream(means: &[[f64; 2]], stddev: f64) -> PdfStream {
        let means = Matrix::from_rows(means).unwrap();
        let stddevs = Matrix::from_rows(&vec![[stddev, stddev]; means.rows()]).unwrap();
        PdfStream::from_stddevs(2, &means, &stddevs).unwrap()
    }

    #[test]
    fn static_only_copies_means() {
        let frames = [1.0, 2.0, 3.0]
            .iter()
            .map(|m| PdfFrame::new(vec![*m], Covariance::Diagonal([1.0].into()), 1.0))
            .collect();
        let pdf = PdfStream::new(1, 1, frames).unwrap();
        let windows = Windows::static_only();
        let par = ParameterGenerator::new(&windows).generate(&pdf).unwrap();
        assert_eq!(par.column(0).collect::<Vec<_>>(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn smooths_a_step() {
        let pdf = stream(&[[0.0, 0.0], [0.0, 0.0], [1.0, 0.0], [1.0, 0.0]], 1.0);
        let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();
        let par = ParameterGenerator::new(&windows).generate(&pdf).unwrap();
        let column = par.column(0).collect::<Vec<_>>();
        let expected = [4.0 / 29.0, 4.0 / 29.0, 20.0 / 29.0, 24.0 / 29.0];
        assert_eq!(column.len(), 4);
        for (actual, expected) in column.iter().zip(expected) {
            approx::assert_abs_diff_eq!(*actual, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn single_frame() {
        let pdf = stream(&[[2.5, 0.0]], 0.5);
        let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();
        let par = ParameterGenerator::new(&windows).generate(&pdf).unwrap();
        assert_eq!(par.rows(), 1);
        assert!(par[(0, 0)].is_finite());
        approx::assert_abs_diff_eq!(par[(0, 0)], 2.5, epsilon = 1e-9);
    }

    #[test]
    fn empty_stream() {
        let pdf = PdfStream::new(3, 2, vec![]).unwrap();
        let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();
        let par = ParameterGenerator::new(&windows).generate(&pdf).unwrap();
        assert_eq!(par.rows(), 0);
    }

    #[test]
    fn window_count_mismatch() {
        let pdf = stream(&[[1.0, 0.0]], 1.0);
        let windows = Windows::static_only();
        let err = ParameterGenerator::new(&windows).generate(&pdf).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::DimensionMismatch {
                context: "window count",
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn mean_length_mismatch() {
        let frame = PdfFrame::new(vec![1.0, 2.0, 3.0], Covariance::Diagonal([1.0; 3].into()), 1.0);
        let err = PdfStream::new(2, 2, vec![frame]).unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::DimensionMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn negative_variance() {
        let err = PdfFrame::from_variances(7, vec![0.0, 0.0], &[2.0, -1.0]).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::NonPositiveDeterminant {
                dimension: Some(1),
                frame: 7,
                determinant: -2.0
            }
        );
    }

    #[test]
    fn quadratic_forms_agree() {
        let diagonal = Covariance::Diagonal([2.0, 0.5].into());
        let full = Covariance::Full(Matrix::from_rows(&[[2.0, 0.0], [0.0, 0.5]]).unwrap());
        let x = [1.0, 4.0];
        approx::assert_abs_diff_eq!(diagonal.quadratic_form(&x), 10.0);
        approx::assert_abs_diff_eq!(full.quadratic_form(&x), 10.0);
    }

    #[test]
    fn static_means() {
        let pdf = stream(&[[1.0, 9.0], [2.0, 9.0]], 1.0);
        assert_eq!(pdf.dimension(), 1);
        assert_eq!(pdf.static_means().column(0).collect::<Vec<_>>(), [1.0, 2.0]);
    }
}
