use crate::error::{Result, SynthesisError};
use crate::matrix::BandMatrix;
use crate::util::try_zeroed;
use crate::window::Windows;

use super::PdfStream;

/// MLPG matrices for one parameter dimension.
#[derive(Debug, Clone)]
pub struct MlpgMatrix {
    length: usize,
    width: usize,
    /// W^T U^{-1} W, replaced by its Cholesky factor by [`MlpgMatrix::solve`]
    r_matrix: BandMatrix,
    /// W^T U^{-1} \mu
    r_vector: Box<[f64]>,
}

impl MlpgMatrix {
    /// Calculate W^T U^{-1} W and W^T U^{-1} \mu for `dimension`.
    pub fn calc_r_and_r(windows: &Windows, pdf: &PdfStream, dimension: usize) -> Result<Self> {
        if dimension >= pdf.dimension() {
            return Err(SynthesisError::DimensionMismatch {
                context: "mlpg dimension",
                expected: pdf.dimension(),
                actual: dimension,
            });
        }

        let length = pdf.len();
        let width = windows.band_width();
        let mut r_matrix = BandMatrix::zeros(length, width)?;
        let mut r_vector = try_zeroed(length, "mlpg vector")?;

        for i in 0..length {
            for (j, window) in windows.iter().enumerate() {
                let index = j * pdf.dimension() + dimension;
                // frame i + k sees frame i through coefficient -k
                for k in -window.right()..=-window.left() {
                    let n = i as isize + k;
                    if n < 0 || n >= length as isize {
                        continue;
                    }
                    let coef = window.coefficient(-k);
                    if coef == 0.0 {
                        continue;
                    }

                    let frame = &pdf.frames()[n as usize];
                    let wu = coef * frame.inverse().precision(index);
                    r_vector[i] += wu * frame.mean()[index];

                    for l in 0..width {
                        if i + l >= length {
                            break;
                        }
                        let inner = window.coefficient(l as isize - k);
                        if inner != 0.0 {
                            r_matrix[(i, l)] += wu * inner;
                        }
                    }
                }
            }
        }

        Ok(Self {
            length,
            width,
            r_matrix,
            r_vector,
        })
    }

    pub fn band(&self) -> &BandMatrix {
        &self.r_matrix
    }
    pub fn rhs(&self) -> &[f64] {
        &self.r_vector
    }

    /// Solve equation $W^T U^{-1} W c = W^T U^{-1} \mu$ and return the vector $c$.
    pub fn solve(&mut self, dimension: usize) -> Result<Box<[f64]>> {
        self.cholesky(dimension)?;
        let g = self.forward_substitution();
        Ok(self.backward_substitution(&g))
    }

    /// In-place Cholesky factorization, R = U^T U with U stored in the band.
    fn cholesky(&mut self, dimension: usize) -> Result<()> {
        let r = &mut self.r_matrix;
        for t in 0..self.length {
            let mut diag = r[(t, 0)];
            for j in 1..self.width.min(t + 1) {
                diag -= r[(t - j, j)] * r[(t - j, j)];
            }
            if !(diag > 0.0 && diag.is_finite()) {
                return Err(SynthesisError::NonPositiveDeterminant {
                    dimension: Some(dimension),
                    frame: t,
                    determinant: diag,
                });
            }
            let diag = diag.sqrt();
            r[(t, 0)] = diag;

            for j in 1..self.width {
                let mut value = r[(t, j)];
                for k in 1..(self.width - j).min(t + 1) {
                    value -= r[(t - k, k)] * r[(t - k, j + k)];
                }
                r[(t, j)] = value / diag;
            }
        }
        Ok(())
    }

    /// Solve U^T g = r.
    fn forward_substitution(&self) -> Box<[f64]> {
        let r = &self.r_matrix;
        let mut g = boxed_slice![0.0; self.length];
        for t in 0..self.length {
            let mut value = self.r_vector[t];
            for j in 1..self.width.min(t + 1) {
                value -= r[(t - j, j)] * g[t - j];
            }
            g[t] = value / r[(t, 0)];
        }
        g
    }

    /// Solve U c = g.
    fn backward_substitution(&self, g: &[f64]) -> Box<[f64]> {
        let r = &self.r_matrix;
        let mut par = boxed_slice![0.0; self.length];
        for t in (0..self.length).rev() {
            let mut value = g[t];
            for j in 1..self.width.min(self.length - t) {
                value -= r[(t, j)] * par[t + j];
            }
            par[t] = value / r[(t, 0)];
        }
        par
    }
}
