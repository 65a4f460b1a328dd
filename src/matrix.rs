//! Owned dense and banded matrices.

use std::ops::{Index, IndexMut};

use crate::error::{Result, SynthesisError};
use crate::util::try_zeroed;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    buffer: Box<[f64]>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            buffer: boxed_slice![0.0; rows * cols],
        }
    }

    /// Like [`Matrix::zeros`], but reports allocation failure.
    pub fn try_zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or(SynthesisError::AllocationFailure {
                context: "matrix",
                requested: usize::MAX,
            })?;
        Ok(Self {
            rows,
            cols,
            buffer: try_zeroed(len, "matrix")?,
        })
    }

    /// Build a matrix from rows of equal length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        let mut matrix = Self::try_zeros(rows.len(), cols)?;
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(SynthesisError::DimensionMismatch {
                    context: "matrix row length",
                    expected: cols,
                    actual: row.len(),
                });
            }
            matrix.row_mut(i).copy_from_slice(row);
        }
        Ok(matrix)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.buffer[row * self.cols..(row + 1) * self.cols]
    }
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.buffer[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl '_ + Iterator<Item = &[f64]> {
        // chunks_exact panics on zero
        self.buffer.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    pub fn column(&self, col: usize) -> impl '_ + Iterator<Item = f64> {
        (0..self.rows).map(move |row| self[(row, col)])
    }

    /// Column-wise copy of `cols` columns starting at `start`.
    pub fn columns(&self, start: usize, cols: usize) -> Self {
        let mut out = Self::zeros(self.rows, cols);
        for row in 0..self.rows {
            out.row_mut(row)
                .copy_from_slice(&self.row(row)[start..start + cols]);
        }
        out
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(col < self.cols, "column {col} out of {}", self.cols);
        &self.buffer[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        assert!(col < self.cols, "column {col} out of {}", self.cols);
        &mut self.buffer[row * self.cols + col]
    }
}

/// Upper band of a symmetric banded matrix.
///
/// Entry `(t, j)` holds element `(t, t + j)` of the full matrix; the lower
/// half is implied by symmetry.
#[derive(Debug, Clone, PartialEq)]
pub struct BandMatrix {
    rows: usize,
    width: usize,
    buffer: Box<[f64]>,
}

impl BandMatrix {
    pub fn zeros(rows: usize, width: usize) -> Result<Self> {
        let len = rows
            .checked_mul(width)
            .ok_or(SynthesisError::AllocationFailure {
                context: "band matrix",
                requested: usize::MAX,
            })?;
        Ok(Self {
            rows,
            width,
            buffer: try_zeroed(len, "band matrix")?,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns `None` outside of the band or past the last row.
    pub fn get(&self, row: usize, offset: usize) -> Option<f64> {
        if row < self.rows && offset < self.width {
            Some(self.buffer[row * self.width + offset])
        } else {
            None
        }
    }

    /// Multiply the full symmetric matrix by `x`.
    pub fn mul_vec(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.rows {
            return Err(SynthesisError::DimensionMismatch {
                context: "band matrix product",
                expected: self.rows,
                actual: x.len(),
            });
        }
        let y = (0..self.rows)
            .map(|t| {
                let mut sum = self[(t, 0)] * x[t];
                for j in 1..self.width {
                    if t + j < self.rows {
                        sum += self[(t, j)] * x[t + j];
                    }
                    if t >= j {
                        sum += self[(t - j, j)] * x[t - j];
                    }
                }
                sum
            })
            .collect();
        Ok(y)
    }
}

impl Index<(usize, usize)> for BandMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, offset): (usize, usize)) -> &Self::Output {
        assert!(offset < self.width, "band offset {offset} out of {}", self.width);
        &self.buffer[row * self.width + offset]
    }
}

impl IndexMut<(usize, usize)> for BandMatrix {
    #[inline]
    fn index_mut(&mut self, (row, offset): (usize, usize)) -> &mut Self::Output {
        assert!(offset < self.width, "band offset {offset} out of {}", self.width);
        &mut self.buffer[row * self.width + offset]
    }
}

#[cfg(test)]
mod tests {
    use super::{BandMatrix, Matrix};
    use crate::error::SynthesisError;

    #[test]
    fn rows_and_columns() {
        let matrix = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.cols(), 2);
        assert_eq!(matrix[(2, 1)], 6.0);
        assert_eq!(matrix.column(0).collect::<Vec<_>>(), [1.0, 3.0, 5.0]);
        assert_eq!(matrix.iter_rows().count(), 3);
        assert_eq!(matrix.columns(1, 1).row(1), &[4.0]);
    }

    #[test]
    fn ragged_rows() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::DimensionMismatch {
                context: "matrix row length",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    #[should_panic]
    fn column_out_of_range() {
        let matrix = Matrix::zeros(2, 2);
        let _ = matrix[(0, 2)];
    }

    #[test]
    fn band_accessors() {
        let mut band = BandMatrix::zeros(3, 2).unwrap();
        band[(1, 1)] = 4.0;
        assert_eq!(band.get(1, 1), Some(4.0));
        assert_eq!(band.get(1, 2), None);
        assert_eq!(band.get(3, 0), None);
    }

    #[test]
    fn band_product() {
        // [[2, 1, 0], [1, 2, 1], [0, 1, 2]]
        let mut band = BandMatrix::zeros(3, 2).unwrap();
        for t in 0..3 {
            band[(t, 0)] = 2.0;
        }
        band[(0, 1)] = 1.0;
        band[(1, 1)] = 1.0;
        let y = band.mul_vec(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(y, [4.0, 8.0, 8.0]);
        assert!(band.mul_vec(&[1.0]).is_err());
    }
}
