//! Dynamic-feature windows and delta computation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};
use crate::matrix::Matrix;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Window>", into = "Vec<Window>")]
pub struct Windows {
    windows: Vec<Window>,
}

impl Windows {
    /// At least the static window is required.
    pub fn new(windows: Vec<Window>) -> Result<Self> {
        if windows.is_empty() {
            return Err(SynthesisError::DimensionMismatch {
                context: "windows",
                expected: 1,
                actual: 0,
            });
        }
        Ok(Self { windows })
    }

    /// A static window only.
    pub fn static_only() -> Self {
        Self {
            windows: vec![Window::static_window()],
        }
    }

    /// The static window followed by one delta window.
    pub fn with_delta(delta: Vec<f64>) -> Result<Self> {
        Self::new(vec![Window::static_window(), Window::new(delta)?])
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item = &Window> {
        self.windows.iter()
    }
    pub fn size(&self) -> usize {
        self.windows.len()
    }

    /// Windows other than the first (static) one.
    pub fn dynamic(&self) -> impl '_ + Iterator<Item = &Window> {
        self.windows.iter().skip(1)
    }

    pub fn max_left(&self) -> isize {
        self.windows.iter().map(Window::left).min().unwrap_or(0)
    }
    pub fn max_right(&self) -> isize {
        self.windows.iter().map(Window::right).max().unwrap_or(0)
    }

    /// Band width of the normal equations built from these windows,
    /// `2 * max_right + 1` for centred windows.
    pub fn band_width(&self) -> usize {
        self.windows
            .iter()
            .map(|window| (window.right() - window.left()) as usize)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Delta features of `statics`, one matrix per dynamic window.
    pub fn deltas(&self, statics: &Matrix) -> Vec<Matrix> {
        self.dynamic().map(|window| window.apply(statics)).collect()
    }

    /// Static features followed by every delta, window-major per frame.
    pub fn observations(&self, statics: &Matrix) -> Matrix {
        let dim = statics.cols();
        let deltas = self.deltas(statics);
        let mut out = Matrix::zeros(statics.rows(), dim * self.size());
        for t in 0..statics.rows() {
            let row = out.row_mut(t);
            row[..dim].copy_from_slice(statics.row(t));
            for (i, delta) in deltas.iter().enumerate() {
                row[(i + 1) * dim..(i + 2) * dim].copy_from_slice(delta.row(t));
            }
        }
        out
    }
}

impl TryFrom<Vec<Window>> for Windows {
    type Error = SynthesisError;

    fn try_from(windows: Vec<Window>) -> Result<Self> {
        Self::new(windows)
    }
}

impl From<Windows> for Vec<Window> {
    fn from(windows: Windows) -> Self {
        windows.windows
    }
}

/// Regression window over the neighbouring frames `left..=right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Window {
    left: isize,
    coefficients: Box<[f64]>,
}

impl Window {
    /// Window centred on the middle coefficient.
    ///
    /// With `2L + 1` coefficients the window spans `-L..=L`; with `2L` it
    /// spans `-L..=L-1`.
    pub fn new(coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(SynthesisError::DimensionMismatch {
                context: "window coefficients",
                expected: 1,
                actual: 0,
            });
        }
        let left = -((coefficients.len() / 2) as isize);
        Ok(Self {
            left,
            coefficients: coefficients.into(),
        })
    }

    pub fn static_window() -> Self {
        Self {
            left: 0,
            coefficients: [1.0].into(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.coefficients.len()
    }
    #[inline]
    pub fn left(&self) -> isize {
        self.left
    }
    #[inline]
    pub fn right(&self) -> isize {
        self.left + self.width() as isize - 1
    }

    /// Coefficient applied to the frame at `offset`, zero outside the window.
    #[inline]
    pub fn coefficient(&self, offset: isize) -> f64 {
        if offset < self.left || offset > self.right() {
            0.0
        } else {
            self.coefficients[(offset - self.left) as usize]
        }
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item = (isize, f64)> {
        let left = self.left;
        self.coefficients
            .iter()
            .enumerate()
            .map(move |(idx, coef)| (left + idx as isize, *coef))
    }

    /// Weighted sum of neighbouring frames, reflecting the track at both ends.
    pub fn apply(&self, statics: &Matrix) -> Matrix {
        let length = statics.rows();
        let mut out = Matrix::zeros(length, statics.cols());
        for t in 0..length {
            for (offset, coef) in self.iter() {
                let n = t as isize + offset;
                for d in 0..statics.cols() {
                    out[(t, d)] += coef * reflected(statics, n, d);
                }
            }
        }
        out
    }
}

/// Value at frame `n`, extended past the ends by `2 * edge - mirror`.
fn reflected(statics: &Matrix, n: isize, d: usize) -> f64 {
    let last = statics.rows() as isize - 1;
    let mirror = |n: isize| statics[(n.clamp(0, last) as usize, d)];
    if n < 0 {
        2.0 * statics[(0, d)] - mirror(-n)
    } else if n > last {
        2.0 * statics[(last as usize, d)] - mirror(2 * last - n)
    } else {
        statics[(n as usize, d)]
    }
}

impl TryFrom<Vec<f64>> for Window {
    type Error = SynthesisError;

    fn try_from(coefficients: Vec<f64>) -> Result<Self> {
        Self::new(coefficients)
    }
}

impl From<Window> for Vec<f64> {
    fn from(window: Window) -> Self {
        window.coefficients.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::{Window, Windows};
    use crate::error::SynthesisError;
    use crate::matrix::Matrix;

    #[test]
    fn width_1() {
        let window = Window::new(vec![1.0]).unwrap();
        assert_eq!(window.width(), 1);
        assert_eq!(window.left(), 0);
        assert_eq!(window.right(), 0);
    }

    #[test]
    fn width_3() {
        let window = Window::new(vec![-0.5, 0.0, 0.5]).unwrap();
        assert_eq!(window.left(), -1);
        assert_eq!(window.right(), 1);
        assert_eq!(window.coefficient(-1), -0.5);
        assert_eq!(window.coefficient(2), 0.0);
    }

    #[test]
    fn even_width() {
        let window = Window::new(vec![-1.0, 1.0]).unwrap();
        assert_eq!(window.left(), -1);
        assert_eq!(window.right(), 0);
        let iterated = window.iter().collect::<Vec<_>>();
        assert_eq!(iterated, [(-1, -1.0), (0, 1.0)]);
    }

    #[test]
    fn empty_windows_rejected() {
        assert_eq!(
            Window::new(vec![]).unwrap_err(),
            SynthesisError::DimensionMismatch {
                context: "window coefficients",
                expected: 1,
                actual: 0
            }
        );
        assert!(Windows::with_delta(vec![]).is_err());
        assert!(Windows::new(vec![]).is_err());
    }

    #[test]
    fn band_width() {
        let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();
        assert_eq!(windows.size(), 2);
        assert_eq!(windows.max_left(), -1);
        assert_eq!(windows.max_right(), 1);
        assert_eq!(windows.band_width(), 3);
        assert_eq!(Windows::static_only().band_width(), 1);
        assert_eq!(Windows::with_delta(vec![-1.0, 1.0]).unwrap().band_width(), 2);
    }

    #[test]
    fn delta_interior_and_edges() {
        let statics = Matrix::from_rows(&[[1.0], [2.0], [4.0], [7.0]]).unwrap();
        let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();
        let deltas = windows.deltas(&statics);
        assert_eq!(deltas.len(), 1);
        let delta = deltas[0].column(0).collect::<Vec<_>>();
        // frame -1 reflects to 2 * 1 - 2 = 0, frame 4 to 2 * 7 - 4 = 10
        approx::assert_abs_diff_eq!(delta[0], 1.0);
        approx::assert_abs_diff_eq!(delta[1], 1.5);
        approx::assert_abs_diff_eq!(delta[2], 2.5);
        approx::assert_abs_diff_eq!(delta[3], 3.0);
    }

    #[test]
    fn linear_track_has_constant_delta() {
        let statics = Matrix::from_rows(&[[0.0, 10.0], [1.0, 8.0], [2.0, 6.0]]).unwrap();
        let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();
        let delta = &windows.deltas(&statics)[0];
        for t in 0..3 {
            approx::assert_abs_diff_eq!(delta[(t, 0)], 1.0);
            approx::assert_abs_diff_eq!(delta[(t, 1)], -2.0);
        }
    }

    #[test]
    fn single_frame() {
        let statics = Matrix::from_rows(&[[3.0]]).unwrap();
        let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();
        let delta = &windows.deltas(&statics)[0];
        approx::assert_abs_diff_eq!(delta[(0, 0)], 0.0);
    }

    #[test]
    fn observation_layout() {
        let statics = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();
        let observations = windows.observations(&statics);
        assert_eq!(observations.cols(), 4);
        assert_eq!(&observations.row(0)[..2], &[1.0, 2.0]);
        approx::assert_abs_diff_eq!(observations[(0, 2)], 2.0);
        approx::assert_abs_diff_eq!(observations[(1, 3)], 2.0);
    }
}
