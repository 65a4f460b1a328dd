//! Gaussian log-likelihood of an observation sequence, for diagnostics.

use crate::constants::LN_2PI;
use crate::error::{Result, SynthesisError};
use crate::matrix::Matrix;

use super::PdfStream;

/// Mean per-frame log-likelihood of `observations` under `pdf`.
///
/// `observations` holds one row per frame in the same layout as the pdf
/// means. An empty stream scores zero.
pub fn likelihood(pdf: &PdfStream, observations: &Matrix) -> Result<f64> {
    let size = pdf.dimension() * pdf.window_count();
    if observations.rows() != pdf.len() {
        return Err(SynthesisError::DimensionMismatch {
            context: "observation frame count",
            expected: pdf.len(),
            actual: observations.rows(),
        });
    }
    if observations.cols() != size {
        return Err(SynthesisError::DimensionMismatch {
            context: "observation vector length",
            expected: size,
            actual: observations.cols(),
        });
    }
    if pdf.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    let mut diff = vec![0.0; size];
    for (t, (frame, observation)) in pdf.frames().iter().zip(observations.iter_rows()).enumerate() {
        let determinant = frame.determinant();
        if !(determinant > 0.0) {
            return Err(SynthesisError::NonPositiveDeterminant {
                dimension: None,
                frame: t,
                determinant,
            });
        }
        for ((d, o), m) in diff.iter_mut().zip(observation).zip(frame.mean()) {
            *d = o - m;
        }
        let mahalanobis = frame.inverse().quadratic_form(&diff);
        total += -0.5 * (size as f64 * LN_2PI + determinant.ln() + mahalanobis);
    }

    Ok(total / pdf.len() as f64)
}
