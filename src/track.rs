//! Frame-rate parameter tracks and the resulting waveform.

use crate::error::{Result, SynthesisError};
use crate::matrix::Matrix;

/// Acoustic parameters at frame rate.
///
/// Channel 0 holds F0 in Hz (0 when unvoiced), the remaining channels the
/// mel-cepstral coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    times: Vec<f64>,
    frames: Matrix,
}

impl Track {
    pub fn new(times: Vec<f64>, frames: Matrix) -> Result<Self> {
        if times.len() != frames.rows() {
            return Err(SynthesisError::DimensionMismatch {
                context: "track timestamps",
                expected: frames.rows(),
                actual: times.len(),
            });
        }
        if frames.cols() == 0 {
            return Err(SynthesisError::DimensionMismatch {
                context: "track channels",
                expected: 1,
                actual: 0,
            });
        }
        Ok(Self { times, frames })
    }

    /// Assemble a track from an F0 contour and a spectral trajectory.
    pub fn from_parts(times: Vec<f64>, f0: &[f64], spectrum: &Matrix) -> Result<Self> {
        if f0.len() != spectrum.rows() {
            return Err(SynthesisError::DimensionMismatch {
                context: "f0 frame count",
                expected: spectrum.rows(),
                actual: f0.len(),
            });
        }
        let mut frames = Matrix::try_zeros(spectrum.rows(), spectrum.cols() + 1)?;
        for (t, (f0, coefficients)) in f0.iter().zip(spectrum.iter_rows()).enumerate() {
            let row = frames.row_mut(t);
            row[0] = *f0;
            row[1..].copy_from_slice(coefficients);
        }
        Self::new(times, frames)
    }

    pub fn len(&self) -> usize {
        self.frames.rows()
    }
    pub fn is_empty(&self) -> bool {
        self.frames.rows() == 0
    }
    pub fn channels(&self) -> usize {
        self.frames.cols()
    }
    pub fn spectrum_dimension(&self) -> usize {
        self.frames.cols() - 1
    }

    pub fn time(&self, frame: usize) -> f64 {
        self.times[frame]
    }
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn f0(&self, frame: usize) -> f64 {
        self.frames[(frame, 0)]
    }
    pub fn spectrum(&self, frame: usize) -> &[f64] {
        &self.frames.row(frame)[1..]
    }
    pub fn frames(&self) -> &Matrix {
        &self.frames
    }
}

/// 16-bit PCM samples.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Waveform {
    pub sample_rate: usize,
    pub samples: Vec<i16>,
}

impl Waveform {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.sample_rate as f64
        }
    }
}
