//! Frame-rate prediction of F0 and spectral statistics.

use crate::error::{Result, SynthesisError};
use crate::f0::is_voiced;
use crate::matrix::Matrix;
use crate::segment::Segment;
use crate::state::StateSequence;
use crate::voice::{Cluster, FrameContext, ParameterModels, Voice};

/// Raw per-frame predictions of an utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub times: Vec<f64>,
    pub f0: Vec<f64>,
    pub voiced: Vec<bool>,
    /// Spectral means, window-major, one row per frame.
    pub means: Matrix,
    pub stddevs: Matrix,
    /// Mixed excitation band strengths; `None` when the clusters carry none.
    pub band_strengths: Option<Matrix>,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.f0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.f0.is_empty()
    }
}

pub fn predict(voice: &Voice, segments: &[Segment], sequence: &StateSequence) -> Result<Prediction> {
    let frame_count = sequence.frame_count();
    let size = voice.spectrum_dimension * voice.windows.size();

    let mut times = Vec::with_capacity(frame_count);
    let mut f0 = Vec::with_capacity(frame_count);
    let mut voiced = Vec::with_capacity(frame_count);
    let mut means = Matrix::try_zeros(frame_count, size)?;
    let mut stddevs = Matrix::try_zeros(frame_count, size)?;
    let mut strengths: Vec<Vec<f64>> = Vec::with_capacity(frame_count);

    for frame in 0..frame_count {
        let state = sequence.state_of(frame);
        let context = FrameContext {
            state: state.context(segments),
            frame,
            time: sequence.time(frame),
            position: frame - state.first_frame,
            frame_count: state.frame_count,
        };

        let tree_f0 = voice.f0_model.predict(&context);
        let (cluster, frame_f0) = match &voice.parameter_models {
            ParameterModels::Single(model) => {
                let cluster = model.predict(&context);
                check_cluster(&cluster, size)?;
                let f0 = (tree_f0 + cluster.f0) / 2.0;
                (cluster, f0)
            }
            ParameterModels::Multi(first, second) => {
                let first = first.predict(&context);
                let second = second.predict(&context);
                check_cluster(&first, size)?;
                check_cluster(&second, size)?;
                let f0 = (tree_f0 + first.f0 + second.f0) / 3.0;
                (average(first, &second)?, f0)
            }
        };

        times.push(context.time);
        f0.push(frame_f0);
        voiced.push(is_voiced(
            context.segment(),
            &voice.config.pause_phone,
            cluster.voicing,
        ));
        means.row_mut(frame).copy_from_slice(&cluster.means);
        stddevs.row_mut(frame).copy_from_slice(&cluster.stddevs);
        strengths.push(cluster.band_strengths);
    }

    let band_strengths = match strengths.first().map(Vec::len) {
        None | Some(0) => None,
        Some(_) => Some(Matrix::from_rows(&strengths)?),
    };

    Ok(Prediction {
        times,
        f0,
        voiced,
        means,
        stddevs,
        band_strengths,
    })
}

fn check_cluster(cluster: &Cluster, size: usize) -> Result<()> {
    if cluster.means.len() != size {
        return Err(SynthesisError::DimensionMismatch {
            context: "cluster means",
            expected: size,
            actual: cluster.means.len(),
        });
    }
    if cluster.stddevs.len() != size {
        return Err(SynthesisError::DimensionMismatch {
            context: "cluster stddevs",
            expected: size,
            actual: cluster.stddevs.len(),
        });
    }
    Ok(())
}

/// Average of two clusters. Voicing comes from the first one.
fn average(mut first: Cluster, second: &Cluster) -> Result<Cluster> {
    if first.band_strengths.len() != second.band_strengths.len() {
        return Err(SynthesisError::DimensionMismatch {
            context: "cluster band strengths",
            expected: first.band_strengths.len(),
            actual: second.band_strengths.len(),
        });
    }
    for (a, b) in first.means.iter_mut().zip(&second.means) {
        *a = (*a + b) / 2.0;
    }
    for (a, b) in first.stddevs.iter_mut().zip(&second.stddevs) {
        *a = (*a + b) / 2.0;
    }
    for (a, b) in first.band_strengths.iter_mut().zip(&second.band_strengths) {
        *a = (*a + b) / 2.0;
    }
    Ok(first)
}
