use crate::error::{Result, SynthesisError};
use crate::matrix::Matrix;
use crate::track::{Track, Waveform};
use crate::vocoder::{ResynthesisMode, ShapingFilters, Vocoder, VocoderSettings};

/// Answer of a streaming callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamControl {
    Continue,
    Stop,
}

/// Receives the waveform in pieces while it is synthesized.
///
/// The callback gets the whole buffer so far, the start and length of the
/// new samples and whether this is the final piece.
pub struct StreamingInfo<'a> {
    pub min_buffer_size: usize,
    pub callback: Box<dyn FnMut(&[i16], usize, usize, bool) -> StreamControl + 'a>,
}

impl<'a> StreamingInfo<'a> {
    pub fn new<F>(min_buffer_size: usize, callback: F) -> Self
    where
        F: FnMut(&[i16], usize, usize, bool) -> StreamControl + 'a,
    {
        Self {
            min_buffer_size,
            callback: Box::new(callback),
        }
    }
}

pub struct SpeechGenerator<'a> {
    settings: VocoderSettings,
    mode: ResynthesisMode,
    filters: Option<&'a ShapingFilters>,
}

impl<'a> SpeechGenerator<'a> {
    pub fn new(
        settings: VocoderSettings,
        mode: ResynthesisMode,
        filters: Option<&'a ShapingFilters>,
    ) -> Self {
        Self {
            settings,
            mode,
            filters,
        }
    }

    /// Generate speech from `track`, one frame of samples per track frame.
    ///
    /// `band_strengths` holds one row per frame in mixed excitation mode.
    /// When streaming and the callback asks to stop, the samples produced
    /// so far are returned.
    pub fn synthesize(
        &self,
        track: &Track,
        band_strengths: Option<&Matrix>,
        mut streaming: Option<&mut StreamingInfo>,
    ) -> Result<Waveform> {
        if let Some(strengths) = band_strengths {
            if strengths.rows() != track.len() {
                return Err(SynthesisError::DimensionMismatch {
                    context: "band strength frames",
                    expected: track.len(),
                    actual: strengths.rows(),
                });
            }
        }

        let mut vocoder = Vocoder::new(
            track.spectrum_dimension(),
            &self.settings,
            self.mode,
            self.filters,
        )?;
        let total = track.len() * vocoder.frame_length();
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(total)
            .map_err(|_| SynthesisError::AllocationFailure {
                context: "waveform",
                requested: total,
            })?;

        let mut mark = 0;
        let mut stopped = false;
        for t in 0..track.len() {
            let strengths = band_strengths.map(|strengths| strengths.row(t));
            vocoder.synthesize_frame(track.f0(t), track.spectrum(t), strengths, &mut samples)?;

            if let Some(info) = streaming.as_deref_mut() {
                let pos = samples.len();
                if pos - mark > info.min_buffer_size {
                    let control = (info.callback)(&samples[..], mark, pos - mark, false);
                    mark = pos;
                    if control == StreamControl::Stop {
                        log::debug!("streaming stopped at frame {t}");
                        stopped = true;
                        break;
                    }
                }
            }
        }

        if let Some(info) = streaming {
            if !stopped {
                (info.callback)(&samples[..], mark, samples.len() - mark, true);
            }
        }

        Ok(Waveform {
            sample_rate: self.settings.sample_rate,
            samples,
        })
    }
}
