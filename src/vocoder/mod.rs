use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SEED;
use crate::error::{Result, SynthesisError};

use self::cepstrum::MelCepstrum;
use self::coefficients::Coefficients;
use self::excitation::Excitation;
use self::mlsa::MlsaFilter;

macro_rules! deref_buffer {
    ($t:ty) => {
        impl std::ops::Deref for $t {
            type Target = [f64];

            fn deref(&self) -> &Self::Target {
                &self.buffer
            }
        }

        impl std::ops::DerefMut for $t {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.buffer
            }
        }
    };
}

mod cepstrum;
mod coefficients;
mod excitation;
mod mlsa;

pub use self::excitation::{NoiseKind, ShapingFilters};
pub use self::mlsa::PadeOrder;

/// How the excitation of the MLSA filter is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResynthesisMode {
    /// Pulse train or noise.
    #[default]
    Mlsa,
    /// Pulse and noise shaped per band by voicing strength.
    MixedExcitation,
}

impl FromStr for ResynthesisMode {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mlsa" => Ok(Self::Mlsa),
            "mixed_excitation" => Ok(Self::MixedExcitation),
            _ => Err(SynthesisError::UnknownResynthesisMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocoderSettings {
    /// Sampling frequency in Hz
    pub sample_rate: usize,
    /// Samples per frame
    pub frame_length: usize,
    /// All-pass constant
    pub alpha: f64,
    /// Postfiltering coefficient
    pub beta: f64,
    pub gain: f64,
    pub pade_order: PadeOrder,
    pub noise: NoiseKind,
    pub seed: u64,
}

impl Default for VocoderSettings {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            frame_length: 80,
            alpha: 0.42,
            beta: 0.0,
            gain: 1.0,
            pade_order: PadeOrder::default(),
            noise: NoiseKind::default(),
            seed: DEFAULT_SEED,
        }
    }
}

/// MLSA synthesis of one utterance, frame by frame.
#[derive(Debug, Clone)]
pub struct Vocoder {
    spectrum_dimension: usize,
    band_count: Option<usize>,
    sample_rate: f64,
    frame_length: usize,
    alpha: f64,
    beta: f64,
    gain: f64,

    excitation: Excitation,
    filter: MlsaFilter,
    /// None until the first frame
    coefficients: Option<Coefficients>,
}

impl Vocoder {
    pub fn new(
        spectrum_dimension: usize,
        settings: &VocoderSettings,
        mode: ResynthesisMode,
        filters: Option<&ShapingFilters>,
    ) -> Result<Self> {
        if spectrum_dimension == 0 {
            return Err(SynthesisError::DimensionMismatch {
                context: "spectrum dimension",
                expected: 1,
                actual: 0,
            });
        }
        if settings.frame_length == 0 {
            return Err(SynthesisError::DimensionMismatch {
                context: "frame length",
                expected: 1,
                actual: 0,
            });
        }

        let filters = match mode {
            ResynthesisMode::Mlsa => None,
            ResynthesisMode::MixedExcitation => match filters {
                Some(filters) if filters.band_count() > 0 => Some(filters),
                _ => {
                    return Err(SynthesisError::DimensionMismatch {
                        context: "mixed excitation filters",
                        expected: 1,
                        actual: 0,
                    });
                }
            },
        };

        Ok(Self {
            spectrum_dimension,
            band_count: filters.map(ShapingFilters::band_count),
            sample_rate: settings.sample_rate as f64,
            frame_length: settings.frame_length,
            alpha: settings.alpha,
            beta: settings.beta,
            gain: settings.gain,

            excitation: Excitation::new(settings.noise, settings.seed, filters),
            filter: MlsaFilter::new(settings.pade_order, settings.alpha, spectrum_dimension + 1),
            coefficients: None,
        })
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Append one frame of samples to `out`.
    ///
    /// `f0` is in Hz, 0 when unvoiced. `band_strengths` is required in
    /// mixed excitation mode and ignored otherwise.
    pub fn synthesize_frame(
        &mut self,
        f0: f64,
        spectrum: &[f64],
        band_strengths: Option<&[f64]>,
        out: &mut Vec<i16>,
    ) -> Result<()> {
        if spectrum.len() != self.spectrum_dimension {
            return Err(SynthesisError::DimensionMismatch {
                context: "spectrum frame",
                expected: self.spectrum_dimension,
                actual: spectrum.len(),
            });
        }
        let band_strengths = match self.band_count {
            None => None,
            Some(bands) => match band_strengths {
                Some(strengths) if strengths.len() == bands => Some(strengths),
                other => {
                    return Err(SynthesisError::DimensionMismatch {
                        context: "band strengths",
                        expected: bands,
                        actual: other.map_or(0, <[f64]>::len),
                    });
                }
            },
        };
        out.try_reserve(self.frame_length)
            .map_err(|_| SynthesisError::AllocationFailure {
                context: "waveform",
                requested: out.len() + self.frame_length,
            })?;

        let period = if f0 > 0.0 { self.sample_rate / f0 } else { 0.0 };
        let target = MelCepstrum::from_frame(spectrum, self.alpha).postfiltered(self.beta);
        let current = self.coefficients.get_or_insert_with(|| target.clone());

        self.excitation.start(period, self.frame_length, band_strengths);
        {
            let mut session = current.start(target, self.frame_length);
            for _ in 0..self.frame_length {
                let x = self.excitation.get() * session[0].exp() * self.gain;
                let y = self.filter.df(x, &session);
                out.push(y.clamp(i16::MIN as f64, i16::MAX as f64) as i16);
                session.advance();
            }
        }
        self.excitation.end(period);

        Ok(())
    }
}
