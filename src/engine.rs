use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SEED, MIN_DURATION_STRETCH};
use crate::error::Result;
use crate::f0::{self, F0Statistics};
use crate::matrix::Matrix;
use crate::mlpg::likelihood::likelihood;
use crate::mlpg::{ParameterGenerator, PdfStream};
use crate::prediction::predict;
use crate::segment::Segment;
use crate::speech::{SpeechGenerator, StreamingInfo};
use crate::state::StateSequence;
use crate::track::{Track, Waveform};
use crate::vocoder::{NoiseKind, ResynthesisMode, VocoderSettings};
use crate::voice::Voice;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Global duration factor
    duration_stretch: f64,
    /// Target F0 mean (Hz)
    f0_mean: f64,
    /// Target F0 standard deviation (Hz)
    f0_stddev: f64,
    /// Factor on the target F0 mean
    f0_shift: f64,
    /// Flag for trajectory smoothing
    smoothing: bool,
    /// Output gain
    gain: f64,
    /// Postfiltering coefficient
    beta: f64,
    /// Unvoiced excitation
    noise: NoiseKind,
    /// Seed of the excitation noise
    seed: u64,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            duration_stretch: 1.0,
            f0_mean: 100.0,
            f0_stddev: 20.0,
            f0_shift: 1.0,
            smoothing: true,
            gain: 1.0,
            beta: 0.0,
            noise: NoiseKind::Gaussian,
            seed: DEFAULT_SEED,
        }
    }
}

impl Condition {
    pub fn load_voice(&mut self, voice: &Voice) {
        self.f0_mean = voice.config.f0_mean;
        self.f0_stddev = voice.config.f0_stddev;
        self.smoothing = voice.config.do_mlpg;
        self.gain = voice.config.gain;
        self.set_beta(voice.config.mlsa_beta);
    }

    /// Apply a `KEY=VALUE` option. Unrecognized options are skipped with a
    /// warning and `false` is returned.
    pub fn apply_option(&mut self, option: &str) -> bool {
        let Some((key, value)) = option.split_once('=') else {
            log::warn!("Skipped unrecognized option {}.", option);
            return false;
        };
        let value = value.trim();
        let applied = match key.trim() {
            "DURATION_STRETCH" => value.parse::<f64>().map(|f| self.set_duration_stretch(f)).is_ok(),
            "F0_MEAN" => value.parse::<f64>().map(|f| self.set_f0_mean(f)).is_ok(),
            "F0_STDDEV" => value.parse::<f64>().map(|f| self.set_f0_stddev(f)).is_ok(),
            "F0_SHIFT" => value.parse::<f64>().map(|f| self.set_f0_shift(f)).is_ok(),
            "SMOOTHING" => match value {
                "1" => {
                    self.set_smoothing(true);
                    true
                }
                "0" => {
                    self.set_smoothing(false);
                    true
                }
                _ => false,
            },
            "GAIN" => value.parse::<f64>().map(|f| self.set_gain(f)).is_ok(),
            "BETA" => value.parse::<f64>().map(|f| self.set_beta(f)).is_ok(),
            "NOISE" => match value {
                "gaussian" => {
                    self.set_noise(NoiseKind::Gaussian);
                    true
                }
                "binary" => {
                    self.set_noise(NoiseKind::Binary);
                    true
                }
                _ => false,
            },
            "SEED" => value.parse::<u64>().map(|i| self.set_seed(i)).is_ok(),
            _ => false,
        };
        if !applied {
            log::warn!("Skipped unrecognized option {}.", option);
        }
        applied
    }

    /// Set duration stretch
    /// Note: Default value is 1.0.
    pub fn set_duration_stretch(&mut self, f: f64) {
        self.duration_stretch = f.max(MIN_DURATION_STRETCH);
    }
    /// Get duration stretch
    pub fn get_duration_stretch(&self) -> f64 {
        self.duration_stretch
    }

    /// Set target F0 mean (Hz)
    pub fn set_f0_mean(&mut self, f: f64) {
        self.f0_mean = f.max(0.0);
    }
    /// Get target F0 mean (Hz)
    pub fn get_f0_mean(&self) -> f64 {
        self.f0_mean
    }

    /// Set target F0 standard deviation (Hz)
    pub fn set_f0_stddev(&mut self, f: f64) {
        self.f0_stddev = f.max(0.0);
    }
    /// Get target F0 standard deviation (Hz)
    pub fn get_f0_stddev(&self) -> f64 {
        self.f0_stddev
    }

    /// Set F0 shift
    /// Note: Default value is 1.0.
    pub fn set_f0_shift(&mut self, f: f64) {
        self.f0_shift = f.max(0.0);
    }
    /// Get F0 shift
    pub fn get_f0_shift(&self) -> f64 {
        self.f0_shift
    }

    /// Set flag to smooth the spectral trajectory
    pub fn set_smoothing(&mut self, b: bool) {
        self.smoothing = b;
    }
    /// Get flag to smooth the spectral trajectory
    pub fn get_smoothing(&self) -> bool {
        self.smoothing
    }

    /// Set gain
    pub fn set_gain(&mut self, f: f64) {
        self.gain = f.max(0.0);
    }
    /// Get gain
    pub fn get_gain(&self) -> f64 {
        self.gain
    }

    /// Set postfiltering coefficient parameter beta
    pub fn set_beta(&mut self, f: f64) {
        self.beta = f.clamp(0.0, 1.0);
    }
    /// Get postfiltering coefficient parameter beta
    pub fn get_beta(&self) -> f64 {
        self.beta
    }

    pub fn set_noise(&mut self, noise: NoiseKind) {
        self.noise = noise;
    }
    pub fn get_noise(&self) -> NoiseKind {
        self.noise
    }

    pub fn set_seed(&mut self, i: u64) {
        self.seed = i;
    }
    pub fn get_seed(&self) -> u64 {
        self.seed
    }
}

/// Parameters of an utterance, ready for the vocoder.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedParameters {
    pub track: Track,
    pub band_strengths: Option<Matrix>,
    /// Log-likelihood per frame of the smoothed trajectory.
    pub likelihood: Option<f64>,
}

pub struct Engine {
    pub condition: Condition,
    pub voice: Arc<Voice>,
}

impl Engine {
    pub fn new(voice: Arc<Voice>) -> Engine {
        let mut condition = Condition::default();
        condition.load_voice(&voice);

        Engine { condition, voice }
    }

    /// Predict, post-process and smooth the parameters of `segments`.
    pub fn generate_parameters(&self, segments: &[Segment]) -> Result<GeneratedParameters> {
        let voice = &self.voice;
        let sequence = StateSequence::build(voice, segments, self.condition.duration_stretch)?;
        let mut prediction = predict(voice, segments, &sequence)?;

        let database = F0Statistics {
            mean: voice.config.f0_mean,
            stddev: voice.config.f0_stddev,
        };
        let target = F0Statistics {
            mean: self.condition.f0_mean * self.condition.f0_shift,
            stddev: self.condition.f0_stddev,
        };
        f0::post_process(&mut prediction.f0, &prediction.voiced, &database, &target);

        let (spectrum, like) = if self.condition.smoothing {
            let pdf = PdfStream::from_stddevs(
                voice.windows.size(),
                &prediction.means,
                &prediction.stddevs,
            )?;
            let like = likelihood(&pdf, &voice.windows.observations(&pdf.static_means()))?;
            log::debug!("likelihood {like:.4} over {} frames", pdf.len());
            let spectrum = ParameterGenerator::new(&voice.windows).generate(&pdf)?;
            (spectrum, Some(like))
        } else {
            (prediction.means.columns(0, voice.spectrum_dimension), None)
        };

        Ok(GeneratedParameters {
            track: Track::from_parts(prediction.times, &prediction.f0, &spectrum)?,
            band_strengths: prediction.band_strengths,
            likelihood: like,
        })
    }

    pub fn synthesize(&self, segments: &[Segment]) -> Result<Waveform> {
        self.generate(segments, None)
    }

    /// Synthesize while handing pieces of the waveform to `streaming`.
    pub fn synthesize_streaming(
        &self,
        segments: &[Segment],
        streaming: &mut StreamingInfo,
    ) -> Result<Waveform> {
        self.generate(segments, Some(streaming))
    }

    fn generate(&self, segments: &[Segment], streaming: Option<&mut StreamingInfo>) -> Result<Waveform> {
        let mode: ResynthesisMode = self.voice.config.resynthesis_mode.parse()?;
        let parameters = self.generate_parameters(segments)?;
        let generator = SpeechGenerator::new(
            self.vocoder_settings(),
            mode,
            self.voice.shaping_filters.as_ref(),
        );
        let waveform = generator.synthesize(
            &parameters.track,
            parameters.band_strengths.as_ref(),
            streaming,
        )?;
        log::debug!(
            "synthesized {} frames into {} samples",
            parameters.track.len(),
            waveform.len()
        );
        Ok(waveform)
    }

    fn vocoder_settings(&self) -> VocoderSettings {
        let config = &self.voice.config;
        VocoderSettings {
            sample_rate: config.sample_rate,
            frame_length: config.frame_length(),
            alpha: config.mlsa_alpha,
            beta: self.condition.beta,
            gain: self.condition.gain,
            pade_order: config.pade_order,
            noise: self.condition.noise,
            seed: self.condition.seed,
        }
    }
}
