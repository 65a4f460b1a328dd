//! The voice database: configuration, lookup tables and the predictors
//! that stand in for the decision trees.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_FRAME_ADVANCE;
use crate::segment::Segment;
use crate::vocoder::{PadeOrder, ShapingFilters};
use crate::window::Windows;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Sampling frequency in Hz
    pub sample_rate: usize,
    /// Frame shift in seconds
    pub frame_advance: f64,
    /// F0 statistics of the training data
    pub f0_mean: f64,
    pub f0_stddev: f64,
    /// All-pass constant
    pub mlsa_alpha: f64,
    /// Postfiltering coefficient
    pub mlsa_beta: f64,
    pub gain: f64,
    pub pade_order: PadeOrder,
    /// `mlsa` or `mixed_excitation`
    pub resynthesis_mode: String,
    pub do_mlpg: bool,
    pub pause_phone: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            frame_advance: 0.005,
            f0_mean: 100.0,
            f0_stddev: 20.0,
            mlsa_alpha: 0.42,
            mlsa_beta: 0.0,
            gain: 1.0,
            pade_order: PadeOrder::default(),
            resynthesis_mode: "mlsa".to_string(),
            do_mlpg: true,
            pause_phone: "pau".to_string(),
        }
    }
}

impl VoiceConfig {
    pub fn frame_advance(&self) -> f64 {
        self.frame_advance.max(MIN_FRAME_ADVANCE)
    }

    /// Samples per frame, at least 1.
    pub fn frame_length(&self) -> usize {
        ((self.frame_advance() * self.sample_rate as f64).round() as usize).max(1)
    }
}

/// State names of each phone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneStateTable {
    entries: Vec<(String, Vec<String>)>,
}

impl PhoneStateTable {
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    /// States of `phone`. Unknown phones fall back to the first entry.
    pub fn states(&self, phone: &str) -> &[String] {
        if let Some((_, states)) = self.entries.iter().find(|(name, _)| name == phone) {
            return states;
        }
        match self.entries.first() {
            Some((fallback, states)) => {
                log::warn!("Unknown phone {phone}, using the states of {fallback}.");
                states
            }
            None => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationStat {
    pub mean: f64,
    pub stddev: f64,
}

/// Duration statistics by state name, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    entries: Vec<(String, DurationStat)>,
}

impl DurationStats {
    pub fn new(entries: Vec<(String, DurationStat)>) -> Self {
        Self { entries }
    }

    /// Statistics of `state`. Unknown states fall back to the first entry.
    pub fn get(&self, state: &str) -> DurationStat {
        if let Some((_, stat)) = self.entries.iter().find(|(name, _)| name == state) {
            return *stat;
        }
        match self.entries.first() {
            Some((fallback, stat)) => {
                log::warn!("No duration statistics for {state}, using those of {fallback}.");
                *stat
            }
            None => {
                log::warn!("No duration statistics for {state}.");
                DurationStat {
                    mean: 0.0,
                    stddev: 0.0,
                }
            }
        }
    }
}

/// One HMM state as seen by the duration predictor.
#[derive(Debug, Clone, Copy)]
pub struct StateContext<'a> {
    pub segments: &'a [Segment],
    pub segment_index: usize,
    pub name: &'a str,
    /// Position of the state within its phone.
    pub position: usize,
    pub state_count: usize,
}

impl StateContext<'_> {
    pub fn segment(&self) -> &Segment {
        &self.segments[self.segment_index]
    }
}

/// One output frame as seen by the F0 and parameter predictors.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub state: StateContext<'a>,
    pub frame: usize,
    pub time: f64,
    /// Position of the frame within its state.
    pub position: usize,
    pub frame_count: usize,
}

impl FrameContext<'_> {
    pub fn segment(&self) -> &Segment {
        self.state.segment()
    }
}

/// Leaf statistics of the parameter trees for one frame.
///
/// `means` and `stddevs` hold the spectral channels window-major: all
/// statics, then all deltas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub f0: f64,
    pub means: Vec<f64>,
    pub stddevs: Vec<f64>,
    pub band_strengths: Vec<f64>,
    pub voicing: f64,
}

/// Z-score of a state duration.
pub trait DurationPredictor: Send + Sync {
    fn predict(&self, context: &StateContext) -> f64;
}

/// F0 in Hz of a frame.
pub trait F0Predictor: Send + Sync {
    fn predict(&self, context: &FrameContext) -> f64;
}

pub trait ParameterPredictor: Send + Sync {
    fn predict(&self, context: &FrameContext) -> Cluster;
}

impl<F> DurationPredictor for F
where
    F: Fn(&StateContext) -> f64 + Send + Sync,
{
    fn predict(&self, context: &StateContext) -> f64 {
        self(context)
    }
}

impl<F> F0Predictor for F
where
    F: Fn(&FrameContext) -> f64 + Send + Sync,
{
    fn predict(&self, context: &FrameContext) -> f64 {
        self(context)
    }
}

impl<F> ParameterPredictor for F
where
    F: Fn(&FrameContext) -> Cluster + Send + Sync,
{
    fn predict(&self, context: &FrameContext) -> Cluster {
        self(context)
    }
}

pub enum ParameterModels {
    Single(Box<dyn ParameterPredictor>),
    /// Two models whose predictions are averaged.
    Multi(Box<dyn ParameterPredictor>, Box<dyn ParameterPredictor>),
}

impl ParameterModels {
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(..))
    }
}

pub struct Voice {
    pub config: VoiceConfig,
    /// Spectral channels per window.
    pub spectrum_dimension: usize,
    pub windows: Windows,
    pub phone_states: PhoneStateTable,
    pub durations: DurationStats,
    pub shaping_filters: Option<ShapingFilters>,

    pub duration_model: Box<dyn DurationPredictor>,
    pub f0_model: Box<dyn F0Predictor>,
    pub parameter_models: ParameterModels,
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("config", &self.config)
            .field("spectrum_dimension", &self.spectrum_dimension)
            .field("windows", &self.windows)
            .field("multimodel", &self.parameter_models.is_multi())
            .finish_non_exhaustive()
    }
}
