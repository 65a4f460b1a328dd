//! Statistical parametric waveform synthesis.
//!
//! Frame-rate acoustic statistics predicted by a voice are smoothed into
//! maximum-likelihood trajectories and rendered to PCM by an MLSA vocoder.

#[macro_use]
mod util;

pub mod constants;
pub mod engine;
pub mod error;
pub mod f0;
pub mod matrix;
pub mod mlpg;
pub mod prediction;
pub mod segment;
pub mod speech;
pub mod state;
pub mod track;
pub mod vocoder;
pub mod voice;
pub mod window;

pub use engine::{Condition, Engine, GeneratedParameters};
pub use error::{Result, SynthesisError};
pub use segment::Segment;
pub use speech::{StreamControl, StreamingInfo};
pub use track::{Track, Waveform};
pub use voice::{
    Cluster, DurationPredictor, DurationStat, DurationStats, F0Predictor, FrameContext,
    ParameterModels, ParameterPredictor, PhoneStateTable, StateContext, Voice, VoiceConfig,
};
