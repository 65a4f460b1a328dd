//! Expansion of segments into states and frames.

use crate::constants::MIN_DURATION_STRETCH;
use crate::error::{Result, SynthesisError};
use crate::segment::Segment;
use crate::voice::{StateContext, Voice};

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: String,
    pub segment_index: usize,
    /// Position of the state within its phone.
    pub position: usize,
    pub state_count: usize,
    /// End time in seconds.
    pub end: f64,
    /// First frame of the state.
    pub first_frame: usize,
    pub frame_count: usize,
}

impl State {
    pub fn context<'a>(&'a self, segments: &'a [Segment]) -> StateContext<'a> {
        StateContext {
            segments,
            segment_index: self.segment_index,
            name: &self.name,
            position: self.position,
            state_count: self.state_count,
        }
    }
}

/// States of an utterance with their durations and frame assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSequence {
    states: Vec<State>,
    /// State index of every frame.
    frames: Vec<usize>,
    frame_advance: f64,
}

impl StateSequence {
    /// Predict state durations and assign frames.
    ///
    /// Frame `n` belongs to the first state whose end time is at least
    /// `n * frame_advance`. Fails when a state ends at a non-finite time or
    /// the frames cannot be allocated.
    pub fn build(voice: &Voice, segments: &[Segment], duration_stretch: f64) -> Result<Self> {
        let frame_advance = voice.config.frame_advance();
        let duration_stretch = duration_stretch.max(MIN_DURATION_STRETCH);

        let mut states = Vec::new();
        let mut end = 0.0;
        for (segment_index, segment) in segments.iter().enumerate() {
            let local_stretch = segment
                .duration_stretch
                .unwrap_or(1.0)
                .max(MIN_DURATION_STRETCH);
            let names = voice.phone_states.states(&segment.name);
            for (position, name) in names.iter().enumerate() {
                let context = StateContext {
                    segments,
                    segment_index,
                    name,
                    position,
                    state_count: names.len(),
                };
                let z = voice.duration_model.predict(&context);
                let stat = voice.durations.get(name);
                let duration = (z * stat.stddev + stat.mean) * duration_stretch * local_stretch;
                end += duration;
                if !end.is_finite() {
                    return Err(SynthesisError::InvalidDuration {
                        state: name.clone(),
                        end,
                    });
                }
                states.push(State {
                    name: name.clone(),
                    segment_index,
                    position,
                    state_count: names.len(),
                    end,
                    first_frame: 0,
                    frame_count: 0,
                });
            }
        }

        let total = states
            .iter()
            .map(|state| state.end)
            .fold(0.0, f64::max);
        let total = frame_capacity(total, frame_advance)?;
        let mut frames = Vec::new();
        frames
            .try_reserve_exact(total)
            .map_err(|_| SynthesisError::AllocationFailure {
                context: "frames",
                requested: total,
            })?;

        for (index, state) in states.iter_mut().enumerate() {
            state.first_frame = frames.len();
            while frames.len() as f64 * frame_advance <= state.end {
                frames.push(index);
            }
            state.frame_count = frames.len() - state.first_frame;
        }

        log::debug!(
            "{} segments, {} states, {} frames",
            segments.len(),
            states.len(),
            frames.len()
        );

        Ok(Self {
            states,
            frames,
            frame_advance,
        })
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
    pub fn frame_advance(&self) -> f64 {
        self.frame_advance
    }

    /// State of `frame`.
    pub fn state_of(&self, frame: usize) -> &State {
        &self.states[self.frames[frame]]
    }

    /// Timestamp of `frame` in seconds.
    pub fn time(&self, frame: usize) -> f64 {
        frame as f64 * self.frame_advance
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        self.states.last().map_or(0.0, |state| state.end)
    }
}

/// Number of frames `n` with `n * frame_advance <= end`, plus one of slack
/// for rounding.
fn frame_capacity(end: f64, frame_advance: f64) -> Result<usize> {
    let count = (end / frame_advance).floor() + 2.0;
    if count < usize::MAX as f64 {
        Ok(count as usize)
    } else {
        Err(SynthesisError::AllocationFailure {
            context: "frames",
            requested: usize::MAX,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::StateSequence;
    use crate::error::SynthesisError;
    use crate::segment::Segment;
    use crate::vocoder::PadeOrder;
    use crate::voice::{
        Cluster, DurationStat, DurationStats, FrameContext, ParameterModels, PhoneStateTable,
        StateContext, Voice, VoiceConfig,
    };
    use crate::window::Windows;

    fn mean_duration(_: &StateContext) -> f64 {
        0.0
    }
    fn flat_f0(_: &FrameContext) -> f64 {
        100.0
    }
    fn flat_cluster(_: &FrameContext) -> Cluster {
        Cluster {
            f0: 100.0,
            means: vec![1.0, 0.0],
            stddevs: vec![1.0, 1.0],
            band_strengths: vec![],
            voicing: 1.0,
        }
    }

    /// Two phones: `pau` with one state of 21.5 ms and `a` with two states of
    /// 11.5 ms each, at 5 ms per frame.
    pub(crate) fn toy_voice() -> Voice {
        let stat = |mean| DurationStat { mean, stddev: 0.01 };
        Voice {
            config: VoiceConfig {
                pade_order: PadeOrder::Five,
                ..Default::default()
            },
            spectrum_dimension: 1,
            windows: Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap(),
            phone_states: PhoneStateTable::new(vec![
                ("pau".to_string(), vec!["pau_1".to_string()]),
                ("a".to_string(), vec!["a_1".to_string(), "a_2".to_string()]),
            ]),
            durations: DurationStats::new(vec![
                ("pau_1".to_string(), stat(0.0215)),
                ("a_1".to_string(), stat(0.0115)),
                ("a_2".to_string(), stat(0.0115)),
            ]),
            shaping_filters: None,
            duration_model: Box::new(mean_duration),
            f0_model: Box::new(flat_f0),
            parameter_models: ParameterModels::Single(Box::new(flat_cluster)),
        }
    }

    #[test]
    fn frames_follow_end_times() {
        let voice = toy_voice();
        let segments = [Segment::new("pau", false), Segment::new("a", true)];
        let sequence = StateSequence::build(&voice, &segments, 1.0).unwrap();

        assert_eq!(sequence.states().len(), 3);
        approx::assert_abs_diff_eq!(sequence.duration(), 0.0445, epsilon = 1e-12);
        // frames at 0, 5, .., 40 ms
        assert_eq!(sequence.frame_count(), 9);
        let counts: Vec<usize> = sequence.states().iter().map(|s| s.frame_count).collect();
        assert_eq!(counts, [5, 2, 2]);
        assert_eq!(sequence.state_of(0).name, "pau_1");
        assert_eq!(sequence.state_of(8).name, "a_2");
        assert_eq!(sequence.states()[1].first_frame, sequence.states()[0].frame_count);
    }

    #[test]
    fn stretch_scales_duration() {
        let voice = toy_voice();
        let segments = [
            Segment::new("pau", false).with_duration_stretch(2.0),
            Segment::new("a", true),
        ];
        let sequence = StateSequence::build(&voice, &segments, 0.5).unwrap();
        approx::assert_abs_diff_eq!(sequence.states()[0].end, 0.0215, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(sequence.duration(), 0.033, epsilon = 1e-12);
    }

    #[test]
    fn unknown_phone_falls_back() {
        let voice = toy_voice();
        let sequence = StateSequence::build(&voice, &[Segment::new("zh", false)], 1.0).unwrap();
        assert_eq!(sequence.states().len(), 1);
        assert_eq!(sequence.states()[0].name, "pau_1");
    }

    #[test]
    fn empty_utterance() {
        let voice = toy_voice();
        let sequence = StateSequence::build(&voice, &[], 1.0).unwrap();
        assert_eq!(sequence.frame_count(), 0);
        assert_eq!(sequence.duration(), 0.0);
    }

    fn infinite_duration(_: &StateContext) -> f64 {
        f64::INFINITY
    }
    fn undefined_duration(_: &StateContext) -> f64 {
        f64::NAN
    }
    fn enormous_duration(_: &StateContext) -> f64 {
        1.0e300
    }

    #[test]
    fn non_finite_duration_is_rejected() {
        let mut voice = toy_voice();
        voice.duration_model = Box::new(infinite_duration);
        let segments = [Segment::new("pau", false), Segment::new("a", true)];
        assert_eq!(
            StateSequence::build(&voice, &segments, 1.0).unwrap_err(),
            SynthesisError::InvalidDuration {
                state: "pau_1".to_string(),
                end: f64::INFINITY
            }
        );

        voice.duration_model = Box::new(undefined_duration);
        assert!(matches!(
            StateSequence::build(&voice, &segments, 1.0),
            Err(SynthesisError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn huge_duration_fails_to_allocate() {
        let mut voice = toy_voice();
        voice.duration_model = Box::new(enormous_duration);
        assert!(matches!(
            StateSequence::build(&voice, &[Segment::new("a", true)], 1.0),
            Err(SynthesisError::AllocationFailure {
                context: "frames",
                ..
            })
        ));
    }
}
