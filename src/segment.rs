use serde::{Deserialize, Serialize};

/// One phone of the utterance to synthesize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    /// Vowels are always voiced.
    pub vowel: bool,
    /// Local duration factor on top of the global one.
    pub duration_stretch: Option<f64>,
}

impl Segment {
    pub fn new<S: Into<String>>(name: S, vowel: bool) -> Self {
        Self {
            name: name.into(),
            vowel,
            duration_stretch: None,
        }
    }

    pub fn with_duration_stretch(mut self, stretch: f64) -> Self {
        self.duration_stretch = Some(stretch);
        self
    }
}
