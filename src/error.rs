/// Failures reported while smoothing, scoring or vocoding one utterance.
///
/// Every variant describes bad data handed in by the model layer. The
/// utterance is abandoned; nothing outside of it is affected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("{context}: expected {expected}, found {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("non-positive determinant {determinant} at frame {frame} (dimension {dimension:?})")]
    NonPositiveDeterminant {
        dimension: Option<usize>,
        frame: usize,
        determinant: f64,
    },
    #[error("unknown resynthesis mode `{0}`")]
    UnknownResynthesisMode(String),
    #[error("state {state} ends at {end} s")]
    InvalidDuration { state: String, end: f64 },
    #[error("failed to allocate {requested} values for {context}")]
    AllocationFailure {
        context: &'static str,
        requested: usize,
    },
}

pub type Result<T> = std::result::Result<T, SynthesisError>;
