/// Samples of the impulse response used to estimate filter energy in the post-filter.
pub const IMPULSE_RESPONSE_LENGTH: usize = 64;

/// Voicing strength above which a frame of a non-vowel segment is voiced.
pub const VOICING_THRESHOLD: f64 = 0.5;

/// Lower bound for the frame advance, in seconds.
pub const MIN_FRAME_ADVANCE: f64 = 1.0e-4;

/// Lower bound for the duration stretch factor.
pub const MIN_DURATION_STRETCH: f64 = 1.0e-6;

/// Seed of the excitation noise generator.
pub const DEFAULT_SEED: u64 = 1;

/// ln(2π)
pub const LN_2PI: f64 = 1.837_877_066_409_345_3;
