//! F0 post-processing: smoothing, rescaling and voicing.

use crate::constants::VOICING_THRESHOLD;
use crate::segment::Segment;

/// Mean and standard deviation of an F0 distribution, in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F0Statistics {
    pub mean: f64,
    pub stddev: f64,
}

/// A frame is voiced unless its phone is the pause phone. Vowels are always
/// voiced; other phones follow the predicted voicing strength.
pub fn is_voiced(segment: &Segment, pause_phone: &str, voicing: f64) -> bool {
    if segment.name == pause_phone {
        false
    } else if segment.vowel {
        true
    } else {
        voicing > VOICING_THRESHOLD
    }
}

/// Three-point moving average over the voiced neighbours of every voiced
/// frame. Neighbours are taken from the unsmoothed contour; the last frame
/// is left as is.
pub fn smooth(f0: &mut [f64]) {
    let mut previous = 0.0;
    for i in 0..f0.len().saturating_sub(1) {
        let mut count = 0;
        let mut sum = 0.0;
        if previous > 0.0 {
            count += 1;
            sum += previous;
        }
        if f0[i + 1] > 0.0 {
            count += 1;
            sum += f0[i + 1];
        }
        previous = f0[i];
        if f0[i] > 0.0 {
            count += 1;
            sum += f0[i];
            f0[i] = sum / count as f64;
        }
    }
}

/// Map `f0` from the `database` distribution onto `target`. Results are not
/// bounded; a non-positive value is rendered unvoiced by the vocoder.
pub fn rescale(f0: f64, database: &F0Statistics, target: &F0Statistics) -> f64 {
    let z = if database.stddev > 0.0 {
        (f0 - database.mean) / database.stddev
    } else {
        0.0
    };
    z * target.stddev + target.mean
}

/// Smooth, rescale and apply the voicing decision in place. Unvoiced frames
/// become exactly 0.
pub fn post_process(f0: &mut [f64], voiced: &[bool], database: &F0Statistics, target: &F0Statistics) {
    smooth(f0);
    for (value, &voiced) in f0.iter_mut().zip(voiced) {
        *value = if voiced {
            rescale(*value, database, target)
        } else {
            0.0
        };
    }
}
