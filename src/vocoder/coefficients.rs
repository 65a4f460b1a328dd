use std::ops::Deref;

use crate::constants::IMPULSE_RESPONSE_LENGTH;

use super::cepstrum::MelCepstrum;

/// MLSA filter coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    buffer: Box<[f64]>,
}

deref_buffer!(Coefficients);

impl Coefficients {
    pub fn new(c: &[f64]) -> Self {
        Self { buffer: c.into() }
    }

    pub fn b2mc(&self, alpha: f64) -> MelCepstrum {
        let mut cepstrum = MelCepstrum::new(&self.buffer, alpha);
        if let Some(last) = self.len().checked_sub(1) {
            for i in (0..last).rev() {
                cepstrum[i] = self[i] + alpha * self[i + 1];
            }
        }
        cepstrum
    }

    /// Energy of the filter's impulse response.
    pub fn b2en(&self, alpha: f64) -> f64 {
        let ir = self
            .b2mc(alpha)
            .freqt(IMPULSE_RESPONSE_LENGTH - 1, -alpha)
            .c2ir(IMPULSE_RESPONSE_LENGTH);
        ir.iter().map(|x| x * x).sum()
    }

    /// Begin a frame moving linearly from the current values to `target`.
    pub fn start(&mut self, target: Self, frame_length: usize) -> CoefficientsSession<'_> {
        let increment = self
            .iter()
            .zip(target.iter())
            .map(|(current, target)| (target - current) / frame_length as f64)
            .collect();
        CoefficientsSession {
            current: self,
            increment,
            target,
        }
    }
}

/// Coefficients of one frame in progress. The target values are in place
/// once the session is dropped.
pub struct CoefficientsSession<'a> {
    current: &'a mut Coefficients,
    increment: Box<[f64]>,
    target: Coefficients,
}

impl CoefficientsSession<'_> {
    pub fn advance(&mut self) {
        for (current, inc) in self.current.iter_mut().zip(&self.increment) {
            *current += inc;
        }
    }
}

impl Deref for CoefficientsSession<'_> {
    type Target = Coefficients;

    fn deref(&self) -> &Self::Target {
        self.current
    }
}

impl Drop for CoefficientsSession<'_> {
    fn drop(&mut self) {
        self.current.copy_from_slice(&self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::Coefficients;

    #[test]
    fn interpolation() {
        let mut current = Coefficients::new(&[0.0, 1.0]);
        {
            let mut session = current.start(Coefficients::new(&[1.0, 0.0]), 4);
            assert_eq!(&session[..], &[0.0, 1.0]);
            session.advance();
            approx::assert_abs_diff_eq!(&session[..], &[0.25, 0.75][..]);
            session.advance();
        }
        assert_eq!(&current[..], &[1.0, 0.0]);
    }

    #[test]
    fn energy_of_flat_filter() {
        // b = [c0] is a pure gain exp(c0)
        let coefficients = Coefficients::new(&[0.5, 0.0, 0.0]);
        approx::assert_abs_diff_eq!(coefficients.b2en(0.42), 1.0f64.exp(), epsilon = 1e-12);
    }
}
