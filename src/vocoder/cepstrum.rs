use super::coefficients::Coefficients;

/// Mel-cepstrum of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MelCepstrum {
    pub(super) buffer: Box<[f64]>,
    pub(super) alpha: f64,
}

deref_buffer!(MelCepstrum);

impl MelCepstrum {
    pub fn new(c: &[f64], alpha: f64) -> Self {
        Self {
            buffer: c.into(),
            alpha,
        }
    }

    /// Spectral channels of a track frame. The filter order equals the
    /// channel count, so one zero coefficient is appended.
    pub fn from_frame(spectrum: &[f64], alpha: f64) -> Self {
        let buffer = spectrum.iter().copied().chain(std::iter::once(0.0)).collect();
        Self { buffer, alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Convert to MLSA filter coefficients.
    pub fn mc2b(&self) -> Coefficients {
        let mut coefficients = Coefficients::new(&self.buffer);
        if self.alpha != 0.0 && !self.is_empty() {
            let last = self.len() - 1;
            for i in (0..last).rev() {
                coefficients[i] = self[i] - self.alpha * coefficients[i + 1];
            }
        }
        coefficients
    }

    /// Filter coefficients with the energy-preserving post-filter applied.
    pub fn postfiltered(&self, beta: f64) -> Coefficients {
        let mut coefficients = self.mc2b();
        if beta > 0.0 && self.len() > 2 {
            let e1 = coefficients.b2en(self.alpha);

            coefficients[1] -= beta * self.alpha * self[2];
            for k in 2..coefficients.len() {
                coefficients[k] *= 1.0 + beta;
            }

            let e2 = coefficients.b2en(self.alpha);
            coefficients[0] += (e1 / e2).ln() / 2.0;
        }
        coefficients
    }

    /// Frequency transformation to order `m2` with warping `alpha`.
    pub fn freqt(&self, m2: usize, alpha: f64) -> Self {
        let aa = 1.0 - alpha * alpha;

        let mut g = boxed_slice![0.0; m2 + 1];
        let mut d = boxed_slice![0.0; m2 + 1];

        for &c in self.iter().rev() {
            d[0] = g[0];
            g[0] = c + alpha * d[0];
            if 1 <= m2 {
                d[1] = g[1];
                g[1] = aa * d[0] + alpha * d[1];
            }
            for j in 2..=m2 {
                d[j] = g[j];
                g[j] = d[j - 1] + alpha * (d[j] - g[j - 1]);
            }
        }

        Self {
            buffer: g,
            alpha: self.alpha,
        }
    }

    /// Minimum phase impulse response of length `len`.
    pub fn c2ir(&self, len: usize) -> Box<[f64]> {
        let mut ir = boxed_slice![0.0; len];
        if len == 0 || self.is_empty() {
            return ir;
        }
        ir[0] = self[0].exp();
        for n in 1..len {
            let mut d = 0.0;
            for k in 1..self.len().min(n + 1) {
                d += k as f64 * self[k] * ir[n - k];
            }
            ir[n] = d / n as f64;
        }
        ir
    }
}
