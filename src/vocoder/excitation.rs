use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};

/// Source of unvoiced excitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseKind {
    #[default]
    Gaussian,
    /// Random ±1
    Binary,
}

/// Per-band FIR shaping filters used by mixed excitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapingFilters {
    order: usize,
    bands: Vec<Box<[f64]>>,
}

impl ShapingFilters {
    /// Every band must carry exactly `order` taps.
    pub fn new(order: usize, bands: Vec<Vec<f64>>) -> Result<Self> {
        for band in &bands {
            if band.len() != order {
                return Err(SynthesisError::DimensionMismatch {
                    context: "shaping filter taps",
                    expected: order,
                    actual: band.len(),
                });
            }
        }
        Ok(Self {
            order,
            bands: bands.into_iter().map(Vec::into_boxed_slice).collect(),
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}

#[derive(Debug, Clone)]
pub struct Excitation {
    pitch: Pitch,
    random: Random,
    noise: NoiseKind,
    mixed: Option<MixedExcitation>,
}

impl Excitation {
    /// Mixed excitation always uses binary noise.
    pub fn new(noise: NoiseKind, seed: u64, filters: Option<&ShapingFilters>) -> Self {
        let mixed = filters.map(MixedExcitation::new);
        Self {
            pitch: Pitch::new(),
            random: Random::new(seed),
            noise: if mixed.is_some() {
                NoiseKind::Binary
            } else {
                noise
            },
            mixed,
        }
    }

    pub fn is_mixed(&self) -> bool {
        self.mixed.is_some()
    }

    /// `band_strengths` must be given iff mixed excitation is active.
    pub fn start(&mut self, pitch: f64, frame_length: usize, band_strengths: Option<&[f64]>) {
        self.pitch.start(pitch, frame_length);
        if let (Some(mixed), Some(strengths)) = (&mut self.mixed, band_strengths) {
            mixed.shape(strengths);
        }
    }

    pub fn get(&mut self) -> f64 {
        let voiced = self.pitch.is_voiced();
        if self.mixed.is_none() {
            return if voiced {
                self.pitch.get_pulse()
            } else {
                self.noise()
            };
        }

        let (pulse, noise) = if voiced {
            (self.pitch.get_pulse(), self.random.binary())
        } else {
            (0.0, self.noise())
        };
        match &mut self.mixed {
            Some(mixed) => mixed.filter(pulse, noise),
            None => pulse + noise,
        }
    }

    pub fn end(&mut self, pitch: f64) {
        self.pitch.end(pitch);
    }

    fn noise(&mut self) -> f64 {
        match self.noise {
            NoiseKind::Gaussian => self.random.nrandom(),
            NoiseKind::Binary => self.random.binary(),
        }
    }
}

/// Pitch period in samples, 0 while unvoiced.
#[derive(Debug, Clone)]
struct Pitch {
    current: f64,
    counter: f64,
    increment: f64,
}

impl Pitch {
    fn new() -> Self {
        Self {
            current: 0.0,
            counter: 0.0,
            increment: 0.0,
        }
    }

    fn start(&mut self, pitch: f64, frame_length: usize) {
        if self.current != 0.0 && pitch != 0.0 {
            self.increment = (pitch - self.current) / frame_length as f64;
        } else {
            // a voicing change renders the whole frame as noise; the new
            // period is installed by `end`
            self.increment = 0.0;
            self.current = 0.0;
            self.counter = pitch;
        }
    }

    fn is_voiced(&self) -> bool {
        self.current != 0.0
    }

    fn get_pulse(&mut self) -> f64 {
        self.counter += 1.0;
        let ret = if self.counter >= self.current {
            self.counter -= self.current;
            self.current.sqrt()
        } else {
            0.0
        };
        self.current += self.increment;
        ret
    }

    fn end(&mut self, pitch: f64) {
        self.current = pitch;
    }
}

/// Pulse and noise paths, each through its own shaping filter.
#[derive(Debug, Clone)]
struct MixedExcitation {
    bands: Vec<Box<[f64]>>,
    pulse_filter: Box<[f64]>,
    noise_filter: Box<[f64]>,
    pulse_history: Box<[f64]>,
    noise_history: Box<[f64]>,
}

impl MixedExcitation {
    fn new(filters: &ShapingFilters) -> Self {
        Self {
            bands: filters.bands.clone(),
            pulse_filter: boxed_slice![0.0; filters.order],
            noise_filter: boxed_slice![0.0; filters.order],
            pulse_history: boxed_slice![0.0; filters.order],
            noise_history: boxed_slice![0.0; filters.order],
        }
    }

    /// Blend the band filters by voicing strength.
    fn shape(&mut self, strengths: &[f64]) {
        self.pulse_filter.fill(0.0);
        self.noise_filter.fill(0.0);
        for (band, strength) in self.bands.iter().zip(strengths) {
            for (i, h) in band.iter().enumerate() {
                self.pulse_filter[i] += strength * h;
                self.noise_filter[i] += (1.0 - strength) * h;
            }
        }
    }

    fn filter(&mut self, pulse: f64, noise: f64) -> f64 {
        Self::fir(&self.pulse_filter, &mut self.pulse_history, pulse)
            + Self::fir(&self.noise_filter, &mut self.noise_history, noise)
    }

    fn fir(taps: &[f64], history: &mut [f64], x: f64) -> f64 {
        if history.is_empty() {
            return 0.0;
        }
        history.rotate_right(1);
        history[0] = x;
        taps.iter().zip(history.iter()).map(|(h, x)| h * x).sum()
    }
}

#[derive(Debug, Clone)]
struct Random {
    cached: Option<f64>,
    next: u64,
}

impl Random {
    fn new(seed: u64) -> Self {
        Self { cached: None, next: seed }
    }

    /// Standard normal deviate by the polar Box–Muller method.
    fn nrandom(&mut self) -> f64 {
        if let Some(value) = self.cached.take() {
            return value;
        }
        let (r1, r2, s) = loop {
            let r1 = 2.0 * self.rnd() - 1.0;
            let r2 = 2.0 * self.rnd() - 1.0;
            let s = r1 * r1 + r2 * r2;
            if !(s > 1.0 || s == 0.0) {
                break (r1, r2, s);
            }
        };
        let s = (-2.0 * s.ln() / s).sqrt();
        self.cached = Some(r2 * s);
        r1 * s
    }

    fn binary(&mut self) -> f64 {
        if self.rnd() > 0.5 { 1.0 } else { -1.0 }
    }

    fn rnd(&mut self) -> f64 {
        self.next = self.next.wrapping_mul(1103515245).wrapping_add(12345);
        let r = (self.next / 65536) % 32768;
        r as f64 / 32767.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Excitation, NoiseKind, Pitch, Random, ShapingFilters};

    #[test]
    fn pulse_train() {
        let mut pitch = Pitch::new();
        pitch.start(4.0, 12);
        pitch.end(4.0);
        pitch.start(4.0, 12);
        let pulses: Vec<f64> = (0..12).map(|_| pitch.get_pulse()).collect();
        // the phase restarts at one period, so the first gap is one short
        assert_eq!(
            pulses,
            [2.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]
        );
        let onsets: Vec<usize> = (0..pulses.len()).filter(|&i| pulses[i] != 0.0).collect();
        assert!(onsets[1..].windows(2).all(|pair| pair[1] - pair[0] == 4));
    }

    #[test]
    fn voicing_onset_frame_is_noise() {
        let mut excitation = Excitation::new(NoiseKind::Binary, 1, None);
        excitation.start(0.0, 8, None);
        for _ in 0..8 {
            excitation.get();
        }
        excitation.end(0.0);

        excitation.start(4.0, 8, None);
        for _ in 0..8 {
            assert_eq!(excitation.get().abs(), 1.0);
        }
        excitation.end(4.0);

        excitation.start(4.0, 8, None);
        let out: Vec<f64> = (0..8).map(|_| excitation.get()).collect();
        assert_eq!(out, [2.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn pitch_interpolates_between_voiced_frames() {
        let mut pitch = Pitch::new();
        pitch.start(100.0, 10);
        pitch.end(100.0);
        pitch.start(110.0, 10);
        for _ in 0..10 {
            pitch.get_pulse();
        }
        approx::assert_abs_diff_eq!(pitch.current, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn random_is_reproducible() {
        let mut a = Random::new(1);
        let mut b = Random::new(1);
        for _ in 0..100 {
            assert_eq!(a.nrandom(), b.nrandom());
        }
        let mut c = Random::new(7);
        let first: Vec<f64> = (0..4).map(|_| a.nrandom()).collect();
        let other: Vec<f64> = (0..4).map(|_| c.nrandom()).collect();
        assert_ne!(first, other);
    }

    #[test]
    fn gaussian_moments() {
        let mut random = Random::new(1);
        let samples: Vec<f64> = (0..20000).map(|_| random.nrandom()).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let vari = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / samples.len() as f64;
        approx::assert_abs_diff_eq!(mean, 0.0, epsilon = 0.05);
        approx::assert_abs_diff_eq!(vari, 1.0, epsilon = 0.05);
    }

    #[test]
    fn binary_noise() {
        let mut excitation = Excitation::new(NoiseKind::Binary, 1, None);
        excitation.start(0.0, 8, None);
        for _ in 0..8 {
            assert_eq!(excitation.get().abs(), 1.0);
        }
    }

    #[test]
    fn shaping_filter_taps() {
        assert!(ShapingFilters::new(3, vec![vec![1.0, 0.0]]).is_err());
    }

    #[test]
    fn fully_voiced_band_passes_pulse() {
        // a single unit-impulse band: pulse path only when strength is 1
        let filters = ShapingFilters::new(2, vec![vec![1.0, 0.0]]).unwrap();
        let mut excitation = Excitation::new(NoiseKind::Gaussian, 1, Some(&filters));
        assert!(excitation.is_mixed());
        // onset frame: noise only, and the noise filter is empty
        excitation.start(4.0, 8, Some(&[1.0]));
        assert!((0..8).all(|_| excitation.get() == 0.0));
        excitation.end(4.0);

        excitation.start(4.0, 8, Some(&[1.0]));
        let out: Vec<f64> = (0..8).map(|_| excitation.get()).collect();
        assert_eq!(out, [2.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn unvoiced_mixed_is_shaped_noise() {
        let filters = ShapingFilters::new(1, vec![vec![0.5]]).unwrap();
        let mut excitation = Excitation::new(NoiseKind::Gaussian, 1, Some(&filters));
        excitation.start(0.0, 8, Some(&[0.0]));
        for _ in 0..8 {
            assert_eq!(excitation.get().abs(), 0.5);
        }
    }
}
