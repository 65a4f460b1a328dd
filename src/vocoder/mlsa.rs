use serde::{Deserialize, Serialize};

use super::coefficients::Coefficients;

const PADE: [f64; 21] = [
    1.00000000000f64,
    1.00000000000f64,
    0.00000000000f64,
    1.00000000000f64,
    0.00000000000f64,
    0.00000000000f64,
    1.00000000000f64,
    0.00000000000f64,
    0.00000000000f64,
    0.00000000000f64,
    1.00000000000f64,
    0.49992730000f64,
    0.10670050000f64,
    0.01170221000f64,
    0.00056562790f64,
    1.00000000000f64,
    0.49993910000f64,
    0.11070980000f64,
    0.01369984000f64,
    0.00095648530f64,
    0.00003041721f64,
];

/// Order of the Padé approximant realizing the exponential transfer function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PadeOrder {
    Four,
    #[default]
    Five,
}

/// MLSA filter of either Padé order.
#[derive(Debug, Clone)]
pub enum MlsaFilter {
    Four(MelLogSpectrumApproximation<5>),
    Five(MelLogSpectrumApproximation<6>),
}

impl MlsaFilter {
    pub fn new(order: PadeOrder, alpha: f64, c_len: usize) -> Self {
        match order {
            PadeOrder::Four => Self::Four(MelLogSpectrumApproximation::new(alpha, c_len)),
            PadeOrder::Five => Self::Five(MelLogSpectrumApproximation::new(alpha, c_len)),
        }
    }

    #[inline]
    pub fn df(&mut self, x: f64, coefficients: &Coefficients) -> f64 {
        match self {
            Self::Four(filter) => filter.df(x, coefficients),
            Self::Five(filter) => filter.df(x, coefficients),
        }
    }
}

/// N == pd + 1
#[derive(Debug, Clone)]
pub struct MelLogSpectrumApproximation<const N: usize> {
    alpha: f64,
    aa: f64,
    ppade: [f64; N],
    d11: [f64; N],
    d12: [f64; N],
    d21: [Box<[f64]>; N],
    d22: [f64; N],
}

impl<const N: usize> MelLogSpectrumApproximation<N> {
    pub fn new(alpha: f64, c_len: usize) -> Self {
        let pade_start = (N - 1) * N / 2;
        Self {
            alpha,
            aa: 1.0 - alpha * alpha,
            ppade: std::array::from_fn(|i| PADE[pade_start + i]),
            d11: [0.0; N],
            d12: [0.0; N],
            d21: std::array::from_fn(|_| boxed_slice![0.0; c_len + 1]),
            d22: [0.0; N],
        }
    }

    #[inline]
    pub fn df(&mut self, x: f64, coefficients: &Coefficients) -> f64 {
        let x = self.df1(x, coefficients);
        self.df2(x, coefficients)
    }

    /// First-order section on b[1].
    fn df1(&mut self, mut x: f64, coefficients: &Coefficients) -> f64 {
        let mut out = 0.0;
        for i in (1..N).rev() {
            self.d11[i] = self.aa * self.d12[i - 1] + self.alpha * self.d11[i];
            self.d12[i] = self.d11[i] * coefficients[1];
            let v = self.d12[i] * self.ppade[i];
            x += if i & 1 != 0 { v } else { -v };
            out += v;
        }
        self.d12[0] = x;
        x + out
    }

    /// FIR section on b[2..].
    fn df2(&mut self, mut x: f64, coefficients: &Coefficients) -> f64 {
        let mut out = 0.0;
        for i in (1..N).rev() {
            self.d22[i] = Self::fir(
                &mut self.d21[i - 1],
                self.d22[i - 1],
                self.alpha,
                self.aa,
                coefficients,
            );
            let v = self.d22[i] * self.ppade[i];
            x += if i & 1 != 0 { v } else { -v };
            out += v;
        }
        self.d22[0] = x;
        x + out
    }

    fn fir(d: &mut [f64], x: f64, alpha: f64, aa: f64, coefficients: &Coefficients) -> f64 {
        let len = coefficients.len();
        d[0] = x;
        d[1] = aa * d[0] + alpha * d[1];
        let mut y = 0.0;
        let mut prev = d[1];
        for i in 2..len {
            let di = d[i] + alpha * (d[i + 1] - prev);
            y += di * coefficients[i];
            d[i] = std::mem::replace(&mut prev, di);
        }
        d[len] = prev;

        y
    }
}
