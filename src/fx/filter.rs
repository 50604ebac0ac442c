use std::f64::consts::{PI, SQRT_2};

use thiserror::Error;

/// Errors raised while designing a filter
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("normalized cutoff {0} must lie strictly between 0 and 1")]
    CutoffOutOfRange(f64),
    #[error("band edges inverted: low {low} must be below high {high}")]
    InvertedBand { low: f64, high: f64 },
}

/// Cutoff in Hz as a fraction of Nyquist
pub fn normalized(cutoff_hz: f64, sample_rate: f32) -> f64 {
    cutoff_hz / (sample_rate as f64 / 2.0)
}

fn check(wn: f64) -> Result<f64, FilterError> {
    if wn.is_finite() && wn > 0.0 && wn < 1.0 {
        Ok(wn)
    } else {
        Err(FilterError::CutoffOutOfRange(wn))
    }
}

/// Pre-warped analog frequency for the bilinear transform
fn warp(wn: f64) -> f64 {
    (PI * wn / 2.0).tan()
}

/// Butterworth section (up to second order) designed by bilinear transform.
///
/// Runs over a whole buffer from a zero initial state, so the same input
/// always gives the same output.
#[derive(Clone, Debug, PartialEq)]
pub struct Biquad {
    b: [f64; 3],
    // a[0] is normalized to 1
    a: [f64; 3],
}

impl Biquad {
    /// First-order low-pass
    pub fn lowpass1(wn: f64) -> Result<Self, FilterError> {
        let w = warp(check(wn)?);
        let norm = 1.0 + w;
        Ok(Self {
            b: [w / norm, w / norm, 0.0],
            a: [1.0, (w - 1.0) / norm, 0.0],
        })
    }

    /// First-order high-pass
    pub fn highpass1(wn: f64) -> Result<Self, FilterError> {
        let w = warp(check(wn)?);
        let norm = 1.0 + w;
        Ok(Self {
            b: [1.0 / norm, -1.0 / norm, 0.0],
            a: [1.0, (w - 1.0) / norm, 0.0],
        })
    }

    /// Second-order high-pass
    pub fn highpass2(wn: f64) -> Result<Self, FilterError> {
        let w = warp(check(wn)?);
        let w2 = w * w;
        let a0 = 1.0 + SQRT_2 * w + w2;
        Ok(Self {
            b: [1.0 / a0, -2.0 / a0, 1.0 / a0],
            a: [1.0, 2.0 * (w2 - 1.0) / a0, (1.0 - SQRT_2 * w + w2) / a0],
        })
    }

    /// Band-pass from a first-order prototype (one pole pair)
    pub fn bandpass1(low: f64, high: f64) -> Result<Self, FilterError> {
        let (low, high) = (check(low)?, check(high)?);
        if low >= high {
            return Err(FilterError::InvertedBand { low, high });
        }
        let (wl, wh) = (warp(low), warp(high));
        let bw = wh - wl;
        let w0sq = wl * wh;
        let a0 = 1.0 + bw + w0sq;
        Ok(Self {
            b: [bw / a0, 0.0, -bw / a0],
            a: [1.0, 2.0 * (w0sq - 1.0) / a0, (1.0 - bw + w0sq) / a0],
        })
    }

    pub fn process(&self, input: &[f32]) -> Vec<f32> {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let (mut z1, mut z2) = (0.0f64, 0.0f64);
        input
            .iter()
            .map(|&x| {
                let x = x as f64;
                let y = b0 * x + z1;
                z1 = b1 * x - a1 * y + z2;
                z2 = b2 * x - a2 * y;
                y as f32
            })
            .collect()
    }
}
