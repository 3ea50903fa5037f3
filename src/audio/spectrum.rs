//! Frequency-bin analyser.
//!
//! Turns the most recent window of time-domain samples into byte magnitudes,
//! one per bin, in the range 0-255:
//!
//! 1. Blackman window over `fft_size` samples
//! 2. Forward FFT, magnitude normalised by `fft_size`
//! 3. Exponential smoothing against the previous frame
//! 4. Decibels mapped linearly from `[min_db, max_db]` onto `[0, 255]`

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analyser tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyserConfig {
    /// FFT window length; yields `fft_size / 2` bins
    pub fft_size: usize,
    /// Smoothing time constant (0.0 = none, close to 1.0 = heavy)
    pub smoothing: f32,
    pub min_db: f32,
    pub max_db: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyser {
    pub fn new(config: AnalyserConfig) -> Self {
        let n = config.fft_size.max(2);
        let config = AnalyserConfig {
            fft_size: n,
            smoothing: config.smoothing.clamp(0.0, 1.0),
            ..config
        };

        let fft = FftPlanner::<f32>::new().plan_fft_forward(n);
        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();

        Self {
            config,
            fft,
            window,
            smoothed: vec![0.0; n / 2],
            scratch: vec![Complex::new(0.0, 0.0); n],
        }
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Analyse the last `fft_size` samples of `frame`.
    ///
    /// Shorter frames are zero-padded at the front. Non-finite samples count as silence.
    pub fn analyse(&mut self, frame: &[f32]) -> Vec<u8> {
        let n = self.config.fft_size;
        let tail = &frame[frame.len().saturating_sub(n)..];
        let pad = n - tail.len();

        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let tau = self.config.smoothing;
        let min_db = self.config.min_db;
        let range = (self.config.max_db - min_db).max(f32::EPSILON);

        self.smoothed
            .iter_mut()
            .zip(self.scratch.iter())
            .map(|(prev, bin)| {
                let magnitude = bin.norm() / n as f32;
                *prev = tau * *prev + (1.0 - tau) * magnitude;
                if *prev <= 0.0 {
                    return 0;
                }
                let db = 20.0 * prev.log10();
                let scaled = 255.0 * (db - min_db) / range;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// Forget smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
    }
}
