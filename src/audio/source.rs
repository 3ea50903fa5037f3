//! Producers of frequency-bin frames, sampled once per monitoring tick.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use super::clip::{read_wav_file, ClipError};
use super::spectrum::SpectrumAnalyser;

/// Something that can report the current frequency-bin magnitudes.
///
/// An empty vector means "no samples available".
pub trait SpectrumSource: Send {
    fn frequency_data(&mut self) -> Vec<u8>;

    /// Forget buffered audio and analyser history before a new listening session.
    fn reset(&mut self) {}
}

/// Source shared between successive monitoring sessions
pub type SharedSource = Arc<Mutex<dyn SpectrumSource>>;

/// Wrap a source for use by the monitor.
pub fn shared<S: SpectrumSource + 'static>(source: S) -> SharedSource {
    Arc::new(Mutex::new(source))
}

/// Always reports the same frame
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    frame: Vec<u8>,
}

impl FixedSource {
    pub fn new(frame: Vec<u8>) -> Self {
        Self { frame }
    }
}

impl SpectrumSource for FixedSource {
    fn frequency_data(&mut self) -> Vec<u8> {
        self.frame.clone()
    }
}

/// Plays a recording at real time, one tick's worth of samples per call
pub struct WavSource {
    samples: Vec<f32>,
    position: usize,
    samples_per_tick: usize,
    analyser: SpectrumAnalyser,
}

impl WavSource {
    pub fn open(path: &Path, analyser: SpectrumAnalyser, tick: Duration) -> Result<Self, ClipError> {
        let (samples, sample_rate) = read_wav_file(path)?;
        info!(
            "Loaded {:?}: {} samples @ {} Hz ({:.1}s)",
            path,
            samples.len(),
            sample_rate,
            samples.len() as f32 / sample_rate as f32
        );
        Ok(Self::from_samples(samples, sample_rate, analyser, tick))
    }

    pub fn from_samples(
        samples: Vec<f32>,
        sample_rate: u32,
        analyser: SpectrumAnalyser,
        tick: Duration,
    ) -> Self {
        let samples_per_tick =
            ((sample_rate as u128 * tick.as_millis()) / 1000).max(1) as usize;
        Self {
            samples,
            position: 0,
            samples_per_tick,
            analyser,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl SpectrumSource for WavSource {
    fn frequency_data(&mut self) -> Vec<u8> {
        if self.is_exhausted() {
            return Vec::new();
        }

        let end = (self.position + self.samples_per_tick).min(self.samples.len());
        let start = end.saturating_sub(self.analyser.fft_size());
        self.position = end;

        if self.is_exhausted() {
            debug!("Recording exhausted");
        }

        self.analyser.analyse(&self.samples[start..end])
    }

    // Playback position is kept; only smoothing restarts
    fn reset(&mut self) {
        self.analyser.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::spectrum::AnalyserConfig;

    #[test]
    fn test_fixed_source_repeats() {
        let mut source = FixedSource::new(vec![1, 2, 3]);
        assert_eq!(source.frequency_data(), vec![1, 2, 3]);
        assert_eq!(source.frequency_data(), vec![1, 2, 3]);
    }

    #[test]
    fn test_wav_source_advances_and_exhausts() {
        let analyser = SpectrumAnalyser::new(AnalyserConfig::default());
        // 0.5s at 1 kHz, 200ms ticks -> 200 samples per tick -> 3 frames
        let mut source =
            WavSource::from_samples(vec![0.0; 500], 1000, analyser, Duration::from_millis(200));

        assert_eq!(source.frequency_data().len(), 128);
        assert_eq!(source.frequency_data().len(), 128);
        assert_eq!(source.frequency_data().len(), 128);
        assert!(source.is_exhausted());
        assert!(source.frequency_data().is_empty());
    }

    #[test]
    fn test_shared_source_locks() {
        let source = shared(FixedSource::new(vec![9]));
        let frame = source.lock().unwrap().frequency_data();
        assert_eq!(frame, vec![9]);
    }
}
