//! Loudness summary of a whole uploaded clip.

use hound::{SampleFormat, WavReader};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Sample rate assumed for raw (headerless) clips
pub const ASSUMED_SAMPLE_RATE: u32 = 16000;

#[derive(Debug, Error)]
pub enum ClipError {
    #[error("Failed to read WAV: {0}")]
    Wav(#[from] hound::Error),

    #[error("WAV has no samples")]
    Empty,
}

/// RMS/peak summary of a clip
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSummary {
    pub rms: f32,
    pub max_amplitude: f32,
    /// Seconds
    pub duration: f32,
}

impl ClipSummary {
    /// Summarise samples in -1..1. Non-finite samples are skipped; no samples gives zeros.
    pub fn from_samples(samples: &[f32], sample_rate: u32) -> Self {
        let mut count = 0usize;
        let mut sum_sq = 0.0f64;
        let mut max_amplitude = 0.0f32;

        for &s in samples.iter().filter(|s| s.is_finite()) {
            count += 1;
            sum_sq += (s as f64) * (s as f64);
            max_amplitude = max_amplitude.max(s.abs());
        }

        if count == 0 {
            return Self::default();
        }

        Self {
            rms: (sum_sq / count as f64).sqrt() as f32,
            max_amplitude,
            duration: count as f32 / sample_rate.max(1) as f32,
        }
    }
}

/// Decode a WAV stream to mono f32 (first channel) and its sample rate.
pub fn decode_wav<R: Read>(reader: WavReader<R>) -> Result<(Vec<f32>, u32), hound::Error> {
    let spec = reader.spec();
    let channels = (spec.channels as usize).max(1);

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1) as u32)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    // Downmix: take first channel only
    let mono = interleaved.chunks(channels).map(|c| c[0]).collect();
    Ok((mono, spec.sample_rate))
}

/// Open a WAV file as mono f32.
pub fn read_wav_file(path: &Path) -> Result<(Vec<f32>, u32), ClipError> {
    let reader = WavReader::open(path)?;
    let (samples, sample_rate) = decode_wav(reader)?;
    if samples.is_empty() {
        return Err(ClipError::Empty);
    }
    Ok((samples, sample_rate))
}

/// Interpret uploaded bytes as samples.
///
/// WAV data is decoded; anything else is read as little-endian f32 at
/// [`ASSUMED_SAMPLE_RATE`], ignoring a trailing partial sample.
pub fn decode_clip(bytes: &[u8]) -> (Vec<f32>, u32) {
    if let Ok(reader) = WavReader::new(Cursor::new(bytes)) {
        match decode_wav(reader) {
            Ok(decoded) => return decoded,
            Err(e) => debug!("WAV header parsed but body unreadable, using raw f32: {}", e),
        }
    }

    let samples = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    (samples, ASSUMED_SAMPLE_RATE)
}

/// Summarise an uploaded clip.
pub fn analyze_clip(bytes: &[u8]) -> ClipSummary {
    let (samples, sample_rate) = decode_clip(bytes);
    let summary = ClipSummary::from_samples(&samples, sample_rate);
    debug!(
        "Clip: {} samples @ {} Hz, rms {:.3}, peak {:.3}",
        samples.len(),
        sample_rate,
        summary.rms,
        summary.max_amplitude
    );
    summary
}
