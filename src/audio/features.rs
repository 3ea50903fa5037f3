use serde::{Deserialize, Serialize};

/// Upper bound of a frequency-bin magnitude
pub const MAX_MAGNITUDE: u8 = u8::MAX;

/// Energy summary of one sampling tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatures {
    /// Mean bin magnitude
    pub average_level: f32,
    /// Largest bin magnitude
    pub peak_level: f32,
}

impl AudioFeatures {
    /// Reduce frequency-bin magnitudes to {average, peak}.
    ///
    /// An empty buffer yields zero-valued features.
    pub fn from_bins(bins: &[u8]) -> Self {
        if bins.is_empty() {
            return Self::default();
        }

        let sum: u64 = bins.iter().map(|&b| b as u64).sum();
        let peak = bins.iter().copied().max().unwrap_or(0);

        Self {
            average_level: sum as f32 / bins.len() as f32,
            peak_level: peak as f32,
        }
    }
}
