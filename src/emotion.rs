//! Emotion estimation from voice energy and from recognized text.
//!
//! Three classifiers, all total:
//! - [`classify_audio`]: live frequency-bin features (average/peak level, 0-255 scale)
//! - [`classify_text`]: keyword and punctuation heuristics on an utterance
//! - [`classify_clip`]: RMS/peak summary of an uploaded clip (-1..1 sample scale)
//!
//! [`fuse`] combines the audio and text estimates into the committed emotion.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::audio::{AudioFeatures, ClipSummary};
use crate::text;

/// Discrete affect category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Angry,
    Sad,
}

impl Default for Emotion {
    fn default() -> Self {
        Self::Neutral
    }
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Angry => "angry",
            Self::Sad => "sad",
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "happy" => Ok(Self::Happy),
            "angry" => Ok(Self::Angry),
            "sad" => Ok(Self::Sad),
            _ => Err(format!("Unknown emotion: {}", s)),
        }
    }
}

/// Thresholds for the live audio path (frequency-bin scale, 0-255)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionThresholds {
    pub peak_high: f32,
    pub peak_mid: f32,
    pub avg_mid: f32,
    pub avg_low: f32,
    pub peak_low: f32,
}

impl Default for EmotionThresholds {
    fn default() -> Self {
        Self {
            peak_high: 150.0,
            peak_mid: 100.0,
            avg_mid: 30.0,
            avg_low: 10.0,
            peak_low: 30.0,
        }
    }
}

/// Classify live audio features.
pub fn classify_audio(features: &AudioFeatures, thresholds: &EmotionThresholds) -> Emotion {
    let avg = features.average_level;
    let peak = features.peak_level;

    if peak > thresholds.peak_high && avg > thresholds.avg_mid {
        Emotion::Angry
    } else if peak > thresholds.peak_mid && avg > thresholds.avg_mid {
        Emotion::Happy
    } else if avg < thresholds.avg_low && peak < thresholds.peak_low {
        Emotion::Sad
    } else {
        Emotion::Neutral
    }
}

const HAPPY_WORDS: &[&str] = &[
    "happy", "great", "awesome", "yay", "love", "wonderful", "excited", "fantastic",
    "amazing", "glad", "fun",
];

const ANGRY_WORDS: &[&str] = &[
    "angry", "mad", "furious", "hate", "annoyed", "annoying", "stupid", "damn",
];

const SAD_WORDS: &[&str] = &[
    "sad", "tired", "sorry", "unhappy", "depressed", "lonely", "miserable", "gloomy",
];

/// Minimum run of capitals that reads as shouting
const SHOUT_RUN: usize = 4;

/// Classify an utterance. Priority: happy, angry, sad, otherwise neutral.
pub fn classify_text(utterance: &str) -> Emotion {
    let lower = utterance.to_lowercase();
    let words = text::words(&lower);

    if text::contains_any(&words, HAPPY_WORDS) {
        return Emotion::Happy;
    }

    let shouting = utterance.contains("!!") || text::has_capital_run(utterance, SHOUT_RUN);
    if shouting || text::contains_any(&words, ANGRY_WORDS) {
        return Emotion::Angry;
    }

    if text::contains_any(&words, SAD_WORDS) {
        return Emotion::Sad;
    }

    Emotion::Neutral
}

/// Committed emotion: audio wins whenever it is not neutral.
pub fn fuse(audio: Emotion, text: Emotion) -> Emotion {
    if audio.is_neutral() {
        text
    } else {
        audio
    }
}

/// Thresholds for uploaded clips (sample scale, -1..1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipThresholds {
    pub rms_high: f32,
    pub peak_high: f32,
    pub rms_mid: f32,
    pub peak_mid: f32,
    pub rms_low: f32,
    pub peak_low: f32,
}

impl Default for ClipThresholds {
    fn default() -> Self {
        Self {
            rms_high: 0.3,
            peak_high: 0.7,
            rms_mid: 0.2,
            peak_mid: 0.5,
            rms_low: 0.1,
            peak_low: 0.3,
        }
    }
}

/// Classify an uploaded clip from its RMS/peak summary.
pub fn classify_clip(summary: &ClipSummary, thresholds: &ClipThresholds) -> Emotion {
    let rms = summary.rms;
    let peak = summary.max_amplitude;

    if rms > thresholds.rms_high && peak > thresholds.peak_high {
        Emotion::Angry
    } else if rms > thresholds.rms_mid && peak > thresholds.peak_mid {
        Emotion::Happy
    } else if rms < thresholds.rms_low && peak < thresholds.peak_low {
        Emotion::Sad
    } else {
        Emotion::Neutral
    }
}
