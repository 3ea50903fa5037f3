//! Command intent extraction from recognized text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::text;

/// Discrete robot command extracted from an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Idle,
    Stop,
    Walk,
    Back,
    TurnLeft,
    TurnRight,
}

impl Default for Intent {
    fn default() -> Self {
        Self::Idle
    }
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Stop => "stop",
            Self::Walk => "walk",
            Self::Back => "back",
            Self::TurnLeft => "turn_left",
            Self::TurnRight => "turn_right",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "stop" => Ok(Self::Stop),
            "walk" => Ok(Self::Walk),
            "back" => Ok(Self::Back),
            "turn_left" => Ok(Self::TurnLeft),
            "turn_right" => Ok(Self::TurnRight),
            _ => Err(format!("Unknown intent: {}", s)),
        }
    }
}

/// Keyword rules in priority order. The first rule with a match wins.
const RULES: &[(Intent, &[&str])] = &[
    (Intent::Stop, &["stop", "halt", "freeze", "wait", "pause"]),
    (Intent::TurnLeft, &["left", "turn left"]),
    (Intent::TurnRight, &["right", "turn right"]),
    (Intent::Back, &["back", "reverse", "backward", "go back"]),
    (Intent::Walk, &["forward", "walk", "go", "ahead", "move", "start"]),
];

/// Classify recognized text into an [`Intent`]. Never fails; unmatched text is `Idle`.
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();
    let words = text::words(&lower);

    RULES
        .iter()
        .find(|(_, keywords)| text::contains_any(&words, keywords))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Idle)
}
