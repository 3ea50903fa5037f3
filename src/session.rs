//! Interaction session: live emotion estimate, committed commands, robot pose.
//!
//! All state changes go through [`Session::handle`] (or the direct methods it
//! dispatches to), one event at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::AudioFeatures;
use crate::emotion::{classify_audio, classify_text, fuse, Emotion, EmotionThresholds};
use crate::intent::{classify_intent, Intent};
use crate::motion::{Arena, MotionCommand, RobotPose, Simulation};
use crate::render::{project, Scene};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Not monitoring; feature ticks are ignored
    Idle,
    /// Monitoring audio and waiting for an utterance
    Listening,
}

/// Session error types
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum SessionError {
    #[error("Microphone unavailable: {0}")]
    CaptureUnavailable(String),
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),
    #[error("Input error: {0}")]
    Input(String),
    #[error("Session event channel closed")]
    ChannelClosed,
}

/// Input to the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Begin monitoring; a no-op while already listening
    Start,
    /// Cancel monitoring
    Stop,
    /// One sampling tick of the audio monitor started for listening `generation`
    FeatureTick {
        generation: u64,
        features: AudioFeatures,
    },
    /// Recognized utterance text
    Utterance(String),
    /// Recognition produced no usable text
    RecognitionFailed(String),
    /// End the event loop
    Shutdown,
}

/// Result of one recognized utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub transcript: String,
    pub intent: Intent,
    pub emotion: Emotion,
    pub audio_emotion: Emotion,
    pub text_emotion: Emotion,
    pub command: MotionCommand,
    pub pose: RobotPose,
    pub at: DateTime<Utc>,
}

/// Snapshot for status displays
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session_id: String,
    pub state: SessionState,
    pub emotion: Emotion,
    pub last_intent: Option<Intent>,
    pub pose: RobotPose,
    pub commit_count: u64,
    pub error_message: Option<String>,
}

pub struct Session {
    id: Uuid,
    state: SessionState,
    /// Bumped on every start; ticks from earlier monitors are stale
    generation: u64,
    simulation: Simulation,
    thresholds: EmotionThresholds,
    /// Latest audio-path estimate of the current listening session
    live_emotion: Emotion,
    /// Current emotion, from whichever path updated last
    emotion: Emotion,
    last_intent: Option<Intent>,
    commit_count: u64,
    error: Option<SessionError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arena::default(), EmotionThresholds::default())
    }
}

impl Session {
    pub fn new(arena: Arena, thresholds: EmotionThresholds) -> Self {
        Self::with_simulation(Simulation::new(arena), thresholds)
    }

    pub fn with_simulation(simulation: Simulation, thresholds: EmotionThresholds) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            generation: 0,
            simulation,
            thresholds,
            live_emotion: Emotion::Neutral,
            emotion: Emotion::Neutral,
            last_intent: None,
            commit_count: 0,
            error: None,
        }
    }

    /// Dispatch one event. Returns the commit when the event produced one.
    pub fn handle(&mut self, event: SessionEvent) -> Option<Commit> {
        match event {
            SessionEvent::Start => {
                self.start();
                None
            }
            SessionEvent::Stop => {
                self.stop();
                None
            }
            SessionEvent::FeatureTick { generation, features } => {
                if generation == self.generation {
                    self.observe(&features);
                } else {
                    debug!("Dropping tick from listening generation {}", generation);
                }
                None
            }
            SessionEvent::Utterance(text) => Some(self.commit(&text)),
            SessionEvent::RecognitionFailed(reason) => {
                self.fail_recognition(reason);
                None
            }
            SessionEvent::Shutdown => {
                self.stop();
                None
            }
        }
    }

    /// Begin listening. Returns false if already listening.
    pub fn start(&mut self) -> bool {
        if self.state == SessionState::Listening {
            debug!("Start ignored: already listening");
            return false;
        }
        self.state = SessionState::Listening;
        self.generation += 1;
        self.live_emotion = Emotion::Neutral;
        self.error = None;
        info!("Listening started (session {})", self.id);
        true
    }

    /// Stop listening. Returns false if already idle.
    pub fn stop(&mut self) -> bool {
        if self.state == SessionState::Idle {
            return false;
        }
        self.state = SessionState::Idle;
        info!("Listening stopped");
        true
    }

    /// Feed one audio sample. Ignored unless listening.
    pub fn observe(&mut self, features: &AudioFeatures) -> Option<Emotion> {
        if self.state != SessionState::Listening {
            return None;
        }
        let emotion = classify_audio(features, &self.thresholds);
        if emotion != self.live_emotion {
            debug!(
                "Live emotion {} -> {} (avg {:.1}, peak {:.1})",
                self.live_emotion, emotion, features.average_level, features.peak_level
            );
        }
        self.live_emotion = emotion;
        self.emotion = emotion;
        Some(emotion)
    }

    /// Commit an utterance against the live audio estimate.
    pub fn commit(&mut self, transcript: &str) -> Commit {
        let audio_emotion = self.live_emotion;
        self.commit_with_audio(transcript, audio_emotion)
    }

    /// Commit an utterance against an externally measured audio emotion.
    ///
    /// Applies exactly one motion step and ends any listening session.
    pub fn commit_with_audio(&mut self, transcript: &str, audio_emotion: Emotion) -> Commit {
        let intent = classify_intent(transcript);
        let text_emotion = classify_text(transcript);
        let emotion = fuse(audio_emotion, text_emotion);
        let command = self.simulation.step(intent, emotion);
        let pose = self.simulation.pose();

        self.state = SessionState::Idle;
        self.emotion = emotion;
        self.last_intent = Some(intent);
        self.commit_count += 1;
        self.error = None;

        info!(
            "Committed \"{}\": intent={} emotion={} (audio {}, text {}) pose=({:.2}, {:.2}, {:.2} rad)",
            transcript, intent, emotion, audio_emotion, text_emotion, pose.x, pose.y, pose.heading
        );

        Commit {
            transcript: transcript.to_string(),
            intent,
            emotion,
            audio_emotion,
            text_emotion,
            command,
            pose,
            at: Utc::now(),
        }
    }

    /// Record a recognition failure. Nothing is committed; the pose is unchanged.
    pub fn fail_recognition(&mut self, reason: String) {
        warn!("Recognition failed: {}", reason);
        self.state = SessionState::Idle;
        self.error = Some(SessionError::RecognitionFailed(reason));
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current listening generation, tagged onto monitor ticks
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_listening(&self) -> bool {
        self.state == SessionState::Listening
    }

    pub fn pose(&self) -> RobotPose {
        self.simulation.pose()
    }

    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn live_emotion(&self) -> Emotion {
        self.live_emotion
    }

    pub fn last_intent(&self) -> Option<Intent> {
        self.last_intent
    }

    pub fn thresholds(&self) -> &EmotionThresholds {
        &self.thresholds
    }

    pub fn scene(&self) -> Scene {
        project(&self.simulation.pose(), self.emotion)
    }

    /// Current frame as SVG
    pub fn frame(&self) -> String {
        self.scene().to_svg()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id.to_string(),
            state: self.state,
            emotion: self.emotion,
            last_intent: self.last_intent,
            pose: self.simulation.pose(),
            commit_count: self.commit_count,
            error_message: self.error.as_ref().map(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn loud() -> AudioFeatures {
        AudioFeatures {
            average_level: 60.0,
            peak_level: 200.0,
        }
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut session = Session::default();
        assert!(session.start());
        assert!(!session.start());
        assert!(session.is_listening());
    }

    #[test]
    fn test_ticks_ignored_when_idle() {
        let mut session = Session::default();
        assert_eq!(session.observe(&loud()), None);
        assert_eq!(session.live_emotion(), Emotion::Neutral);

        session.start();
        assert_eq!(session.observe(&loud()), Some(Emotion::Angry));
        session.stop();
        let silent = AudioFeatures::default();
        assert_eq!(session.observe(&silent), None);
        assert_eq!(session.live_emotion(), Emotion::Angry);
    }

    #[test]
    fn test_turn_left_scenario() {
        let mut session = Session::default();
        session.start();
        let commit = session.commit("turn left");
        assert_eq!(commit.intent, Intent::TurnLeft);
        assert_eq!(commit.text_emotion, Emotion::Neutral);
        assert_eq!(commit.emotion, Emotion::Neutral);
        assert!((commit.pose.heading - 0.12).abs() < EPS);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_shouted_walk_scenario() {
        let mut session = Session::default();
        let commit = session.commit("GO FORWARD NOW!!");
        assert_eq!(commit.intent, Intent::Walk);
        assert_eq!(commit.emotion, Emotion::Angry);
        assert!((commit.pose.x - 0.15).abs() < EPS);
    }

    #[test]
    fn test_audio_emotion_wins_fusion() {
        let mut session = Session::default();
        session.start();
        session.observe(&loud());
        let commit = session.commit("I love walking, walk");
        assert_eq!(commit.text_emotion, Emotion::Happy);
        assert_eq!(commit.audio_emotion, Emotion::Angry);
        assert_eq!(commit.emotion, Emotion::Angry);
    }

    #[test]
    fn test_start_resets_live_emotion() {
        let mut session = Session::default();
        session.start();
        session.observe(&loud());
        session.stop();
        session.start();
        assert_eq!(session.live_emotion(), Emotion::Neutral);
    }

    #[test]
    fn test_tick_from_previous_listening_is_dropped() {
        let mut session = Session::default();
        session.handle(SessionEvent::Start);
        let old = session.generation();
        session.handle(SessionEvent::Utterance("walk".into()));
        session.handle(SessionEvent::Start);
        assert_ne!(session.generation(), old);

        // Sent by the old monitor before it was cancelled, delivered after re-arm
        session.handle(SessionEvent::FeatureTick {
            generation: old,
            features: loud(),
        });
        assert_eq!(session.live_emotion(), Emotion::Neutral);

        let current = session.generation();
        session.handle(SessionEvent::FeatureTick {
            generation: current,
            features: loud(),
        });
        assert_eq!(session.live_emotion(), Emotion::Angry);
    }

    #[test]
    fn test_recognition_failure_commits_nothing() {
        let mut session = Session::default();
        session.handle(SessionEvent::Start);
        let before = session.pose();
        let commit = session.handle(SessionEvent::RecognitionFailed("no speech".into()));
        assert!(commit.is_none());
        assert_eq!(session.pose(), before);
        assert_eq!(session.last_intent(), None);
        let status = session.status();
        assert_eq!(status.commit_count, 0);
        assert!(status.error_message.unwrap().contains("no speech"));
    }

    #[test]
    fn test_handle_utterance_commits_once() {
        let mut session = Session::default();
        let commit = session.handle(SessionEvent::Utterance("walk".into()));
        assert!(commit.is_some());
        assert_eq!(session.status().commit_count, 1);
        assert!((session.pose().x - 0.1).abs() < EPS);
    }

    #[test]
    fn test_frame_uses_current_emotion() {
        let mut session = Session::default();
        session.commit("I am so sad, stop");
        assert_eq!(session.emotion(), Emotion::Sad);
        assert!(session.frame().contains("#7b8fa1"));
    }
}
