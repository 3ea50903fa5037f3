//! Voice-driven robot simulator.
//!
//! An utterance (text) plus voice-energy features become an intent and an
//! emotion, which drive one bounded 2D motion step of a simulated robot that
//! is rendered as SVG.
//!
//! Pipeline, leaf to root:
//! - [`audio`]: frequency-bin analysis and the per-tick feature reduction
//! - [`emotion`], [`intent`]: total classifiers over features and text
//! - [`motion`]: the kinematic integrator clamped to an arena
//! - [`render`]: pose to SVG scene
//! - [`session`], [`monitor`], [`runner`]: event-driven glue for live use
//! - [`server`]: demo HTTP surface

pub mod audio;
pub mod config;
pub mod emotion;
pub mod intent;
pub mod monitor;
pub mod motion;
pub mod recognizer;
pub mod render;
pub mod runner;
pub mod server;
pub mod session;
pub mod text;

pub use audio::AudioFeatures;
pub use config::Config;
pub use emotion::{classify_audio, classify_text, fuse, Emotion, EmotionThresholds};
pub use intent::{classify_intent, Intent};
pub use motion::{Arena, MotionCommand, RobotPose, Simulation};
pub use render::{project, render_svg, Scene};
pub use runner::SessionRunner;
pub use session::{Commit, Session, SessionError, SessionEvent, SessionState};
