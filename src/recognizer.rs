//! Speech recognition collaborators.
//!
//! No real speech-to-text lives here. [`PhraseTranscriber`] picks a random
//! demo phrase for uploaded clips, and [`forward_lines`] treats each typed
//! line as an already-recognized utterance.
//!
//! Line reads block, so [`spawn_line_reader`] runs them on a dedicated thread.
//! The runtime never waits on that thread: shutting the session down while a
//! read is pending leaves the thread parked until the process exits.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::session::{SessionError, SessionEvent};

/// Phrases returned by the simulated transcriber
pub const DEMO_PHRASES: &[&str] = &[
    "walk forward",
    "turn left",
    "turn right",
    "stop",
    "go back",
    "move forward",
    "turn around",
];

/// Turns an uploaded clip into text
pub trait Transcriber: Send {
    fn transcribe(&mut self, clip: &[u8]) -> String;
}

/// Uniformly random pick from [`DEMO_PHRASES`], ignoring the audio
pub struct PhraseTranscriber {
    rng: StdRng,
}

impl PhraseTranscriber {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for tests and demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for PhraseTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcriber for PhraseTranscriber {
    fn transcribe(&mut self, clip: &[u8]) -> String {
        let phrase = DEMO_PHRASES.choose(&mut self.rng).copied().unwrap_or("stop");
        debug!("Simulated transcription of {} bytes: \"{}\"", clip.len(), phrase);
        phrase.to_string()
    }
}

/// Events for one input line.
///
/// `:start`, `:stop` and `:quit` are controls; an empty line is a failed
/// recognition; anything else is an utterance. Utterances and failures
/// re-arm listening for the next one.
pub fn events_for_line(line: &str) -> Vec<SessionEvent> {
    match line.trim() {
        ":start" => vec![SessionEvent::Start],
        ":stop" => vec![SessionEvent::Stop],
        ":quit" => vec![SessionEvent::Stop, SessionEvent::Shutdown],
        "" => vec![
            SessionEvent::RecognitionFailed("no speech recognized".to_string()),
            SessionEvent::Start,
        ],
        text => vec![SessionEvent::Utterance(text.to_string()), SessionEvent::Start],
    }
}

/// Read utterances line by line and forward them to the session.
///
/// Starts listening immediately; end of input stops and shuts the session down.
/// Blocks the calling thread; must not run on a runtime worker.
pub fn forward_lines<R: BufRead>(reader: R, tx: &mpsc::Sender<SessionEvent>) -> Result<(), SessionError> {
    send(tx, SessionEvent::Start)?;

    for line in reader.lines() {
        let line = line.map_err(|e| SessionError::Input(e.to_string()))?;
        for event in events_for_line(&line) {
            let shutdown = event == SessionEvent::Shutdown;
            send(tx, event)?;
            if shutdown {
                return Ok(());
            }
        }
    }

    info!("Input closed");
    send(tx, SessionEvent::Stop)?;
    send(tx, SessionEvent::Shutdown)
}

/// Run [`forward_lines`] on its own thread.
///
/// The handle is never joined on shutdown; a read still pending on stdin
/// cannot be interrupted.
pub fn spawn_line_reader<R>(
    reader: R,
    tx: mpsc::Sender<SessionEvent>,
) -> Result<thread::JoinHandle<()>, SessionError>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("line-reader".to_string())
        .spawn(move || match forward_lines(reader, &tx) {
            Ok(()) => {}
            Err(SessionError::ChannelClosed) => debug!("Session gone, line reader exiting"),
            Err(e) => error!("Input error: {}", e),
        })
        .map_err(|e| SessionError::Input(format!("Failed to spawn line reader: {}", e)))
}

fn send(tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) -> Result<(), SessionError> {
    tx.blocking_send(event).map_err(|_| SessionError::ChannelClosed)
}
