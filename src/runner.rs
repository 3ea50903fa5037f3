//! Event loop merging the audio monitor and the recognizer into one session.
//!
//! Both producers send [`SessionEvent`]s into a single channel; the runner owns
//! the [`Session`] and applies events one at a time. A monitor runs exactly
//! while the session is listening.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::audio::SharedSource;
use crate::monitor::Monitor;
use crate::session::{Commit, Session, SessionEvent};

const CHANNEL_CAPACITY: usize = 64;

pub struct SessionRunner {
    session: Session,
    source: Option<SharedSource>,
    interval: Duration,
    tx: mpsc::Sender<SessionEvent>,
    rx: mpsc::Receiver<SessionEvent>,
    monitor: Option<Monitor>,
}

impl SessionRunner {
    /// `source` of `None` runs without audio monitoring (text path only).
    pub fn new(session: Session, source: Option<SharedSource>, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            session,
            source,
            interval,
            tx,
            rx,
            monitor: None,
        }
    }

    /// Sender for event producers (recognizer, UI controls)
    pub fn sender(&self) -> mpsc::Sender<SessionEvent> {
        self.tx.clone()
    }

    /// Process events until [`SessionEvent::Shutdown`]; returns the final session.
    pub async fn run<F>(mut self, mut on_commit: F) -> Session
    where
        F: FnMut(&Commit, &Session),
    {
        info!("Session runner started");

        while let Some(event) = self.rx.recv().await {
            if event == SessionEvent::Shutdown {
                self.session.handle(event);
                break;
            }

            let commit = self.session.handle(event);
            self.sync_monitor();

            if let Some(commit) = commit {
                on_commit(&commit, &self.session);
            }
        }

        self.stop_monitor();
        info!("Session runner stopped");
        self.session
    }

    fn sync_monitor(&mut self) {
        match (self.session.is_listening(), self.monitor.is_some()) {
            (true, false) => {
                if let Some(source) = &self.source {
                    if let Ok(mut guard) = source.lock() {
                        guard.reset();
                    }
                    self.monitor = Some(Monitor::spawn(
                        source.clone(),
                        self.session.generation(),
                        self.interval,
                        self.tx.clone(),
                    ));
                }
            }
            (false, true) => self.stop_monitor(),
            _ => {}
        }
    }

    fn stop_monitor(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
            debug!("Monitor cancelled");
        }
    }
}
