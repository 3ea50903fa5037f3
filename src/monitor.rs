//! Periodic audio feature sampling.
//!
//! While a listening session is active the monitor samples its spectrum
//! source once per interval and sends the reduced [`AudioFeatures`] to the
//! session channel. Stopping aborts the task; no tick is sent afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::audio::{AudioFeatures, SharedSource};
use crate::session::SessionEvent;

/// Default sampling interval
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(200);

pub struct Monitor {
    stop_flag: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Monitor {
    /// Spawn the sampling task on the current tokio runtime.
    ///
    /// Every tick is tagged with `generation`, the listening session it belongs to.
    pub fn spawn(
        source: SharedSource,
        generation: u64,
        interval: Duration,
        tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = stop_flag.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }

                let Some(bins) = sample(&source) else {
                    warn!("Spectrum source lock poisoned, stopping monitor");
                    break;
                };
                let features = AudioFeatures::from_bins(&bins);
                trace!(
                    "Tick: {} bins, avg {:.1}, peak {:.1}",
                    bins.len(),
                    features.average_level,
                    features.peak_level
                );

                let tick = SessionEvent::FeatureTick { generation, features };
                if tx.send(tick).await.is_err() {
                    debug!("Session channel closed, stopping monitor");
                    break;
                }
            }
        });

        debug!("Monitor {} started ({:?} interval)", generation, interval);
        Self { stop_flag, handle }
    }

    /// Cancel sampling. Idempotent.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sample(source: &SharedSource) -> Option<Vec<u8>> {
    source.lock().ok().map(|mut s| s.frequency_data())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{shared, FixedSource};

    #[tokio::test(start_paused = true)]
    async fn test_ticks_carry_features() {
        let (tx, mut rx) = mpsc::channel(8);
        let monitor = Monitor::spawn(
            shared(FixedSource::new(vec![100, 200])),
            3,
            DEFAULT_SAMPLE_INTERVAL,
            tx,
        );

        match rx.recv().await {
            Some(SessionEvent::FeatureTick { generation, features }) => {
                assert_eq!(generation, 3);
                assert_eq!(features.average_level, 150.0);
                assert_eq!(features.peak_level, 200.0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_source_reports_zero() {
        let (tx, mut rx) = mpsc::channel(8);
        let _monitor = Monitor::spawn(shared(FixedSource::default()), 1, DEFAULT_SAMPLE_INTERVAL, tx);

        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::FeatureTick {
                generation: 1,
                features: AudioFeatures::default()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let (tx, mut rx) = mpsc::channel(8);
        let monitor = Monitor::spawn(shared(FixedSource::new(vec![1])), 1, DEFAULT_SAMPLE_INTERVAL, tx);

        assert!(rx.recv().await.is_some());
        monitor.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;

        // The aborted task dropped its sender; nothing else was queued
        assert!(rx.recv().await.is_none());
        assert!(monitor.is_finished());
    }
}
