//! Fixed-interval digest scheduler.
//!
//! - Runs `publish_news` every `DIGEST_INTERVAL_SECS`
//! - A tick that fires while the previous run is still going is skipped, never queued
//! - Optionally runs once right after start

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    digest::{DigestPublisher, PublishReport},
};

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub run_on_start: bool,
}

impl From<&Config> for SchedulerConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            interval: cfg.digest_interval,
            run_on_start: cfg.digest_on_startup,
        }
    }
}

#[derive(Clone)]
pub struct DigestScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    publisher: DigestPublisher,
    cfg: SchedulerConfig,
    // Held for the duration of one publish run.
    run_lock: Mutex<()>,
    state: Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl DigestScheduler {
    pub fn new(publisher: DigestPublisher, cfg: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                publisher,
                cfg,
                run_lock: Mutex::new(()),
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Start the tick loop. Calling `start` on a running scheduler restarts it.
    pub async fn start(&self) {
        self.stop().await;

        let interval = self.inner.cfg.interval.max(Duration::from_secs(1));
        let first = if self.inner.cfg.run_on_start {
            Instant::now()
        } else {
            Instant::now() + interval
        };

        let cancel = CancellationToken::new();
        let tok = cancel.clone();
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            let mut tick = interval_at(first, interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = tok.cancelled() => break,
                    _ = tick.tick() => {
                        // Run on its own task so a slow digest never delays the next tick.
                        let scheduler = scheduler.clone();
                        tokio::spawn(async move {
                            scheduler.run_once().await;
                        });
                    }
                }
            }
            tracing::debug!("digest scheduler loop exited");
        });

        let mut st = self.inner.state.lock().await;
        st.cancel = Some(cancel);
        st.handle = Some(handle);
        tracing::info!(
            interval_secs = interval.as_secs(),
            run_on_start = self.inner.cfg.run_on_start,
            "digest scheduler started"
        );
    }

    /// Stop ticking. A run already in progress finishes on its own.
    pub async fn stop(&self) {
        let mut st = self.inner.state.lock().await;
        if let Some(tok) = st.cancel.take() {
            tok.cancel();
        }
        if let Some(handle) = st.handle.take() {
            let _ = handle.await;
            tracing::info!("digest scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.handle.is_some()
    }

    /// Publish once unless a run is already in progress (`None` when skipped or failed).
    pub async fn run_once(&self) -> Option<PublishReport> {
        let Ok(_guard) = self.inner.run_lock.try_lock() else {
            tracing::warn!("previous digest run still in progress, skipping tick");
            return None;
        };
        match self.inner.publisher.publish_news().await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!("digest run failed: {e}");
                None
            }
        }
    }
}
