//! Poll driver: fetch, reconcile, notify, sleep
//!
//! Two steady states. `Polling` runs a cycle and sleeps the poll interval;
//! a cycle-level failure switches to `Backoff`, which sleeps the longer
//! backoff interval once and then resumes polling. There is no retry cap.

use crate::config::PollingConfig;
use crate::errors::MonitorError;
use crate::metrics::{metrics, Timer};
use crate::notifier::Notifier;
use crate::reconciler::Reconciler;
use crate::source::TransferSource;
use crate::structured_logging::CycleContext;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Backoff,
}

/// Counters for one completed cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries returned by the source, before filtering
    pub fetched: usize,
    /// Source answered, but with an error status or an unreadable body
    pub fetch_failed: bool,
    pub detected: usize,
    pub notified: usize,
    pub failed: usize,
    pub departed: usize,
}

pub struct Monitor<S, N> {
    source: S,
    notifier: N,
    reconciler: Reconciler,
    polling: PollingConfig,
    state: PollState,
}

impl<S, N> Monitor<S, N>
where
    S: TransferSource,
    N: Notifier,
{
    pub fn new(source: S, notifier: N, polling: PollingConfig) -> Self {
        let reconciler = Reconciler::new(polling.cleanup_interval());
        Self::with_reconciler(source, notifier, polling, reconciler)
    }

    pub fn with_reconciler(
        source: S,
        notifier: N,
        polling: PollingConfig,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            source,
            notifier,
            reconciler,
            polling,
            state: PollState::Polling,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Run the loop until `shutdown` resolves
    ///
    /// Shutdown is observed while sleeping between cycles; a cycle in flight
    /// always completes.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Starting AirDC++ upload monitoring");

        loop {
            let pause = self.step().await;
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = &mut shutdown => {
                    info!("🛑 Received shutdown signal");
                    break;
                }
            }
        }

        info!("👋 Upload monitor stopped");
    }

    /// Advance the state machine by one cycle and return the pause that follows
    pub async fn step(&mut self) -> Duration {
        if self.state == PollState::Backoff {
            self.state = PollState::Polling;
        }

        match self.run_cycle().await {
            Ok(report) => {
                debug!(?report, "Cycle complete");
                self.polling.poll_interval()
            }
            Err(e) => {
                error!("Error in main loop: {}", e);
                debug!(error = ?e, "Error details");
                self.state = PollState::Backoff;
                self.polling.backoff_interval()
            }
        }
    }

    /// Fetch one snapshot, reconcile it and notify every new upload
    pub async fn run_cycle(&mut self) -> Result<CycleReport, MonitorError> {
        let ctx = CycleContext::new();
        let m = metrics();
        m.polls_total.inc();

        let mut report = CycleReport::default();
        let mut unavailable = None;

        let timer = Timer::new();
        let snapshot = match self.source.fetch().await {
            Ok(list) => list,
            Err(e) => {
                m.fetch_failures_total.inc();
                error!(context_id = %ctx.cycle_id, "Error fetching uploads: {}", e);
                if e.is_transport() {
                    unavailable = Some(e);
                } else {
                    report.fetch_failed = true;
                }
                Vec::new()
            }
        };
        timer.observe_duration(&m.fetch_latency);
        report.fetched = snapshot.len();

        let outcome = self.reconciler.classify(&snapshot, &ctx);
        report.detected = outcome.newly_detected.len();
        report.departed = outcome.departed.len();
        m.uploads_detected_total.inc_by(report.detected as u64);
        m.transfers_departed_total.inc_by(report.departed as u64);

        for transfer in &outcome.newly_detected {
            let name = transfer.display_name();

            // Another entry with the same name was delivered earlier this cycle
            if self.reconciler.is_notified(name) {
                continue;
            }

            let timer = Timer::new();
            match self.notifier.notify(transfer).await {
                Ok(()) => {
                    timer.observe_duration(&m.notify_latency);
                    self.reconciler.mark_notified(name);
                    ctx.logger.log_notification_sent(name, timer.elapsed_ms());
                    m.notifications_sent_total.inc();
                    report.notified += 1;
                }
                Err(e) => {
                    ctx.logger.log_notification_failed(name, &e.to_string());
                    m.notifications_failed_total.inc();
                    report.failed += 1;
                }
            }
        }

        m.active_uploads.set(self.reconciler.active_len() as i64);
        m.notified_names.set(self.reconciler.notified_len() as i64);

        match unavailable {
            Some(e) => Err(MonitorError::SourceUnavailable(e)),
            None => Ok(report),
        }
    }
}
