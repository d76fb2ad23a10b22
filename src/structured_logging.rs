//! Structured logging and poll-cycle context

use std::time::Instant;
use uuid::Uuid;

/// Structured logger for transfer events, tagged with the cycle id
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context_id: String,
}

impl StructuredLogger {
    pub fn new(context_id: String) -> Self {
        Self { context_id }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn log_ignored(&self, name: &str, reason: &str) {
        tracing::debug!(
            context_id = %self.context_id,
            name = %name,
            reason = %reason,
            "Ignoring transfer"
        );
    }

    pub fn log_finished_at_startup(&self, name: &str) {
        tracing::debug!(
            context_id = %self.context_id,
            name = %name,
            "Ignoring transfer already finished during initial scan"
        );
    }

    pub fn log_in_progress_at_startup(&self, name: &str) {
        tracing::info!(
            context_id = %self.context_id,
            name = %name,
            "Transfer in progress detected during initial scan"
        );
    }

    pub fn log_initial_scan_complete(&self, tracked: usize) {
        tracing::info!(
            context_id = %self.context_id,
            tracked = %tracked,
            "Initial scan completed"
        );
    }

    pub fn log_upload_detected(&self, key: &str, name: &str) {
        tracing::info!(
            context_id = %self.context_id,
            key = %key,
            name = %name,
            "New upload detected"
        );
    }

    pub fn log_transfer_departed(&self, key: &str, last_status: Option<&str>) {
        tracing::info!(
            context_id = %self.context_id,
            key = %key,
            last_status = ?last_status,
            "Transfer completed or cancelled"
        );
    }

    pub fn log_cleanup(&self, before: usize, after: usize) {
        tracing::debug!(
            context_id = %self.context_id,
            before = %before,
            after = %after,
            "Pruned notified names"
        );
    }

    pub fn log_notification_sent(&self, name: &str, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            name = %name,
            latency_ms = %latency_ms,
            "Notification sent"
        );
    }

    pub fn log_notification_failed(&self, name: &str, error: &str) {
        tracing::error!(
            context_id = %self.context_id,
            name = %name,
            error = %error,
            "Notification failed, will retry next cycle"
        );
    }
}

/// Per-cycle context: unique id, logger and the instant the cycle started
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub cycle_id: String,

    /// Reference instant for cleanup timing
    pub now: Instant,

    pub logger: StructuredLogger,
}

impl CycleContext {
    /// Create a context for a cycle starting now
    pub fn new() -> Self {
        Self::at(Instant::now())
    }

    /// Create a context pinned to the given instant
    pub fn at(now: Instant) -> Self {
        let cycle_id = Uuid::new_v4().to_string();
        Self {
            logger: StructuredLogger::new(cycle_id.clone()),
            cycle_id,
            now,
        }
    }
}

impl Default for CycleContext {
    fn default() -> Self {
        Self::new()
    }
}
