//! Transfer reconciler - identity tracking and notification dedup
//!
//! Each poll cycle hands the full transfer list to [`Reconciler::classify`],
//! which decides which uploads are new, refreshes the table of active
//! transfers, drops transfers the source no longer reports and periodically
//! shrinks the set of names already notified.
//!
//! ## Identity
//!
//! Active transfers are tracked by [`TransferKey`] (`{id}_{name}`), but the
//! novelty test looks at the display name only. Two peers fetching the same
//! file therefore produce a single notification. This coarsening is kept on
//! purpose.
//!
//! ## Initial scan
//!
//! The first cycle after startup absorbs uploads that are already `finished`
//! without notifying. Uploads still in progress at startup are reported like
//! any other new upload.

use crate::structured_logging::CycleContext;
use crate::types::{TransferKey, TransferSnapshot, STATUS_FINISHED};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Transfer that vanished from the source while not yet `finished`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartedTransfer {
    pub key: TransferKey,
    pub last_status: Option<String>,
}

/// Result of reconciling one snapshot
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Uploads whose name has not been notified yet, in snapshot order
    pub newly_detected: Vec<TransferSnapshot>,

    /// Keys of every upload that passed the filters
    pub current_keys: HashSet<TransferKey>,

    /// Transfers pruned this cycle whose last status was not `finished`
    pub departed: Vec<DepartedTransfer>,

    /// Set when the notified-names set was pruned: (before, after)
    pub cleanup: Option<(usize, usize)>,
}

/// Owner of all dedup state; one instance lives for the whole process
#[derive(Debug)]
pub struct Reconciler {
    /// Key -> last observed status id
    active_uploads: HashMap<TransferKey, Option<String>>,

    /// Names already notified successfully
    notified_names: HashSet<String>,

    initial_scan: bool,

    last_cleanup: Instant,

    cleanup_interval: Duration,
}

impl Reconciler {
    /// Create a reconciler whose cleanup clock starts now
    pub fn new(cleanup_interval: Duration) -> Self {
        Self::with_start(cleanup_interval, Instant::now())
    }

    /// Create a reconciler whose cleanup clock starts at `started`
    pub fn with_start(cleanup_interval: Duration, started: Instant) -> Self {
        Self {
            active_uploads: HashMap::new(),
            notified_names: HashSet::new(),
            initial_scan: true,
            last_cleanup: started,
            cleanup_interval,
        }
    }

    /// Reconcile one snapshot of the transfer list
    ///
    /// Newly-detected uploads are returned but not recorded as notified;
    /// callers commit them with [`Reconciler::mark_notified`] once delivery
    /// succeeds.
    pub fn classify(&mut self, snapshot: &[TransferSnapshot], ctx: &CycleContext) -> ReconcileOutcome {
        let log = &ctx.logger;

        if snapshot.is_empty() {
            tracing::debug!(context_id = %ctx.cycle_id, "No active transfers");
            self.finish_initial_scan(ctx);
            return ReconcileOutcome::default();
        }

        let initial_scan = self.initial_scan;
        let mut outcome = ReconcileOutcome::default();
        let mut current_names: HashSet<&str> = HashSet::new();

        for transfer in snapshot {
            let name = transfer.display_name();

            if !transfer.is_upload() {
                log.log_ignored(name, "not an upload");
                continue;
            }

            let Some(key) = transfer.key() else {
                log.log_ignored(name, "missing id or name");
                continue;
            };

            if transfer.is_file_list() {
                log.log_ignored(name, "file list");
                continue;
            }

            outcome.current_keys.insert(key.clone());
            current_names.insert(name);
            let status = transfer.status_id().map(str::to_string);

            if initial_scan {
                if transfer.is_finished() {
                    log.log_finished_at_startup(name);
                    self.active_uploads.insert(key, status);
                    self.notified_names.insert(name.to_string());
                    continue;
                }
                log.log_in_progress_at_startup(name);
            }

            let is_new = !self.notified_names.contains(name);
            self.active_uploads.insert(key.clone(), status);

            if is_new {
                log.log_upload_detected(key.as_str(), name);
                outcome.newly_detected.push(transfer.clone());
            }
        }

        self.finish_initial_scan(ctx);

        outcome.departed = self.prune_departed(&outcome.current_keys, ctx);

        if ctx.now.saturating_duration_since(self.last_cleanup) > self.cleanup_interval {
            let before = self.notified_names.len();
            self.notified_names.retain(|name| current_names.contains(name.as_str()));
            self.last_cleanup = ctx.now;
            log.log_cleanup(before, self.notified_names.len());
            outcome.cleanup = Some((before, self.notified_names.len()));
        }

        outcome
    }

    /// Record a successful notification for `name`; repeated calls are no-ops
    pub fn mark_notified(&mut self, name: &str) -> bool {
        self.notified_names.insert(name.to_string())
    }

    pub fn is_notified(&self, name: &str) -> bool {
        self.notified_names.contains(name)
    }

    pub fn notified_names(&self) -> impl Iterator<Item = &str> {
        self.notified_names.iter().map(String::as_str)
    }

    pub fn notified_len(&self) -> usize {
        self.notified_names.len()
    }

    pub fn is_tracking(&self, key: &TransferKey) -> bool {
        self.active_uploads.contains_key(key)
    }

    /// Last status recorded for an active key
    pub fn active_status(&self, key: &TransferKey) -> Option<&str> {
        self.active_uploads.get(key)?.as_deref()
    }

    pub fn active_len(&self) -> usize {
        self.active_uploads.len()
    }

    pub fn is_initial_scan(&self) -> bool {
        self.initial_scan
    }

    fn finish_initial_scan(&mut self, ctx: &CycleContext) {
        if self.initial_scan {
            ctx.logger.log_initial_scan_complete(self.active_uploads.len());
            self.initial_scan = false;
        }
    }

    /// Drop keys missing from the snapshot, reporting the unfinished ones
    fn prune_departed(
        &mut self,
        current_keys: &HashSet<TransferKey>,
        ctx: &CycleContext,
    ) -> Vec<DepartedTransfer> {
        let mut gone: Vec<TransferKey> = self
            .active_uploads
            .keys()
            .filter(|key| !current_keys.contains(*key))
            .cloned()
            .collect();
        gone.sort();

        let mut departed = Vec::new();
        for key in gone {
            let last_status = self.active_uploads.remove(&key).flatten();
            if last_status.as_deref() != Some(STATUS_FINISHED) {
                ctx.logger.log_transfer_departed(key.as_str(), last_status.as_deref());
                departed.push(DepartedTransfer { key, last_status });
            }
        }
        departed
    }
}
