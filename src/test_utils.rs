//! Test Utilities Module
//!
//! Scripted transfer sources and recording notifiers for driving the monitor
//! without network access.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::errors::{DeliveryError, FetchError};
use crate::notifier::Notifier;
use crate::source::TransferSource;
use crate::types::TransferSnapshot;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock TransferSource replaying queued responses
///
/// Once the queue is drained the last successful snapshot is repeated.
#[derive(Clone, Default)]
pub struct MockTransferSource {
    responses: Arc<Mutex<VecDeque<Result<Vec<TransferSnapshot>, FetchError>>>>,
    last: Arc<Mutex<Vec<TransferSnapshot>>>,
    fetch_count: Arc<Mutex<usize>>,
}

impl MockTransferSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful snapshot
    pub async fn push_snapshot(&self, snapshot: Vec<TransferSnapshot>) {
        self.responses.lock().await.push_back(Ok(snapshot));
    }

    /// Queue a failed fetch
    pub async fn push_error(&self, error: FetchError) {
        self.responses.lock().await.push_back(Err(error));
    }

    /// Queue a connection-level failure
    pub async fn push_unreachable(&self) {
        self.push_error(FetchError::Transport {
            endpoint: "mock://transfers".to_string(),
            message: "connection refused".to_string(),
        })
        .await;
    }

    pub async fn get_fetch_count(&self) -> usize {
        *self.fetch_count.lock().await
    }
}

#[async_trait]
impl TransferSource for MockTransferSource {
    async fn fetch(&self) -> Result<Vec<TransferSnapshot>, FetchError> {
        *self.fetch_count.lock().await += 1;

        match self.responses.lock().await.pop_front() {
            Some(Ok(snapshot)) => {
                *self.last.lock().await = snapshot.clone();
                Ok(snapshot)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().await.clone()),
        }
    }
}

/// Mock Notifier recording every delivered name
#[derive(Clone)]
pub struct MockNotifier {
    should_succeed: Arc<Mutex<bool>>,
    failing_names: Arc<Mutex<HashSet<String>>>,
    sent: Arc<Mutex<Vec<String>>>,
    attempts: Arc<Mutex<usize>>,
}

impl MockNotifier {
    /// Create a notifier that succeeds by default
    pub fn new() -> Self {
        Self {
            should_succeed: Arc::new(Mutex::new(true)),
            failing_names: Arc::new(Mutex::new(HashSet::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a notifier that always fails
    pub fn new_failing() -> Self {
        let mut notifier = Self::new();
        notifier.should_succeed = Arc::new(Mutex::new(false));
        notifier
    }

    pub async fn set_should_succeed(&self, should_succeed: bool) {
        *self.should_succeed.lock().await = should_succeed;
    }

    /// Fail deliveries for one specific name
    pub async fn fail_for(&self, name: &str) {
        self.failing_names.lock().await.insert(name.to_string());
    }

    pub async fn sent(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    pub async fn get_attempts(&self) -> usize {
        *self.attempts.lock().await
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, transfer: &TransferSnapshot) -> Result<(), DeliveryError> {
        *self.attempts.lock().await += 1;
        let name = transfer.display_name().to_string();

        if !*self.should_succeed.lock().await || self.failing_names.lock().await.contains(&name) {
            return Err(DeliveryError::Rejected {
                status: 500,
                body: "mock failure".to_string(),
            });
        }

        self.sent.lock().await.push(name);
        Ok(())
    }
}
