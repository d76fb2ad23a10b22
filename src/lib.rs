//! Upload Monitor - AirDC++ upload notifications over Telegram
//!
//! Polls the AirDC++ transfer list, decides which uploads are new and sends
//! one Telegram message per new upload.
//!
//! ## Components
//!
//! - **Source** (`source`): reads the transfer list from the web API
//! - **Reconciler** (`reconciler`): identity tracking and notification dedup
//! - **Notifier** (`notifier`): message formatting and delivery
//! - **Monitor** (`monitor`): fixed-interval poll loop with flat backoff

pub mod config;
pub mod endpoints;
pub mod errors;
pub mod metrics;
pub mod monitor;
pub mod notifier;
pub mod reconciler;
pub mod source;
pub mod structured_logging;
pub mod test_utils;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use errors::{ConfigError, DeliveryError, FetchError, MonitorError};
pub use monitor::{CycleReport, Monitor, PollState};
pub use notifier::{Notifier, TelegramNotifier};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use source::{AirDcClient, TransferSource};
pub use types::{TransferKey, TransferSnapshot};

#[cfg(test)]
mod tests {
    mod monitor_cycle_tests;
    mod reconciler_property_tests;
}
