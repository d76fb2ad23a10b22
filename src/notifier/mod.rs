//! Outbound notifications for newly-detected uploads

pub mod message;
pub mod telegram;

use crate::errors::DeliveryError;
use crate::types::TransferSnapshot;
use async_trait::async_trait;

pub use message::UploadMessage;
pub use telegram::TelegramNotifier;

/// Delivery channel for upload notifications
///
/// Implementations report every failure as a `DeliveryError`; the poll
/// driver only records a transfer as notified on `Ok(())`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, transfer: &TransferSnapshot) -> Result<(), DeliveryError>;
}
