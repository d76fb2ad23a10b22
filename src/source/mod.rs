//! Transfer list sources

pub mod airdc;

use crate::errors::FetchError;
use crate::types::TransferSnapshot;
use async_trait::async_trait;

pub use airdc::AirDcClient;

/// Snapshot provider for the poll driver
#[async_trait]
pub trait TransferSource: Send + Sync {
    /// Fetch the complete current transfer list
    async fn fetch(&self) -> Result<Vec<TransferSnapshot>, FetchError>;
}
