//! AirDC++ web API client

use super::TransferSource;
use crate::config::SourceConfig;
use crate::errors::FetchError;
use crate::types::{parse_transfer_list, TransferSnapshot};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const TRANSFERS_PATH: &str = "/api/v1/transfers";

/// Reads the transfer list with HTTP basic auth
pub struct AirDcClient {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
}

impl AirDcClient {
    pub fn new(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        Self::with_base_url(
            &config.base_url(),
            &config.username,
            &config.password,
            config.timeout(),
        )
    }

    /// Build a client against an explicit base URL, e.g. `http://127.0.0.1:5600`
    pub fn with_base_url(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), TRANSFERS_PATH),
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

#[async_trait]
impl TransferSource for AirDcClient {
    async fn fetch(&self) -> Result<Vec<TransferSnapshot>, FetchError> {
        let payload: Value = self
            .client
            .get(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&self.endpoint, e))?
            .json()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.endpoint, e))?;

        debug!(payload = %payload, "Transfer list received");
        Ok(parse_transfer_list(payload))
    }
}
